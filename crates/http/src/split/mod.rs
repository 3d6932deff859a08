//! Delimiter-based streaming tokenizer.
//!
//! Splits an unbounded byte stream into the segments between occurrences of a fixed delimiter,
//! e.g. the parts of a multipart body. [`Split`] is the push engine: it is fed chunks and reports
//! segment content to a [`SegmentReceiver`] as soon as it is known not to belong to a delimiter.
//! [`SplitStream`] puts the engine behind a pull interface: a stream of [`Segment`]s, each of
//! which is itself a lazily pulled stream of bytes.
//!
//! ```
//! use bytes::Bytes;
//! use futures::{StreamExt, TryStreamExt};
//! use slice_http::split::Split;
//!
//! # futures::executor::block_on(async {
//! let upstream = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from("how__are__you"))]);
//! let mut segments = Split::new("__").unwrap().split(upstream);
//!
//! let mut parts = Vec::new();
//! while let Some(segment) = segments.next().await {
//!     let chunks: Vec<Bytes> = segment.unwrap().try_collect().await.unwrap();
//!     parts.push(chunks.concat());
//! }
//! assert_eq!(parts, vec![b"how".to_vec(), b"are".to_vec(), b"you".to_vec()]);
//! # });
//! ```

mod engine;
mod stream;
mod window;

pub use engine::SegmentReceiver;
pub use engine::Split;
pub use stream::Segment;
pub use stream::SplitStream;
