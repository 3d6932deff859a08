//! Composable request/response building blocks
//!
//! This crate provides the wire contracts of a slice-based HTTP layer: a request is answered by a
//! [`Slice`](slice::Slice), which returns a [`Response`](response::Response) that is later sent to
//! a single-use [`Connection`](connection::Connection). Everything is transport agnostic: the
//! listener, the HTTP/1.1 codec and TLS are left to whoever owns the sockets.
//!
//! # Features
//!
//! - Single-use responses and connections, enforced by consuming `self`
//! - Lazily pulled streaming bodies
//! - Deferred responses and slices backed by futures
//! - A streaming delimiter tokenizer for bodies such as multipart payloads
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use slice_http::connection::collecting;
//! use slice_http::protocol::{Body, BoxError, RequestHead};
//! use slice_http::slice::{Slice, slice_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hello = slice_fn(|head: RequestHead, _body: Body| async move {
//!     Ok::<_, BoxError>(format!("hello {}", head.uri().path()))
//! });
//!
//! let head = RequestHead::from_line("GET /world HTTP/1.1", [("Host", "localhost")]).unwrap();
//! let (connection, collected) = collecting();
//! hello.response(head, Body::empty()).send(Box::new(connection)).await.unwrap();
//!
//! let response = collected.await.unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(&response.body()[..], b"hello /world");
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request head, response head, body and error types
//! - [`connection`]: the response sink contract
//! - [`response`]: the response producer contract and [`Responder`](response::Responder)
//! - [`slice`]: the request handler contract
//! - [`deferred`]: future-backed responses and slices
//! - [`split`]: the segment tokenizer
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: request line and header parsing errors
//! - [`protocol::BodyError`]: body stream errors
//! - [`protocol::SendError`]: response delivery errors
//! - [`protocol::SplitError`]: tokenizer errors
//!
//! Failures inside deferred computations never escape as errors: they are answered with
//! `500 Internal Server Error` and logged through `tracing`.

pub mod connection;
pub mod deferred;
pub mod protocol;
pub mod response;
pub mod slice;
pub mod split;

mod utils;
pub(crate) use utils::ensure;
