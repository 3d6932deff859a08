//! Streaming message body.
//!
//! [`Body`] is the byte stream that travels with every request and response. It is pulled lazily:
//! nothing is read from the producer until a consumer polls for the next frame, which is how
//! backpressure reaches the original byte source. Bodies are owned values; dropping one releases
//! the producer, and [`Body::drain`] reads one to its end without keeping the data.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, StreamBody};

use crate::protocol::BodyError;

pub struct Body {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Stream(UnsyncBoxBody<Bytes, BodyError>),
}

impl Body {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Kind::Once(Some(bytes)) } }
    }

    /// Wraps a fallible stream of byte chunks.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BodyError> + 'static,
    {
        let stream = stream.map_ok(Frame::data).map_err(Into::<BodyError>::into);
        Self { inner: Kind::Stream(UnsyncBoxBody::new(StreamBody::new(stream))) }
    }

    /// Wraps any `http_body::Body` producing `Bytes`.
    pub fn from_body<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BodyError>,
    {
        Self { inner: Kind::Stream(UnsyncBoxBody::new(body.map_err(Into::<BodyError>::into))) }
    }

    /// Reads the body to its end, discarding the data, and returns the number of drained bytes.
    pub async fn drain(mut self) -> Result<u64, BodyError> {
        let mut size = 0_u64;
        while let Some(frame) = self.frame().await {
            if let Some(bytes) = frame?.data_ref() {
                size += bytes.len() as u64;
            }
        }
        Ok(size)
    }

    /// Reads the frames that are ready right now, at most about `limit` bytes of them, then drops
    /// the body. Never waits for the producer, so a slow or endless body is closed rather than
    /// read to its end. Returns the number of discarded bytes.
    pub fn discard(mut self, limit: u64) -> Result<u64, BodyError> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut size = 0_u64;
        while size < limit {
            match Pin::new(&mut self).poll_frame(&mut cx) {
                Poll::Ready(Some(frame)) => {
                    if let Some(bytes) = frame?.data_ref() {
                        size += bytes.len() as u64;
                    }
                }
                Poll::Ready(None) | Poll::Pending => break,
            }
        }
        Ok(size)
    }

    /// Exposes the data frames of this body as a stream, skipping trailers.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, BodyError>> + Send + 'static {
        futures::stream::unfold(self, |mut body| async move {
            loop {
                match body.frame().await? {
                    Ok(frame) => {
                        if let Ok(bytes) = frame.into_data() {
                            return Some((Ok(bytes), body));
                        }
                    }
                    Err(e) => return Some((Err(e), body)),
                }
            }
        })
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(None) => f.write_str("Body::Empty"),
            Kind::Once(Some(bytes)) => f.debug_tuple("Body::Once").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::once(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().inner {
            Kind::Once(option_bytes) => Poll::Ready(option_bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
            Kind::Stream(box_body) => Pin::new(box_body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Stream(box_body) => box_body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Stream(box_body) => box_body.size_hint(),
        }
    }
}
