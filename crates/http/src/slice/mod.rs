//! Request handler abstraction.
//!
//! A [`Slice`] turns a request head and its body into a [`Response`](crate::response::Response).
//! The call itself never blocks: anything asynchronous happens inside the returned response, which
//! does its work when it is sent to a connection.

use std::sync::Arc;

use crate::deferred::AsyncResponse;
use crate::protocol::{Body, BoxError, RequestHead};
use crate::response::{BoxResponse, Responder, ResponseExt};

pub trait Slice: Send + Sync + 'static {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse;
}

pub type SharedSlice = Arc<dyn Slice>;

impl<S: Slice + ?Sized> Slice for Arc<S> {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        (**self).response(head, body)
    }
}

impl<S: Slice + ?Sized> Slice for Box<S> {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        (**self).response(head, body)
    }
}

/// A slice backed by an async function.
#[derive(Debug)]
pub struct SliceFn<F> {
    f: F,
}

impl<F, Fut, R, E> Slice for SliceFn<F>
where
    F: Fn(RequestHead, Body) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Responder,
    E: Into<BoxError>,
{
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        let future = (self.f)(head, body);
        AsyncResponse::new(async move {
            match future.await {
                Ok(responder) => Ok(responder.into_response().boxed()),
                Err(e) => Err::<BoxResponse, BoxError>(e.into()),
            }
        })
        .boxed()
    }
}

/// Creates a slice from an async function returning a [`Responder`].
///
/// A failed future turns into a `500 Internal Server Error` carrying the error message.
pub fn slice_fn<F, Fut, R, E>(f: F) -> SliceFn<F>
where
    F: Fn(RequestHead, Body) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    SliceFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::collecting;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::BodyExt;

    fn assert_is_slice<T: Slice>(_slice: &T) {
        // no op
    }

    async fn echo(head: RequestHead, body: Body) -> Result<String, BoxError> {
        let bytes = body.collect().await?.to_bytes();
        Ok(format!("{} {}", head.uri().path(), String::from_utf8_lossy(&bytes)))
    }

    #[test]
    fn fn_is_slice() {
        let slice = slice_fn(echo);
        assert_is_slice(&slice);
        assert_is_slice(&Arc::new(slice));
    }

    #[tokio::test]
    async fn fn_slice_responds() {
        let slice: SharedSlice = Arc::new(slice_fn(echo));
        let head = RequestHead::from_line("POST /echo HTTP/1.1", [("Host", "localhost")]).unwrap();

        let (connection, collected) = collecting();
        slice.response(head, Body::from("hello")).send(Box::new(connection)).await.unwrap();

        let response = collected.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body(), Bytes::from("/echo hello"));
    }

    #[tokio::test]
    async fn fn_slice_failure_becomes_500() {
        let slice = slice_fn(|_head: RequestHead, _body: Body| async { Err::<(), _>("storage unavailable") });
        let head = RequestHead::from_line("GET / HTTP/1.1", Vec::<(&str, &str)>::new()).unwrap();

        let (connection, collected) = collecting();
        slice.response(head, Body::empty()).send(Box::new(connection)).await.unwrap();

        let response = collected.await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.into_body(), Bytes::from("storage unavailable"));
    }
}
