use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use http::Response;
use http_body_util::BodyExt;
use tokio::sync::oneshot;
use tracing::trace;

use crate::connection::Connection;
use crate::protocol::{Body, ResponseHead, SendError};

/// A connection that reads the whole body into memory and hands the complete response to the
/// paired [`Collected`] future.
#[derive(Debug)]
pub struct CollectingConnection {
    sender: oneshot::Sender<Response<Bytes>>,
}

/// Resolves to the response accepted by the paired [`CollectingConnection`].
#[derive(Debug)]
pub struct Collected {
    receiver: oneshot::Receiver<Response<Bytes>>,
}

/// Creates a collecting connection and the future that observes what it received.
pub fn collecting() -> (CollectingConnection, Collected) {
    let (sender, receiver) = oneshot::channel();
    (CollectingConnection { sender }, Collected { receiver })
}

impl Connection for CollectingConnection {
    fn accept(self: Box<Self>, head: ResponseHead, body: Body) -> BoxFuture<'static, Result<(), SendError>> {
        async move {
            let bytes = body.collect().await?.to_bytes();
            trace!(status = %head.status(), size = bytes.len(), "collected response");

            self.sender
                .send(head.map(|()| bytes))
                .map_err(|_response| SendError::closed("collected response receiver dropped"))
        }
        .boxed()
    }
}

impl Future for Collected {
    type Output = Result<Response<Bytes>, SendError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let result = ready!(self.receiver.poll_unpin(cx));
        Poll::Ready(result.map_err(|_recv_error| SendError::closed("connection dropped without response")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn collects_status_headers_and_body() {
        let (connection, collected) = collecting();
        let head = Response::builder().status(StatusCode::CREATED).header("x-backend", "1").body(()).unwrap();

        Box::new(connection).accept(head, Body::from("created")).await.unwrap();

        let response = collected.await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-backend").unwrap(), "1");
        assert_eq!(response.body(), &Bytes::from("created"));
    }

    #[tokio::test]
    async fn dropped_connection_reports_closed() {
        let (connection, collected) = collecting();
        drop(connection);

        assert!(matches!(collected.await, Err(SendError::Closed { .. })));
    }
}
