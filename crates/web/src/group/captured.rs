use futures::future::BoxFuture;
use http::{HeaderMap, StatusCode};
use slice_http::connection::BoxConnection;
use slice_http::protocol::{Body, ResponseHead, SendError};
use tracing::debug;

/// Bytes of a cancelled body that are still read if the backend already produced them.
const CANCEL_DRAIN_LIMIT: u64 = 64 * 1024;

/// A response a backend produced that has not been forwarded anywhere yet.
///
/// A captured result is owned by the race until it is either replayed to the real connection or
/// cancelled; both consume it, so it can never be both.
#[derive(Debug)]
pub struct Captured {
    head: ResponseHead,
    body: Body,
}

impl Captured {
    pub fn new(head: ResponseHead, body: Body) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    /// Forwards the captured status, headers and body to `connection`.
    pub fn replay(self, connection: BoxConnection) -> BoxFuture<'static, Result<(), SendError>> {
        connection.accept(self.head, self.body)
    }

    /// Discards the captured body. Whatever the backend already produced is drained, up to a
    /// small limit, and the body is then closed, which releases the backend without waiting for
    /// it. Returns the number of drained bytes; a body that fails while being drained only ends
    /// the drain early.
    pub fn cancel(self) -> u64 {
        let status = self.head.status();
        match self.body.discard(CANCEL_DRAIN_LIMIT) {
            Ok(size) => {
                debug!(%status, size, "cancelled captured response");
                size
            }
            Err(e) => {
                debug!(%status, cause = %e, "captured response failed while being cancelled");
                0
            }
        }
    }
}
