//! Broadcast of one request to several backends.
//!
//! A [`GroupSlice`] answers safe requests (`GET`, `HEAD`, `OPTIONS`, `CONNECT`, `TRACE`) by asking
//! every backend and forwarding the response of the first backend, in configuration order, that
//! succeeded. Each backend sends to its own [`SlotConnection`], which captures the response and
//! reports it to the race run by the [`Aggregator`]. Every other method is routed to the primary
//! backend alone.
//!
//! The body of a broadcast request is read into memory once, before any backend is invoked, and
//! every backend gets its own copy of it.
//!
//! Broadcast backends are spawned on the current tokio runtime and all of them run to completion,
//! the losers included; only their output is discarded. There is no timeout: a backend that never
//! answers keeps the race waiting, and the client with it.

mod aggregator;
mod captured;
mod connection;
mod policy;

pub use aggregator::Aggregator;
pub use aggregator::Outcome;
pub use captured::Captured;
pub use connection::SlotConnection;
pub use policy::FnPolicy;
pub use policy::StatusFamilyPolicy;
pub use policy::SuccessPolicy;
pub use policy::fn_policy;

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use http::Method;
use slice_http::connection::BoxConnection;
use slice_http::protocol::{Body, RequestHead, SendError, not_found};
use slice_http::response::{BoxResponse, Response, ResponseExt};
use slice_http::slice::{SharedSlice, Slice};
use tracing::{debug, warn};

/// Returns true for the methods a group broadcasts to all of its backends.
pub fn is_broadcast(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::CONNECT, Method::TRACE].contains(method)
}

/// A slice over an ordered set of backends, see the [module documentation](self).
///
/// Broadcast request bodies are buffered in full before the backends are invoked.
pub struct GroupSlice {
    backends: Arc<[SharedSlice]>,
    primary: usize,
    policy: Arc<dyn SuccessPolicy>,
}

impl GroupSlice {
    pub fn builder() -> GroupSliceBuilder {
        GroupSliceBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn primary(&self) -> usize {
        self.primary
    }
}

impl fmt::Debug for GroupSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSlice")
            .field("backends", &self.backends.len())
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}

impl Slice for GroupSlice {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        if self.backends.is_empty() {
            warn!(method = %head.method(), path = head.uri().path(), "group has no backends, responding with 404");
            return not_found().boxed();
        }

        if !is_broadcast(head.method()) {
            debug!(method = %head.method(), primary = self.primary, "routing to primary backend");
            return self.backends[self.primary].response(head, body);
        }

        GroupResponse { head, body, backends: Arc::clone(&self.backends), policy: Arc::clone(&self.policy) }.boxed()
    }
}

/// The response of a broadcast request; the backends are invoked when it is sent.
struct GroupResponse {
    head: RequestHead,
    body: Body,
    backends: Arc<[SharedSlice]>,
    policy: Arc<dyn SuccessPolicy>,
}

impl Response for GroupResponse {
    fn send(self: Box<Self>, connection: BoxConnection) -> BoxFuture<'static, Result<(), SendError>> {
        let GroupResponse { head, body, backends, policy } = *self;

        async move {
            // every backend reads its own copy of the request body
            let bytes = http_body_util::BodyExt::collect(body).await?.to_bytes();
            debug!(
                method = %head.method(),
                path = head.uri().path(),
                backends = backends.len(),
                body_size = bytes.len(),
                "broadcasting request"
            );

            let (aggregator, outcome) = Aggregator::new(backends.len(), connection, policy);

            let mut slots = Vec::with_capacity(backends.len());
            let mut tasks = Vec::with_capacity(backends.len());
            for (index, backend) in backends.iter().enumerate() {
                let connection = SlotConnection::new(aggregator.clone(), index);
                let slot = connection.state();
                let response = backend.response(head.clone(), Body::once(bytes.clone()));

                let task_slot = Arc::clone(&slot);
                tasks.push(tokio::spawn(async move {
                    let result = response.send(Box::new(connection)).await;
                    task_slot.settle(result).await;
                }));
                slots.push(slot);
            }
            drop(aggregator);

            for (slot, joined) in slots.iter().zip(join_all(tasks).await) {
                if let Err(e) = joined {
                    warn!(index = slot.index(), cause = %e, "backend task aborted");
                    slot.settle(Err(SendError::closed(format!("backend task aborted: {e}")))).await;
                }
            }

            outcome.await
        }
        .boxed()
    }
}

/// Configures a [`GroupSlice`].
pub struct GroupSliceBuilder {
    backends: Vec<SharedSlice>,
    primary: usize,
    policy: Arc<dyn SuccessPolicy>,
}

impl GroupSliceBuilder {
    fn new() -> Self {
        Self { backends: vec![], primary: 0, policy: Arc::new(StatusFamilyPolicy) }
    }

    /// Appends a backend; earlier backends take priority over later ones.
    pub fn backend<S: Slice>(mut self, slice: S) -> Self {
        self.backends.push(Arc::new(slice));
        self
    }

    /// Selects the backend that answers non-broadcast requests, the first one by default.
    pub fn primary(mut self, index: usize) -> Self {
        self.primary = index;
        self
    }

    /// Sets the policy deciding which backend responses may win, [`StatusFamilyPolicy`] by
    /// default.
    pub fn policy<P: SuccessPolicy>(mut self, policy: P) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Builds the group.
    ///
    /// # Panics
    ///
    /// Panics when a primary backend was selected that does not exist.
    pub fn build(self) -> GroupSlice {
        assert!(
            self.backends.is_empty() || self.primary < self.backends.len(),
            "primary backend {} is out of range for a group of {} backends",
            self.primary,
            self.backends.len()
        );
        GroupSlice { backends: self.backends.into(), primary: self.primary, policy: self.policy }
    }
}

impl fmt::Debug for GroupSliceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSliceBuilder")
            .field("backends", &self.backends.len())
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}
