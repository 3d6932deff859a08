use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use slice_http::connection::Connection;
use slice_http::protocol::{Body, ResponseHead, SendError};
use tracing::{debug, trace, warn};

use crate::group::{Aggregator, Captured};

/// The connection a backend of a group sends its response to.
///
/// Nothing reaches the client through it: whatever the backend sends is captured and reported to
/// the race in the slot's name.
pub struct SlotConnection {
    slot: Arc<SlotState>,
}

pub(crate) struct SlotState {
    aggregator: Aggregator,
    index: usize,
    reported: AtomicBool,
}

impl SlotConnection {
    pub fn new(aggregator: Aggregator, index: usize) -> Self {
        Self { slot: Arc::new(SlotState { aggregator, index, reported: AtomicBool::new(false) }) }
    }

    pub fn index(&self) -> usize {
        self.slot.index
    }

    /// A handle that outlives the connection, used to settle the slot once the backend is done.
    pub(crate) fn state(&self) -> Arc<SlotState> {
        Arc::clone(&self.slot)
    }
}

impl fmt::Debug for SlotConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotConnection").field("index", &self.slot.index).finish()
    }
}

impl Connection for SlotConnection {
    fn accept(self: Box<Self>, head: ResponseHead, body: Body) -> BoxFuture<'static, Result<(), SendError>> {
        async move {
            let captured = Captured::new(head, body);
            if self.slot.reported.swap(true, Ordering::AcqRel) {
                warn!(index = self.slot.index, "slot already settled, cancelling response");
                captured.cancel();
                return Ok(());
            }

            self.slot.aggregator.report(self.slot.index, Ok(captured)).await;
            Ok(())
        }
        .boxed()
    }
}

impl SlotState {
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Settles the slot after its backend finished sending.
    ///
    /// A backend that finished without handing a response to its connection, or failed before
    /// doing so, is reported as failed.
    pub(crate) async fn settle(&self, result: Result<(), SendError>) {
        if self.reported.load(Ordering::Acquire) {
            match result {
                Ok(()) => trace!(index = self.index, "backend finished"),
                Err(e) => debug!(index = self.index, cause = %e, "backend failed after its response was captured"),
            }
            return;
        }

        let cause = result.err().unwrap_or_else(|| SendError::closed("backend finished without a response"));
        if !self.reported.swap(true, Ordering::AcqRel) {
            self.aggregator.report(self.index, Err(cause)).await;
        }
    }
}
