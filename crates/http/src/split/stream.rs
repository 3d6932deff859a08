//! Pull side of the splitter: a stream of segments, each segment a stream of bytes.
//!
//! Both levels share one [`State`] behind one mutex. Every `poll_next` is one unit of demand:
//!
//! - the outer [`SplitStream`] hands out the next [`Segment`] as soon as the previous one has been
//!   closed; while a segment is open an outer poll is forwarded to the upstream as a pull for more
//!   raw bytes, but only when nothing is queued yet
//! - the inner [`Segment`] drains the pending item queue one item per poll and pulls the upstream
//!   when the queue is empty; draining an end marker closes it and releases the outer stream
//!
//! Only one segment is open at a time. A segment dropped before its end is abandoned and the rest
//! of its content is discarded. The upstream is polled with a waker that wakes both levels, so
//! whichever side is waiting gets to see the new bytes.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::task::{ArcWake, AtomicWaker, waker};
use futures::{Stream, StreamExt, TryStreamExt};
use tracing::{debug, trace};

use crate::protocol::{Body, BoxError, SplitError};
use crate::split::{SegmentReceiver, Split};

enum Item {
    Chunk(Bytes),
    End,
}

/// The queue between the splitter and the consumers.
#[derive(Default)]
struct Pending(VecDeque<Item>);

impl SegmentReceiver for Pending {
    fn receive(&mut self, bytes: Bytes, last: bool) {
        if !bytes.is_empty() {
            self.0.push_back(Item::Chunk(bytes));
        }
        if last {
            self.0.push_back(Item::End);
        }
    }
}

struct State {
    split: Split,
    // `None` once the upstream has completed or failed
    upstream: Option<BoxStream<'static, Result<Bytes, BoxError>>>,
    pending: Pending,
    finished: bool,
    error: Option<SplitError>,
    outer_error_delivered: bool,
    // segments handed to the outer consumer / segments whose end marker was drained
    handed_out: usize,
    closed: usize,
    abandoned: bool,
}

impl State {
    /// Pulls one chunk from the upstream and runs it through the splitter.
    fn pull(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Poll::Ready(());
        };

        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(bytes))) => {
                trace!(size = bytes.len(), "pulled chunk from upstream");
                self.split.push(&bytes, &mut self.pending);
            }
            Poll::Ready(Some(Err(e))) => {
                debug!(cause = %e, open_segment = self.closed, "upstream failed, abandoning open segment");
                self.split.abort();
                self.upstream = None;
                self.error = Some(SplitError::upstream(e));
            }
            Poll::Ready(None) => {
                self.split.complete(&mut self.pending);
                self.upstream = None;
                self.finished = true;
            }
            Poll::Pending => return Poll::Pending,
        }
        Poll::Ready(())
    }

    fn is_exhausted(&self) -> bool {
        self.finished && self.pending.0.is_empty()
    }

    /// Discards queued content of an abandoned segment; returns true once its end was reached.
    fn discard_abandoned(&mut self) -> bool {
        while let Some(item) = self.pending.0.pop_front() {
            if let Item::End = item {
                self.closed += 1;
                self.abandoned = false;
                return true;
            }
        }
        false
    }
}

#[derive(Default)]
struct SplitWaker {
    outer: AtomicWaker,
    inner: AtomicWaker,
}

impl ArcWake for SplitWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.outer.wake();
        arc_self.inner.wake();
    }
}

struct Shared {
    state: Mutex<State>,
    wakers: Arc<SplitWaker>,
    upstream_waker: Waker,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stream of the segments of an upstream byte stream.
pub struct SplitStream {
    shared: Arc<Shared>,
}

impl SplitStream {
    pub fn new<S, E>(split: Split, upstream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let state = State {
            split,
            upstream: Some(upstream.map_err(Into::into).boxed()),
            pending: Pending::default(),
            finished: false,
            error: None,
            outer_error_delivered: false,
            handed_out: 0,
            closed: 0,
            abandoned: false,
        };

        let wakers = Arc::new(SplitWaker::default());
        let upstream_waker = waker(Arc::clone(&wakers));
        Self { shared: Arc::new(Shared { state: Mutex::new(state), wakers, upstream_waker }) }
    }
}

impl fmt::Debug for SplitStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("SplitStream")
            .field("handed_out", &state.handed_out)
            .field("closed", &state.closed)
            .field("finished", &state.finished)
            .finish_non_exhaustive()
    }
}

impl Stream for SplitStream {
    type Item = Result<Segment, SplitError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let shared = &self.shared;
        shared.wakers.outer.register(cx.waker());
        let mut upstream_cx = Context::from_waker(&shared.upstream_waker);
        let mut state = shared.lock();

        loop {
            if let Some(error) = state.error.clone() {
                if state.outer_error_delivered {
                    return Poll::Ready(None);
                }
                state.outer_error_delivered = true;
                return Poll::Ready(Some(Err(error)));
            }

            if state.handed_out == state.closed {
                if state.is_exhausted() {
                    return Poll::Ready(None);
                }

                let id = state.handed_out;
                state.handed_out += 1;
                trace!(segment = id, "handing out segment");
                return Poll::Ready(Some(Ok(Segment { id, done: false, shared: Arc::clone(shared) })));
            }

            if state.abandoned && state.discard_abandoned() {
                continue;
            }

            if !state.abandoned && !state.pending.0.is_empty() {
                // the open segment has not drained its queue yet
                return Poll::Pending;
            }

            if state.upstream.is_none() {
                return Poll::Ready(None);
            }

            match state.pull(&mut upstream_cx) {
                Poll::Ready(()) => shared.wakers.inner.wake(),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// One delimiter-separated part of the upstream, streamed as it arrives.
pub struct Segment {
    id: usize,
    done: bool,
    shared: Arc<Shared>,
}

impl Segment {
    /// Position of this segment in the upstream, starting at 0.
    pub fn index(&self) -> usize {
        self.id
    }

    pub fn into_body(self) -> Body {
        Body::from_stream(self)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment").field("index", &self.id).field("done", &self.done).finish_non_exhaustive()
    }
}

impl From<Segment> for Body {
    fn from(segment: Segment) -> Self {
        segment.into_body()
    }
}

impl Stream for Segment {
    type Item = Result<Bytes, SplitError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let shared = Arc::clone(&self.shared);
        shared.wakers.inner.register(cx.waker());
        let mut upstream_cx = Context::from_waker(&shared.upstream_waker);
        let mut state = shared.lock();

        if self.id < state.closed {
            self.done = true;
            return Poll::Ready(None);
        }

        loop {
            match state.pending.0.pop_front() {
                Some(Item::Chunk(bytes)) => return Poll::Ready(Some(Ok(bytes))),
                Some(Item::End) => {
                    state.closed += 1;
                    self.done = true;
                    trace!(segment = self.id, "segment closed");
                    shared.wakers.outer.wake();
                    return Poll::Ready(None);
                }
                None => {}
            }

            if let Some(error) = state.error.clone() {
                self.done = true;
                shared.wakers.outer.wake();
                return Poll::Ready(Some(Err(error)));
            }

            if state.upstream.is_none() {
                // completed upstream always queues a final end marker
                self.done = true;
                return Poll::Ready(None);
            }

            match state.pull(&mut upstream_cx) {
                Poll::Ready(()) => shared.wakers.outer.wake(),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        let mut state = self.shared.lock();
        if self.id == state.closed && state.error.is_none() {
            debug!(segment = self.id, "segment dropped before its end, discarding the rest");
            state.abandoned = true;
            state.discard_abandoned();
        }
        drop(state);
        self.shared.wakers.outer.wake();
    }
}
