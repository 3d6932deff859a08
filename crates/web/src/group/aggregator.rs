//! The priority race between the backends of one broadcast request.
//!
//! Every backend owns one slot, its index is its priority (0 first). Reports arrive in any order
//! and are decided under one lock:
//!
//! - slots are scanned from index 0; the first slot that has not reported yet stops the scan and
//!   the race stays open
//! - the first successful result met before such a slot wins: it is replayed to the real
//!   connection and every other captured result is cancelled
//! - when every slot has reported and none succeeded, the real connection gets a `404 Not Found`
//!
//! A result reported after the race was decided is cancelled right away. The decision is made
//! inside the critical section; replaying and cancelling happen after it. Cancelling never waits
//! on a backend, so a losing body that does not end cannot hold back the outcome.

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};

use futures::FutureExt;
use slice_http::connection::BoxConnection;
use slice_http::protocol::{SendError, not_found};
use slice_http::response::{Response, ResponseExt};
use tokio::sync::oneshot;
use tracing::{debug, info, trace};

use crate::group::{Captured, SuccessPolicy};

enum Slot {
    Empty,
    Failed,
    Captured(Captured),
    // reported, and the result was already replayed or cancelled
    Settled,
}

/// What the race still needs to resolve; taken exactly once.
struct Waiting {
    connection: BoxConnection,
    outcome: oneshot::Sender<Result<(), SendError>>,
}

struct State {
    slots: Vec<Slot>,
    waiting: Option<Waiting>,
}

enum Decision {
    Open,
    Late(Option<Captured>),
    Resolved { winner: Option<(usize, Captured)>, losers: Vec<(usize, Captured)>, waiting: Waiting },
}

impl State {
    fn decide(&mut self, policy: &dyn SuccessPolicy) -> Decision {
        let mut winner = None;
        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Empty => return Decision::Open,
                Slot::Captured(captured) if policy.is_success(captured.head()) => {
                    winner = Some(index);
                    break;
                }
                Slot::Captured(_) | Slot::Failed | Slot::Settled => {}
            }
        }

        let Some(waiting) = self.waiting.take() else {
            return Decision::Open;
        };

        let mut won = None;
        let mut losers = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            match std::mem::replace(slot, Slot::Settled) {
                Slot::Captured(captured) if Some(index) == winner => won = Some((index, captured)),
                Slot::Captured(captured) => losers.push((index, captured)),
                other => *slot = other,
            }
        }

        Decision::Resolved { winner: won, losers, waiting }
    }
}

/// Shared arbiter of one race, cloned into every slot connection.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    policy: Arc<dyn SuccessPolicy>,
}

impl Aggregator {
    /// Creates the race for `slots` backends answering to `connection`.
    ///
    /// The returned [`Outcome`] resolves with the result of delivering the chosen response.
    ///
    /// # Panics
    ///
    /// Panics when `slots` is zero: such a race could never be decided.
    pub fn new(slots: usize, connection: BoxConnection, policy: Arc<dyn SuccessPolicy>) -> (Self, Outcome) {
        assert!(slots > 0, "a race needs at least one slot");

        let (sender, receiver) = oneshot::channel();
        let state = State {
            slots: (0..slots).map(|_| Slot::Empty).collect(),
            waiting: Some(Waiting { connection, outcome: sender }),
        };
        let aggregator = Self { inner: Arc::new(Inner { state: Mutex::new(state), policy }) };
        (aggregator, Outcome { receiver })
    }

    pub fn slots(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.lock().waiting.is_none()
    }

    /// Reports the result of the backend in slot `index`; a failed backend is reported as an
    /// error and never wins.
    ///
    /// The returned future completes once whatever this report decided was carried out: the
    /// winner replayed, the losers cancelled, or this late result cancelled.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range or the slot already reported.
    pub async fn report(&self, index: usize, result: Result<Captured, SendError>) {
        let decision = {
            let mut state = self.lock();
            let len = state.slots.len();
            assert!(index < len, "slot {index} is out of range for a race of {len} slots");
            assert!(matches!(state.slots[index], Slot::Empty), "slot {index} reported twice");

            if state.waiting.is_none() {
                state.slots[index] = Slot::Settled;
                Decision::Late(result.ok())
            } else {
                state.slots[index] = match result {
                    Ok(captured) => {
                        trace!(index, status = %captured.status(), "backend reported");
                        Slot::Captured(captured)
                    }
                    Err(e) => {
                        debug!(index, cause = %e, "backend failed");
                        Slot::Failed
                    }
                };
                state.decide(self.inner.policy.as_ref())
            }
        };

        match decision {
            Decision::Open => {}
            Decision::Late(captured) => {
                if let Some(captured) = captured {
                    debug!(index, "race already decided, cancelling late response");
                    captured.cancel();
                }
            }
            Decision::Resolved { winner, losers, waiting } => {
                let Waiting { connection, outcome } = waiting;
                let result = match winner {
                    Some((index, captured)) => {
                        info!(index, status = %captured.status(), "backend won the race");
                        captured.replay(connection).await
                    }
                    None => {
                        info!("no backend succeeded, responding with 404");
                        not_found().boxed().send(connection).await
                    }
                };

                for (index, loser) in losers {
                    trace!(index, "cancelling losing response");
                    loser.cancel();
                }

                if outcome.send(result).is_err() {
                    trace!("race outcome is no longer awaited");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Aggregator")
            .field("slots", &state.slots.len())
            .field("resolved", &state.waiting.is_none())
            .finish()
    }
}

/// Resolves with the result of delivering the race's response to the real connection.
#[derive(Debug)]
pub struct Outcome {
    receiver: oneshot::Receiver<Result<(), SendError>>,
}

impl Future for Outcome {
    type Output = Result<(), SendError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let result = ready!(self.receiver.poll_unpin(cx));
        Poll::Ready(result.unwrap_or_else(|_recv_error| Err(SendError::closed("race dropped before it was decided"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{StatusFamilyPolicy, fn_policy};
    use bytes::Bytes;
    use http::StatusCode;
    use slice_http::connection::{Collected, collecting};
    use slice_http::protocol::{Body, NOT_FOUND_BODY, ResponseHead};
    use std::io;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts how often a body was read to its end.
    #[derive(Clone, Default)]
    struct Drained(Arc<AtomicUsize>);

    impl Drained {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn captured(status: StatusCode, text: &'static str, drained: &Drained) -> Captured {
        let counter = Arc::clone(&drained.0);
        let body = futures::stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(text.as_bytes()))]).chain(
            futures::stream::once(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Bytes::new())
            }),
        );

        let mut head = ResponseHead::new(());
        *head.status_mut() = status;
        Captured::new(head, Body::from_stream(body))
    }

    fn race(slots: usize) -> (Aggregator, Outcome, Collected) {
        let (connection, collected) = collecting();
        let (aggregator, outcome) = Aggregator::new(slots, Box::new(connection), Arc::new(StatusFamilyPolicy));
        (aggregator, outcome, collected)
    }

    #[tokio::test]
    async fn first_success_in_priority_order_wins() {
        let (aggregator, outcome, collected) = race(4);
        let drained = [Drained::default(), Drained::default(), Drained::default(), Drained::default()];

        aggregator.report(3, Ok(captured(StatusCode::NOT_FOUND, "three", &drained[3]))).await;
        aggregator.report(2, Ok(captured(StatusCode::OK, "two", &drained[2]))).await;
        assert!(!aggregator.is_resolved());
        aggregator.report(0, Ok(captured(StatusCode::NOT_FOUND, "zero", &drained[0]))).await;
        assert!(!aggregator.is_resolved());
        aggregator.report(1, Ok(captured(StatusCode::NOT_FOUND, "one", &drained[1]))).await;
        assert!(aggregator.is_resolved());

        outcome.await.unwrap();
        let response = collected.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body(), Bytes::from("two"));
        assert!(drained.iter().all(|drained| drained.count() == 1));
    }

    #[tokio::test]
    async fn higher_priority_success_is_awaited() {
        let (aggregator, outcome, collected) = race(3);
        let late = Drained::default();
        let early = Drained::default();

        aggregator.report(1, Ok(captured(StatusCode::OK, "mirror", &early))).await;
        aggregator.report(2, Ok(captured(StatusCode::OK, "cache", &early))).await;
        assert!(!aggregator.is_resolved());
        assert_eq!(early.count(), 0);

        aggregator.report(0, Ok(captured(StatusCode::OK, "primary", &late))).await;

        outcome.await.unwrap();
        assert_eq!(collected.await.unwrap().into_body(), Bytes::from("primary"));
        assert_eq!(early.count(), 2);
    }

    #[tokio::test]
    async fn winner_does_not_wait_for_lower_priorities() {
        let (aggregator, outcome, collected) = race(3);
        let drained = Drained::default();

        aggregator.report(0, Err(SendError::closed("backend crashed"))).await;
        aggregator.report(1, Ok(captured(StatusCode::OK, "mirror", &drained))).await;
        assert!(aggregator.is_resolved());

        outcome.await.unwrap();
        assert_eq!(collected.await.unwrap().into_body(), Bytes::from("mirror"));

        let straggler = Drained::default();
        aggregator.report(2, Ok(captured(StatusCode::OK, "cache", &straggler))).await;
        assert_eq!(straggler.count(), 1);
    }

    #[tokio::test]
    async fn all_failures_answer_404_once() {
        let (aggregator, outcome, collected) = race(3);
        let drained = Drained::default();

        aggregator.report(2, Ok(captured(StatusCode::BAD_GATEWAY, "bad", &drained))).await;
        aggregator.report(0, Err(SendError::closed("backend crashed"))).await;
        aggregator.report(1, Ok(captured(StatusCode::NOT_FOUND, "missing", &drained))).await;

        outcome.await.unwrap();
        let response = collected.await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.into_body(), Bytes::from(NOT_FOUND_BODY));
        assert_eq!(drained.count(), 2);
    }

    #[tokio::test]
    async fn policy_decides_success() {
        let (connection, collected) = collecting();
        let policy = Arc::new(fn_policy(|head: &ResponseHead| head.status() != StatusCode::NOT_FOUND));
        let (aggregator, outcome) = Aggregator::new(2, Box::new(connection), policy);
        let drained = Drained::default();

        aggregator.report(0, Ok(captured(StatusCode::INTERNAL_SERVER_ERROR, "oops", &drained))).await;

        outcome.await.unwrap();
        assert_eq!(collected.await.unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn concurrent_reports_pick_exactly_one() {
        for _ in 0..32 {
            let (aggregator, outcome, collected) = race(8);
            let drained = Drained::default();

            let reports = (0..8).map(|index| {
                let aggregator = aggregator.clone();
                let status = if index % 3 == 2 { StatusCode::OK } else { StatusCode::NOT_FOUND };
                let captured = captured(status, "payload", &drained);
                tokio::spawn(async move { aggregator.report(index, Ok(captured)).await })
            });
            for report in futures::future::join_all(reports).await {
                report.unwrap();
            }

            outcome.await.unwrap();
            assert_eq!(collected.await.unwrap().status(), StatusCode::OK);
            assert_eq!(drained.count(), 8);
        }
    }

    #[tokio::test]
    async fn endless_loser_does_not_hold_back_outcome() {
        let (aggregator, outcome, collected) = race(2);
        let endless = futures::stream::repeat_with(|| Ok::<_, io::Error>(Bytes::from_static(b"more")));
        let mut head = ResponseHead::new(());
        *head.status_mut() = StatusCode::OK;

        let decided = async {
            aggregator.report(1, Ok(Captured::new(head, Body::from_stream(endless)))).await;
            aggregator.report(0, Ok(captured(StatusCode::OK, "win", &Drained::default()))).await;
            outcome.await
        };
        tokio::time::timeout(Duration::from_secs(2), decided).await.unwrap().unwrap();
        assert_eq!(collected.await.unwrap().into_body(), Bytes::from("win"));
    }

    #[tokio::test]
    #[should_panic(expected = "reported twice")]
    async fn duplicate_report_panics() {
        let (aggregator, _outcome, _collected) = race(2);
        aggregator.report(1, Err(SendError::closed("gone"))).await;
        aggregator.report(1, Err(SendError::closed("gone"))).await;
    }

    #[tokio::test]
    #[should_panic(expected = "out of range")]
    async fn out_of_range_report_panics() {
        let (aggregator, _outcome, _collected) = race(2);
        aggregator.report(2, Err(SendError::closed("gone"))).await;
    }

    #[tokio::test]
    async fn dropped_race_fails_outcome() {
        let (aggregator, outcome, _collected) = race(2);
        drop(aggregator);
        assert!(matches!(outcome.await, Err(SendError::Closed { .. })));
    }
}
