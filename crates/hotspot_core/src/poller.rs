//! Bounded-wait polling of platform asynchronous operations.
//!
//! The platform call only exposes a pollable status, so the poller checks it
//! at a fixed interval until the operation settles or the deadline passes.
//! Every loop iteration checks the deadline, so a handle frozen in
//! `Pending` ends in [`AsyncPollOutcome::TimedOut`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;

/// Default interval between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Deadline for starting tethering.
pub const START_DEADLINE: Duration = Duration::from_secs(45);

/// Deadline for stopping tethering.
pub const STOP_DEADLINE: Duration = Duration::from_secs(45);

/// Start deadline used by [`Poller::await_operation`] callers that only
/// watch the raw handle.
pub const RAW_HANDLE_DEADLINE: Duration = Duration::from_secs(30);

/// Status reported by an asynchronous operation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Completed,
    Canceled,
    Failed,
}

/// Final outcome of polling an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncPollOutcome<T> {
    Completed(T),
    Canceled,
    Failed(i64),
    TimedOut,
}

impl<T> AsyncPollOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Opaque handle to a platform asynchronous call.
#[async_trait]
pub trait AsyncOperation: Send {
    type Output: Send;

    /// Current status of the call.
    async fn status(&mut self) -> OperationStatus;

    /// Result value; only meaningful once the status is `Completed`.
    async fn result(&mut self) -> Self::Output;

    /// Underlying error code; only meaningful once the status is `Failed`.
    async fn error_code(&mut self) -> i64;
}

/// Higher-level signal telling whether the device reached the target state.
#[async_trait]
pub trait ConvergenceProbe: Send {
    async fn has_converged(&mut self) -> bool;
}

/// Poll timing, configurable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    pub interval: Duration,
    pub start_deadline: Duration,
    pub stop_deadline: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            start_deadline: START_DEADLINE,
            stop_deadline: STOP_DEADLINE,
        }
    }
}

/// Sleep-between-checks state machine over an [`AsyncOperation`].
#[derive(Clone)]
pub struct Poller {
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Poller {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self { clock, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait on the raw handle status only.
    pub async fn await_operation<O>(&self, op: &mut O, deadline: Duration) -> AsyncPollOutcome<O::Output>
    where
        O: AsyncOperation,
    {
        let started = self.clock.now();
        let mut polls = 0u32;

        loop {
            match op.status().await {
                OperationStatus::Completed => return AsyncPollOutcome::Completed(op.result().await),
                OperationStatus::Canceled => return AsyncPollOutcome::Canceled,
                OperationStatus::Failed => return AsyncPollOutcome::Failed(op.error_code().await),
                OperationStatus::Pending => {}
            }

            if self.clock.now().saturating_sub(started) >= deadline {
                warn!(polls, deadline_ms = deadline.as_millis() as u64, "Operation still pending at deadline");
                return AsyncPollOutcome::TimedOut;
            }

            polls += 1;
            self.clock.sleep(self.interval).await;
        }
    }

    /// Wait until the handle completes and the device state converges.
    ///
    /// Failure or cancellation of the handle ends the wait immediately. If
    /// the deadline passes after the handle completed but before the state
    /// converged, the raw handle result is returned. A state query is bounded
    /// by the time left before the deadline.
    pub async fn await_converged<O, P>(
        &self,
        op: &mut O,
        probe: &mut P,
        deadline: Duration,
    ) -> AsyncPollOutcome<O::Output>
    where
        O: AsyncOperation,
        P: ConvergenceProbe,
    {
        let started = self.clock.now();
        let mut polls = 0u32;

        loop {
            let status = op.status().await;
            match status {
                OperationStatus::Canceled => return AsyncPollOutcome::Canceled,
                OperationStatus::Failed => return AsyncPollOutcome::Failed(op.error_code().await),
                OperationStatus::Completed => {
                    let remaining = deadline.saturating_sub(self.clock.now().saturating_sub(started));
                    match tokio::time::timeout(remaining, probe.has_converged()).await {
                        Ok(true) => {
                            debug!(polls, "Operational state converged");
                            return AsyncPollOutcome::Completed(op.result().await);
                        }
                        Ok(false) => {}
                        Err(_) => {
                            warn!(polls, "State query outlived the deadline; using handle result");
                            return AsyncPollOutcome::Completed(op.result().await);
                        }
                    }
                }
                OperationStatus::Pending => {}
            }

            if self.clock.now().saturating_sub(started) >= deadline {
                if status == OperationStatus::Completed {
                    warn!(polls, "Operational state did not converge; using handle result");
                    return AsyncPollOutcome::Completed(op.result().await);
                }
                warn!(polls, deadline_ms = deadline.as_millis() as u64, "Operation still pending at deadline");
                return AsyncPollOutcome::TimedOut;
            }

            polls += 1;
            self.clock.sleep(self.interval).await;
        }
    }
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
