//! Settle-all dispatch of indexed tasks.
//!
//! Every task goes through the same unit of work:
//! 1. wait for a permit from the [`ConcurrencyLimiter`];
//! 2. wait out the pre-dispatch delay (spreads bursts across the rate window);
//! 3. bail out as cancelled if the dispatcher's token fired;
//! 4. call the [`Backend`] and tag the result as an [`Outcome`].
//!
//! Failures are converted to `Outcome::Rejected` inside the unit, so the joint await over all
//! units never short-circuits. [`TaskDispatcher::try_dispatch_all`] is the fail-fast variant.
mod result_set;
pub use result_set::{DispatchSummary, ResultSet};

mod retry;
pub use retry::RetryPolicy;

#[cfg(test)]
mod scenarios;

use std::sync::Arc;
use std::time::Duration;

use fanout_model::{Outcome, TaskIndex, TaskStatus};
use futures::future::{join_all, try_join_all};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::Backend,
    error::TaskError,
    events::{DispatchEvent, Subscribe},
    limiter::ConcurrencyLimiter,
};

#[derive(Clone, Default)]
pub struct TaskDispatcher {
    pre_delay: Duration,
    cancel: Option<CancellationToken>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl TaskDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every task waits after admission and before calling the backend.
    pub fn with_pre_delay(mut self, delay: Duration) -> Self {
        self.pre_delay = delay;
        self
    }

    /// Tasks that have not reached the backend when `token` fires settle as cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    #[inline]
    pub fn pre_delay(&self) -> Duration {
        self.pre_delay
    }

    /// Run tasks `0..task_count` and wait until every one of them has settled.
    #[instrument(level = "debug", skip(self, limiter, backend), fields(backend = backend.name()))]
    pub async fn dispatch_all<B: Backend>(
        &self,
        task_count: usize,
        limiter: &ConcurrencyLimiter,
        backend: &B,
    ) -> ResultSet<B::Value> {
        let indices: Vec<TaskIndex> = TaskIndex::range(task_count).collect();
        let outcomes = self.run_batch(&indices, limiter, backend).await;
        ResultSet::from_settled(outcomes)
    }

    /// Fail-fast variant: resolves with the first task error and drops in-flight siblings.
    #[instrument(level = "debug", skip(self, limiter, backend), fields(backend = backend.name()))]
    pub async fn try_dispatch_all<B: Backend>(
        &self,
        task_count: usize,
        limiter: &ConcurrencyLimiter,
        backend: &B,
    ) -> Result<Vec<B::Value>, TaskError> {
        let units = TaskIndex::range(task_count).map(|index| async move {
            limiter
                .run(|| async move {
                    self.wait_pre_delay().await;
                    if self.is_cancelled() {
                        return Err(TaskError::cancelled());
                    }
                    backend.execute(index).await
                })
                .await
                .map_err(TaskError::from)
                .and_then(|res| res)
        });

        let res = try_join_all(units).await;
        if let Err(e) = &res {
            warn!(kind = e.kind.as_str(), error = %e, "batch aborted on first failure");
        }
        res
    }

    pub(crate) async fn run_batch<B: Backend>(
        &self,
        indices: &[TaskIndex],
        limiter: &ConcurrencyLimiter,
        backend: &B,
    ) -> Vec<Outcome<B::Value>> {
        let started = Instant::now();
        self.emit(DispatchEvent::DispatchStarted {
            total: indices.len(),
        });

        let outcomes =
            join_all(indices.iter().map(|&index| self.settle(index, limiter, backend))).await;

        let summary = DispatchSummary::count(&outcomes);
        let elapsed = started.elapsed();

        info!(
            total = summary.total,
            fulfilled = summary.fulfilled,
            throttled = summary.throttled,
            failed = summary.failed,
            cancelled = summary.cancelled,
            elapsed_ms = elapsed.as_millis() as u64,
            "dispatch settled"
        );
        self.emit(DispatchEvent::DispatchCompleted {
            total: summary.total,
            fulfilled: summary.fulfilled,
            throttled: summary.throttled,
            failed: summary.failed,
            cancelled: summary.cancelled,
            elapsed,
        });
        outcomes
    }

    async fn settle<B: Backend>(
        &self,
        index: TaskIndex,
        limiter: &ConcurrencyLimiter,
        backend: &B,
    ) -> Outcome<B::Value> {
        self.emit(DispatchEvent::TaskQueued { index });

        let outcome = match limiter.run(|| self.execute(index, backend)).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Rejected {
                index,
                kind: TaskError::from(e.clone()).kind,
                message: e.to_string(),
            },
        };

        let (status, failure, message) = match &outcome {
            Outcome::Fulfilled { .. } => (TaskStatus::Fulfilled, None, None),
            Outcome::Rejected { kind, message, .. } => {
                (TaskStatus::Rejected, Some(*kind), Some(message.clone()))
            }
        };
        self.emit(DispatchEvent::TaskSettled {
            index,
            status,
            failure,
            message,
        });
        outcome
    }

    async fn execute<B: Backend>(&self, index: TaskIndex, backend: &B) -> Outcome<B::Value> {
        self.emit(DispatchEvent::TaskAdmitted { index });
        self.wait_pre_delay().await;

        if self.is_cancelled() {
            debug!(%index, "dispatch cancelled before execution");
            let e = TaskError::cancelled();
            return Outcome::Rejected {
                index,
                kind: e.kind,
                message: e.message,
            };
        }

        self.emit(DispatchEvent::TaskExecuting { index });
        match backend.execute(index).await {
            Ok(value) => Outcome::Fulfilled { index, value },
            Err(e) => {
                debug!(%index, kind = e.kind.as_str(), error = %e, "task rejected");
                Outcome::Rejected {
                    index,
                    kind: e.kind,
                    message: e.message,
                }
            }
        }
    }

    async fn wait_pre_delay(&self) {
        if !self.pre_delay.is_zero() {
            tokio::time::sleep(self.pre_delay).await;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    fn emit(&self, event: DispatchEvent) {
        for subscriber in &self.subscribers {
            subscriber.on_event(&event);
        }
    }
}
