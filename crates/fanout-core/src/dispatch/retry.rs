use fanout_model::BackoffStrategy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{backend::Backend, limiter::ConcurrencyLimiter};

use super::{ResultSet, TaskDispatcher};

/// Re-dispatch policy for throttled tasks.
///
/// Applied on top of a settled [`ResultSet`]: each round sends a fresh task for every index
/// that is still throttled, after the backoff delay for that round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::default(),
        }
    }
}

impl TaskDispatcher {
    /// Retry throttled outcomes of `results` according to `policy`.
    ///
    /// Fulfilled and non-throttled rejections are kept as they are. Returns once no throttled
    /// task is left or `policy.max_attempts` rounds have run.
    pub async fn redispatch_throttled<B: Backend>(
        &self,
        mut results: ResultSet<B::Value>,
        policy: &RetryPolicy,
        limiter: &ConcurrencyLimiter,
        backend: &B,
    ) -> ResultSet<B::Value> {
        for attempt in 1..=policy.max_attempts {
            let pending = results.throttled_indices();
            if pending.is_empty() {
                debug!(attempt, "no throttled tasks left");
                break;
            }

            let delay = policy.backoff.delay(attempt, &mut rand::thread_rng());
            info!(
                attempt,
                pending = pending.len(),
                delay_ms = delay.as_millis() as u64,
                "re-dispatching throttled tasks"
            );
            tokio::time::sleep(delay).await;

            for outcome in self.run_batch(&pending, limiter, backend).await {
                results.replace(outcome);
            }
        }
        results
    }
}
