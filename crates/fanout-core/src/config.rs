use std::sync::Arc;
use std::time::Duration;

use fanout_model::DelayMs;
use serde::{Deserialize, Serialize};

use crate::{
    dispatch::{RetryPolicy, TaskDispatcher},
    error::CoreError,
    limiter::{ConcurrencyLimiter, Limit},
    window::{RateWindow, WindowReset},
};

/// Knobs of one dispatch run.
///
/// Defaults reproduce the reference load: 40 tasks, 10 in flight, 30 admissions per second,
/// 200 ms pre-dispatch delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    pub task_count: usize,
    /// Maximum tasks in flight; `0` disables the limiter.
    pub concurrency: Limit,
    pub rate_limit: u64,
    pub window_ms: DelayMs,
    pub window_reset: WindowReset,
    pub pre_delay_ms: DelayMs,
    /// Optional re-dispatch of throttled tasks after the first pass.
    pub retry: Option<RetryPolicy>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            task_count: 40,
            concurrency: Limit::from(10),
            rate_limit: 30,
            window_ms: 1_000,
            window_reset: WindowReset::Lazy,
            pre_delay_ms: 200,
            retry: None,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.window_ms == 0 {
            return Err(CoreError::InvalidConfig("windowMs must be > 0".to_string()));
        }
        if let Some(retry) = &self.retry
            && retry.backoff.factor < 1.0
        {
            return Err(CoreError::InvalidConfig(
                "retry.backoff.factor must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn rate_window(&self) -> Result<Arc<RateWindow>, CoreError> {
        RateWindow::with_reset(self.rate_limit, self.window(), self.window_reset).map(Arc::new)
    }

    pub fn limiter(&self) -> ConcurrencyLimiter {
        ConcurrencyLimiter::new(self.concurrency)
    }

    pub fn dispatcher(&self) -> TaskDispatcher {
        TaskDispatcher::new().with_pre_delay(Duration::from_millis(self.pre_delay_ms))
    }
}
