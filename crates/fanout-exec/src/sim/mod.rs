//! Simulated backend with a 429-style admission quota.
//!
//! A call is processed in this order:
//! - the shared [`RateWindow`] is asked for admission; a denied call fails immediately with
//!   [`ExecError::Throttled`], without any latency;
//! - an admitted call sleeps for a latency drawn from the [`LatencyPolicy`];
//! - indices listed in the [`FailurePolicy`] then fail with [`ExecError::Failed`];
//! - everything else resolves with the catalog entry for the index.
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fanout_core::{Backend, RateWindow, TaskError};
use fanout_model::{DelayMs, TaskIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::{
    catalog::Catalog,
    error::{ExecError, ExecResult},
};

/// Latency applied to admitted calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LatencyPolicy {
    /// Always the same delay.
    Fixed { ms: DelayMs },
    /// Uniformly distributed in `[min_ms, max_ms]`.
    #[serde(rename_all = "camelCase")]
    Uniform { min_ms: DelayMs, max_ms: DelayMs },
}

impl Default for LatencyPolicy {
    fn default() -> Self {
        LatencyPolicy::Uniform {
            min_ms: 200,
            max_ms: 500,
        }
    }
}

impl LatencyPolicy {
    pub fn fixed(delay: Duration) -> Self {
        LatencyPolicy::Fixed {
            ms: delay.as_millis() as DelayMs,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = match *self {
            LatencyPolicy::Fixed { ms } => ms,
            LatencyPolicy::Uniform { min_ms, max_ms } if min_ms >= max_ms => min_ms,
            LatencyPolicy::Uniform { min_ms, max_ms } => rng.gen_range(min_ms..=max_ms),
        };
        Duration::from_millis(ms)
    }
}

/// Indices that always fail with a generic error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailurePolicy {
    failing: BTreeSet<usize>,
}

impl FailurePolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing: indices.into_iter().collect(),
        }
    }

    #[inline]
    pub fn should_fail(&self, index: TaskIndex) -> bool {
        self.failing.contains(&index.get())
    }
}

/// Serializable simulator settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatorConfig {
    pub latency: LatencyPolicy,
    pub failing: FailurePolicy,
}

pub struct BackendSimulator<V> {
    window: Option<Arc<RateWindow>>,
    catalog: Arc<Catalog<V>>,
    latency: LatencyPolicy,
    failures: FailurePolicy,
}

impl<V> BackendSimulator<V> {
    /// Simulator without any admission quota.
    pub fn new(catalog: Arc<Catalog<V>>) -> Self {
        Self {
            window: None,
            catalog,
            latency: LatencyPolicy::default(),
            failures: FailurePolicy::none(),
        }
    }

    pub fn from_config(catalog: Arc<Catalog<V>>, config: &SimulatorConfig) -> Self {
        Self::new(catalog)
            .with_latency(config.latency.clone())
            .with_failures(config.failing.clone())
    }

    /// Check every call against `window` before doing any work.
    pub fn with_window(mut self, window: Arc<RateWindow>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_latency(mut self, latency: LatencyPolicy) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failures(mut self, failures: FailurePolicy) -> Self {
        self.failures = failures;
        self
    }

    pub fn window(&self) -> Option<&Arc<RateWindow>> {
        self.window.as_ref()
    }
}

impl<V: Clone> BackendSimulator<V> {
    pub async fn call(&self, index: TaskIndex) -> ExecResult<V> {
        if let Some(window) = &self.window
            && !window.admit()
        {
            let snap = window.snapshot();
            warn!(%index, count = snap.count, limit = snap.limit, "request over quota");
            return Err(ExecError::Throttled);
        }

        let latency = self.latency.sample(&mut rand::thread_rng());
        trace!(%index, latency_ms = latency.as_millis() as u64, "request admitted");
        tokio::time::sleep(latency).await;

        if self.failures.should_fail(index) {
            return Err(ExecError::Failed(index));
        }
        self.catalog
            .get(index)
            .cloned()
            .ok_or(ExecError::MissingEntry(index))
    }
}

#[async_trait]
impl<V> Backend for BackendSimulator<V>
where
    V: Clone + Send + Sync,
{
    type Value = V;

    fn name(&self) -> &'static str {
        "simulator"
    }

    async fn execute(&self, index: TaskIndex) -> Result<V, TaskError> {
        self.call(index).await.map_err(TaskError::from)
    }
}
