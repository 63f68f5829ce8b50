use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::DelayMs;

/// Randomization applied on top of the computed backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JitterStrategy {
    /// Use the computed delay as is.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Uniform in `[delay / 2, delay]`.
    Equal,
}

/// Exponential backoff between retry rounds.
///
/// Round `n` (1-based) waits `first_ms * factor^(n-1)`, capped at `max_ms`, then jittered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStrategy {
    pub first_ms: DelayMs,
    pub max_ms: DelayMs,
    pub factor: f64,
    #[serde(default)]
    pub jitter: JitterStrategy,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self {
            first_ms: 1_000,
            max_ms: 30_000,
            factor: 2.0,
            jitter: JitterStrategy::None,
        }
    }
}

impl BackoffStrategy {
    /// Delay before retry round `attempt` without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let raw = self.first_ms as f64 * self.factor.max(1.0).powi(exp);
        let capped = raw.min(self.max_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry round `attempt` with the configured jitter applied.
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt).as_millis() as u64;
        let ms = match self.jitter {
            JitterStrategy::None => base,
            JitterStrategy::Full => rng.gen_range(0..=base),
            JitterStrategy::Equal => rng.gen_range(base / 2..=base),
        };
        Duration::from_millis(ms)
    }
}
