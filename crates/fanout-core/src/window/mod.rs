//! Fixed-duration admission window.
//!
//! ## Overview
//!
//! [`RateWindow`] counts request attempts inside a window of `duration` and answers whether
//! the latest attempt is still within `limit`. Every attempt increments the counter, including
//! denied ones, so once the quota is exceeded every further attempt in the same window is denied.
//!
//! Two reset modes exist:
//! - [`WindowReset::Lazy`]: the window is rolled over by the first `admit()` that observes it
//!   expired. An idle window is never reset, which keeps tests deterministic.
//! - [`WindowReset::Interval`]: a background task spawned with
//!   [`RateWindow::spawn_interval_reset`] zeroes the counter on every tick, regardless of traffic.
//!   The task stops when its cancellation token is cancelled.
//!
//! The counter is guarded by a mutex so increment-and-compare is a single critical section
//! even when dispatches run on several runtime worker threads.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::CoreError;

/// How an expired window gets rolled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowReset {
    /// Reset on the first admission attempt after expiry.
    #[default]
    Lazy,
    /// Reset unconditionally every `duration` by a background task.
    Interval,
}

/// Point-in-time view of a [`RateWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    /// Attempts counted in the current window.
    pub count: u64,
    pub limit: u64,
    /// Lifetime number of granted admissions.
    pub admitted: u64,
    /// Lifetime number of denied admissions.
    pub denied: u64,
}

#[derive(Debug)]
struct WindowState {
    count: u64,
    window_start: Instant,
    admitted: u64,
    denied: u64,
}

#[derive(Debug)]
pub struct RateWindow {
    limit: u64,
    duration: Duration,
    reset: WindowReset,
    state: Mutex<WindowState>,
}

impl RateWindow {
    /// Create a lazily reset window admitting `limit` attempts per `duration`.
    pub fn new(limit: u64, duration: Duration) -> Result<Self, CoreError> {
        Self::with_reset(limit, duration, WindowReset::Lazy)
    }

    pub fn with_reset(limit: u64, duration: Duration, reset: WindowReset) -> Result<Self, CoreError> {
        if duration.is_zero() {
            return Err(CoreError::InvalidConfig(
                "rate window duration must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            limit,
            duration,
            reset,
            state: Mutex::new(WindowState {
                count: 0,
                window_start: Instant::now(),
                admitted: 0,
                denied: 0,
            }),
        })
    }

    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[inline]
    pub fn reset_mode(&self) -> WindowReset {
        self.reset
    }

    /// Record one attempt and report whether it fits in the current window's quota.
    pub fn admit(&self) -> bool {
        let mut state = self.state();

        if self.reset == WindowReset::Lazy {
            let now = Instant::now();
            if now.duration_since(state.window_start) >= self.duration {
                trace!(previous = state.count, "rate window expired; starting a new one");
                state.count = 0;
                state.window_start = now;
            }
        }

        state.count = state.count.saturating_add(1);
        let admitted = state.count <= self.limit;
        if admitted {
            state.admitted += 1;
        } else {
            state.denied += 1;
        }
        trace!(count = state.count, limit = self.limit, admitted, "admission attempt");
        admitted
    }

    /// Start a fresh window immediately.
    pub fn reset(&self) {
        let mut state = self.state();
        state.count = 0;
        state.window_start = Instant::now();
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let state = self.state();
        WindowSnapshot {
            count: state.count,
            limit: self.limit,
            admitted: state.admitted,
            denied: state.denied,
        }
    }

    /// Spawn the background task driving [`WindowReset::Interval`].
    ///
    /// The first reset fires one `duration` after the call. The task exits once `token`
    /// is cancelled; await the returned handle to make sure it is gone.
    pub fn spawn_interval_reset(
        self: &Arc<Self>,
        token: CancellationToken,
    ) -> Result<JoinHandle<()>, CoreError> {
        if self.reset != WindowReset::Interval {
            return Err(CoreError::InvalidConfig(
                "interval reset requested for a lazily reset window".to_string(),
            ));
        }

        let window = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + window.duration, window.duration);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => window.reset(),
                }
            }
            debug!("rate window interval reset stopped");
        }))
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
