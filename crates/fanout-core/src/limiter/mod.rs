//! Bounded-concurrency gate for dispatched tasks.
//!
//! [`ConcurrencyLimiter::run`] suspends the caller until one of `max` permits is free, runs the
//! closure while holding the permit and releases it on every exit path (the permit is a guard
//! dropped at the end of the call, including when the future is dropped midway).
//!
//! Admission is FIFO: permits come from a fair [`tokio::sync::Semaphore`], which serves queued
//! waiters in the order they started waiting.
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::error::CoreError;

/// Upper bound on concurrently running tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "usize", into = "usize")]
pub enum Limit {
    /// There is no limit.
    None,
    /// There is an upper limit.
    Max(NonZeroUsize),
}

impl From<usize> for Limit {
    fn from(value: usize) -> Self {
        NonZeroUsize::new(value).map(Limit::Max).unwrap_or(Limit::None)
    }
}

impl From<Limit> for usize {
    fn from(value: Limit) -> Self {
        match value {
            Limit::None => 0,
            Limit::Max(max) => max.get(),
        }
    }
}

impl Limit {
    pub fn max(&self) -> Option<usize> {
        match self {
            Limit::None => None,
            Limit::Max(max) => Some(max.get()),
        }
    }
}

pub struct ConcurrencyLimiter {
    limit: Limit,
    semaphore: Option<Semaphore>,
    closed: AtomicBool,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyLimiter {
    pub fn new(limit: Limit) -> Self {
        let semaphore = limit.max().map(Semaphore::new);
        Self {
            limit,
            semaphore,
            closed: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Limiter admitting at most `max` concurrent closures.
    pub fn bounded(max: NonZeroUsize) -> Self {
        Self::new(Limit::Max(max))
    }

    /// Limiter that never makes callers wait.
    pub fn unbounded() -> Self {
        Self::new(Limit::None)
    }

    #[inline]
    pub fn limit(&self) -> Limit {
        self.limit
    }

    /// Number of closures currently running under this limiter.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Highest number of closures observed running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Free permits, `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(Semaphore::available_permits)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Reject every waiting and future caller with [`CoreError::LimiterClosed`].
    ///
    /// Closures already running keep their permits until they finish.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(semaphore) = &self.semaphore {
            semaphore.close();
        }
        debug!("concurrency limiter closed");
    }

    /// Run `f` once a permit is available and return its output unchanged.
    pub async fn run<F, Fut, T>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.is_closed() {
            return Err(CoreError::LimiterClosed);
        }

        let _permit = match &self.semaphore {
            Some(semaphore) => Some(
                semaphore
                    .acquire()
                    .await
                    .map_err(|_| CoreError::LimiterClosed)?,
            ),
            None => None,
        };

        let _active = ActiveGuard::enter(self);
        Ok(f().await)
    }
}

impl std::fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("limit", &self.limit)
            .field("active", &self.active())
            .field("peak", &self.peak())
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct ActiveGuard<'a> {
    limiter: &'a ConcurrencyLimiter,
}

impl<'a> ActiveGuard<'a> {
    fn enter(limiter: &'a ConcurrencyLimiter) -> Self {
        let now = limiter.active.fetch_add(1, Ordering::AcqRel) + 1;
        limiter.peak.fetch_max(now, Ordering::AcqRel);
        trace!(active = now, "permit acquired");
        Self { limiter }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let left = self.limiter.active.fetch_sub(1, Ordering::AcqRel) - 1;
        trace!(active = left, "permit released");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;

    fn limiter(max: usize) -> ConcurrencyLimiter {
        ConcurrencyLimiter::new(Limit::from(max))
    }

    #[test]
    fn limit_from_zero_is_unbounded() {
        assert_eq!(Limit::from(0), Limit::None);
        assert_eq!(Limit::from(4).max(), Some(4));
        assert_eq!(usize::from(Limit::from(4)), 4);
    }

    #[test]
    fn limit_deserializes_from_integer() {
        let limit: Limit = serde_json::from_str("3").unwrap();
        assert_eq!(limit.max(), Some(3));
        let limit: Limit = serde_json::from_str("0").unwrap();
        assert_eq!(limit, Limit::None);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_max_concurrency() {
        let limiter = limiter(3);

        let runs = (0..12u64).map(|i| {
            limiter.run(move || async move {
                tokio::time::sleep(Duration::from_millis(10 + i * 7 % 30)).await;
                i
            })
        });
        let results: Vec<u64> = join_all(runs)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(results, (0..12).collect::<Vec<_>>());
        assert_eq!(limiter.peak(), 3);
        assert_eq!(limiter.active(), 0);
        assert_eq!(limiter.available(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn permit_is_released_when_closure_fails() {
        let limiter = limiter(1);

        let first: Result<Result<(), &str>, _> = limiter.run(|| async { Err("boom") }).await;
        assert_eq!(first.unwrap(), Err("boom"));

        let second = limiter.run(|| async { 7 }).await.unwrap();
        assert_eq!(second, 7);
        assert_eq!(limiter.available(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_admitted_in_submission_order() {
        let limiter = limiter(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let runs = (0..5).map(|i| {
            let order = Arc::clone(&order);
            limiter.run(move || async move {
                order.lock().unwrap().push(i);
                tokio::time::sleep(Duration::from_millis(5)).await;
            })
        });
        join_all(runs).await;

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(limiter.peak(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_runs_everything_at_once() {
        let limiter = ConcurrencyLimiter::unbounded();

        let runs = (0..20).map(|_| {
            limiter.run(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
            })
        });
        join_all(runs).await;

        assert_eq!(limiter.peak(), 20);
        assert_eq!(limiter.available(), None);
    }

    #[tokio::test]
    async fn closed_limiter_rejects_callers() {
        let limiter = limiter(2);
        limiter.close();

        let err = limiter.run(|| async { 1 }).await.unwrap_err();
        assert_eq!(err, CoreError::LimiterClosed);

        let unbounded = ConcurrencyLimiter::unbounded();
        unbounded.close();
        assert!(unbounded.run(|| async {}).await.is_err());
    }
}
