use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use crate::{Backend, ConcurrencyLimiter, RateWindow, TaskDispatcher, TaskError};
use fanout_model::{FailureKind, Outcome, TaskIndex};

/// Deterministic backend: latency depends on the index only, so completion order differs
/// from submission order but is reproducible.
struct TableBackend {
    window: Arc<RateWindow>,
    failing: HashSet<usize>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl TableBackend {
    fn new(rate_limit: u64, failing: &[usize]) -> Self {
        Self {
            window: Arc::new(RateWindow::new(rate_limit, Duration::from_secs(3600)).unwrap()),
            failing: failing.iter().copied().collect(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Backend for TableBackend {
    type Value = String;

    fn name(&self) -> &'static str {
        "table"
    }

    async fn execute(&self, index: TaskIndex) -> Result<String, TaskError> {
        if !self.window.admit() {
            return Err(TaskError::throttled("429 Too Many Requests"));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let latency = 200 + (index.get() * 37) % 300;
        tokio::time::sleep(Duration::from_millis(latency as u64)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&index.get()) {
            return Err(TaskError::generic(format!("item {} failed", index.get() + 1)));
        }
        Ok(format!("item-{}", index.get()))
    }
}

fn limiter(max: usize) -> ConcurrencyLimiter {
    ConcurrencyLimiter::bounded(NonZeroUsize::new(max).unwrap())
}

#[tokio::test(start_paused = true)]
async fn result_set_is_complete_and_index_aligned() {
    for (task_count, max) in [(1, 1), (7, 3), (25, 4), (16, 16), (5, 9)] {
        let backend = TableBackend::new(1_000, &[]);
        let results = TaskDispatcher::new()
            .dispatch_all(task_count, &limiter(max), &backend)
            .await;

        assert_eq!(results.len(), task_count);
        for (i, outcome) in results.iter().enumerate() {
            assert_eq!(outcome.index(), TaskIndex::new(i));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn concurrency_never_exceeds_limit() {
    let backend = TableBackend::new(1_000, &[]);
    let limiter = limiter(4);
    TaskDispatcher::new()
        .with_pre_delay(Duration::from_millis(20))
        .dispatch_all(30, &limiter, &backend)
        .await;

    assert_eq!(limiter.peak(), 4);
    assert!(backend.peak_in_flight.load(Ordering::SeqCst) <= 4);
    assert_eq!(limiter.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn quota_overflow_is_throttled() {
    let backend = TableBackend::new(5, &[]);
    let results = TaskDispatcher::new()
        .dispatch_all(8, &limiter(2), &backend)
        .await;

    let summary = results.summary();
    assert_eq!(summary.fulfilled, 5);
    assert_eq!(summary.throttled, 3);
    assert_eq!(backend.window.snapshot().denied, 3);
}

#[tokio::test(start_paused = true)]
async fn generic_failure_is_not_throttled() {
    let backend = TableBackend::new(1_000, &[2]);
    let results = TaskDispatcher::new()
        .dispatch_all(4, &limiter(2), &backend)
        .await;

    match results.get(TaskIndex::new(2)) {
        Some(Outcome::Rejected { kind, message, .. }) => {
            assert_eq!(*kind, FailureKind::Generic);
            assert_eq!(message, "item 3 failed");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(results.summary().fulfilled, 3);
}

#[tokio::test(start_paused = true)]
async fn deterministic_backend_gives_identical_results() {
    let run = || async {
        let backend = TableBackend::new(6, &[1, 8]);
        TaskDispatcher::new()
            .with_pre_delay(Duration::from_millis(10))
            .dispatch_all(12, &limiter(3), &backend)
            .await
    };

    let first = run().await;
    let second = run().await;
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn single_permit_still_settles_everything() {
    let backend = TableBackend::new(1_000, &[0]);
    let limiter = limiter(1);
    let results = TaskDispatcher::new()
        .dispatch_all(10, &limiter, &backend)
        .await;

    assert_eq!(results.len(), 10);
    assert_eq!(results.summary().fulfilled, 9);
    assert_eq!(limiter.peak(), 1);
}
