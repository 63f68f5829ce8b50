use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use fanout_core::{ConcurrencyLimiter, RateWindow, TaskDispatcher, WindowReset};
use fanout_model::{FailureKind, Outcome, TaskIndex};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;

use crate::{BackendSimulator, Catalog, FailurePolicy, LatencyPolicy, Product};

fn catalog(count: usize) -> Arc<Catalog<Product>> {
    Arc::new(Catalog::products(count, &mut StdRng::seed_from_u64(42)))
}

fn limiter(max: usize) -> ConcurrencyLimiter {
    ConcurrencyLimiter::bounded(NonZeroUsize::new(max).unwrap())
}

/// A window long enough that no reset happens during a test run.
fn long_window(limit: u64) -> Arc<RateWindow> {
    Arc::new(RateWindow::new(limit, Duration::from_secs(3600)).unwrap())
}

#[tokio::test(start_paused = true)]
async fn generic_failures_land_on_their_own_positions() {
    let backend = BackendSimulator::new(catalog(10))
        .with_window(long_window(100))
        .with_failures(FailurePolicy::indices([3, 5]));

    let results = TaskDispatcher::new()
        .with_pre_delay(Duration::from_millis(200))
        .dispatch_all(10, &limiter(3), &backend)
        .await;

    assert_eq!(results.len(), 10);
    let summary = results.summary();
    assert_eq!(summary.fulfilled, 8);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.throttled, 0);

    for i in [3, 5] {
        match results.get(TaskIndex::new(i)) {
            Some(Outcome::Rejected { kind, .. }) => assert_eq!(*kind, FailureKind::Generic),
            other => panic!("task {i}: unexpected outcome {other:?}"),
        }
    }
    let names: Vec<&str> = results.values().map(|p| p.name.as_str()).collect();
    assert_eq!(names[0], "Product 1");
    assert_eq!(names[3], "Product 5");
}

#[tokio::test(start_paused = true)]
async fn admissions_past_quota_are_throttled() {
    let window = long_window(30);
    let backend = BackendSimulator::new(catalog(40))
        .with_window(Arc::clone(&window))
        .with_latency(LatencyPolicy::fixed(Duration::from_millis(300)));
    let limiter = limiter(10);

    let results = TaskDispatcher::new()
        .with_pre_delay(Duration::from_millis(200))
        .dispatch_all(40, &limiter, &backend)
        .await;

    let summary = results.summary();
    assert_eq!(summary.fulfilled, 30);
    assert_eq!(summary.throttled, 10);
    assert!(limiter.peak() <= 10);

    // fixed latency keeps admission order equal to index order
    let expected: Vec<TaskIndex> = (30..40).map(TaskIndex::new).collect();
    assert_eq!(results.throttled_indices(), expected);

    let snap = window.snapshot();
    assert_eq!(snap.admitted, 30);
    assert_eq!(snap.denied, 10);
}

#[tokio::test(start_paused = true)]
async fn random_latency_still_throttles_exactly_the_overflow() {
    let window = long_window(30);
    let backend = BackendSimulator::new(catalog(40)).with_window(Arc::clone(&window));

    let results = TaskDispatcher::new()
        .with_pre_delay(Duration::from_millis(200))
        .dispatch_all(40, &limiter(10), &backend)
        .await;

    assert_eq!(results.summary().fulfilled, 30);
    assert_eq!(results.summary().throttled, 10);
    assert_eq!(window.snapshot().denied, 10);
}

#[tokio::test(start_paused = true)]
async fn unbounded_burst_throttles_the_tail() {
    let backend = BackendSimulator::new(catalog(40)).with_window(Arc::new(
        RateWindow::new(30, Duration::from_secs(1)).unwrap(),
    ));

    let results = TaskDispatcher::new()
        .dispatch_all(40, &ConcurrencyLimiter::unbounded(), &backend)
        .await;

    let expected: Vec<TaskIndex> = (30..40).map(TaskIndex::new).collect();
    assert_eq!(results.throttled_indices(), expected);
}

#[tokio::test(start_paused = true)]
async fn limited_dispatch_spreads_load_across_windows() {
    let window = Arc::new(
        RateWindow::with_reset(30, Duration::from_secs(1), WindowReset::Interval).unwrap(),
    );
    let token = CancellationToken::new();
    let ticker = window.spawn_interval_reset(token.clone()).unwrap();

    let backend = BackendSimulator::new(catalog(40))
        .with_window(Arc::clone(&window))
        .with_latency(LatencyPolicy::fixed(Duration::from_millis(300)));

    let results = TaskDispatcher::new()
        .with_pre_delay(Duration::from_millis(200))
        .dispatch_all(40, &limiter(10), &backend)
        .await;

    token.cancel();
    ticker.await.unwrap();

    // waves hit the backend at 200/700/1200/1700 ms: never more than 20 per window
    assert_eq!(results.summary().fulfilled, 40);
    assert_eq!(window.snapshot().denied, 0);
}

#[tokio::test(start_paused = true)]
async fn single_permit_dispatch_is_live() {
    let backend = BackendSimulator::new(catalog(6)).with_window(long_window(100));
    let limiter = limiter(1);

    let results = TaskDispatcher::new()
        .dispatch_all(6, &limiter, &backend)
        .await;

    assert_eq!(results.summary().fulfilled, 6);
    assert_eq!(limiter.peak(), 1);
}

#[tokio::test(start_paused = true)]
async fn fail_fast_surfaces_the_first_failure() {
    let backend = BackendSimulator::new(catalog(10))
        .with_latency(LatencyPolicy::fixed(Duration::from_millis(500)))
        .with_failures(FailurePolicy::indices([3, 5]));

    let err = TaskDispatcher::new()
        .try_dispatch_all(10, &ConcurrencyLimiter::unbounded(), &backend)
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Generic);
    assert_eq!(err.message, "item 4 failed");
}
