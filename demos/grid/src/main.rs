mod render;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use fanout_core::{ConcurrencyLimiter, DispatchConfig, Subscribe, TaskDispatcher, WindowReset};
use fanout_exec::{
    BackendSimulator, Catalog, FailurePolicy, LatencyPolicy, Product, SimulatorConfig,
};
use fanout_observe::{LogSubscriber, LoggerConfig, logger_init};

const COLUMNS: usize = 8;

/// The five load patterns of the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    /// Every request succeeds, joined fail-fast.
    AllSuccess,
    /// Some requests fail, joined fail-fast: one failure discards the whole batch.
    FailFast,
    /// Some requests fail, joined settle-all.
    Settled,
    /// No concurrency limit: the burst overruns the rate window.
    NoLimit,
    /// Concurrency limit plus pre-dispatch delay spread the load.
    Limited,
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all-success" => Ok(Scenario::AllSuccess),
            "fail-fast" => Ok(Scenario::FailFast),
            "settled" => Ok(Scenario::Settled),
            "no-limit" => Ok(Scenario::NoLimit),
            "limited" => Ok(Scenario::Limited),
            other => bail!(
                "unknown scenario {other:?} (expected: all-success|fail-fast|settled|no-limit|limited)"
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DemoConfig {
    logger: LoggerConfig,
    dispatch: DispatchConfig,
    /// Backend used by the throttled scenarios.
    backend: SimulatorConfig,
    /// Indices failing in the fail-fast and settled scenarios.
    failing: FailurePolicy,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            logger: LoggerConfig::default(),
            dispatch: DispatchConfig::default(),
            backend: SimulatorConfig::default(),
            failing: FailurePolicy::indices([3, 5]),
        }
    }
}

impl DemoConfig {
    fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let scenario = match args.first() {
        Some(s) => s.parse()?,
        None => Scenario::Limited,
    };
    let cfg = DemoConfig::load(args.get(1).map(String::as_str))?;

    // 1) Logger
    let logger = cfg.logger.clone().with_env()?;
    logger_init(&logger)?;

    // 2) Config
    cfg.dispatch.validate()?;
    info!(?scenario, task_count = cfg.dispatch.task_count, "starting");

    // 3) Ctrl+C cancels tasks that have not reached the backend yet
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling pending tasks");
            on_signal.cancel();
        }
    });

    let catalog = Arc::new(Catalog::products(
        cfg.dispatch.task_count,
        &mut rand::thread_rng(),
    ));

    match scenario {
        Scenario::AllSuccess | Scenario::FailFast => fail_fast(scenario, &cfg, catalog, token).await,
        Scenario::Settled => settled(&cfg, catalog, token).await,
        Scenario::NoLimit | Scenario::Limited => throttled(scenario, &cfg, catalog, token).await,
    }
}

/// Both fail-fast scenarios hit an unthrottled backend with a flat 500 ms latency.
fn plain_backend(
    scenario: Scenario,
    cfg: &DemoConfig,
    catalog: Arc<Catalog<Product>>,
) -> BackendSimulator<Product> {
    let backend = BackendSimulator::new(catalog)
        .with_latency(LatencyPolicy::fixed(Duration::from_millis(500)));
    match scenario {
        Scenario::AllSuccess => backend,
        _ => backend.with_failures(cfg.failing.clone()),
    }
}

async fn fail_fast(
    scenario: Scenario,
    cfg: &DemoConfig,
    catalog: Arc<Catalog<Product>>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let backend = plain_backend(scenario, cfg, catalog);
    let limiter = ConcurrencyLimiter::unbounded();
    let dispatcher = TaskDispatcher::new().with_cancellation(token);

    match dispatcher
        .try_dispatch_all(cfg.dispatch.task_count, &limiter, &backend)
        .await
    {
        Ok(products) => println!("{}", render::products_grid(&products, COLUMNS)),
        Err(e) => {
            error!(error = %e, "batch failed; nothing to show");
            println!("{}", render::skeleton_grid(cfg.dispatch.task_count, COLUMNS));
        }
    }
    Ok(())
}

async fn settled(
    cfg: &DemoConfig,
    catalog: Arc<Catalog<Product>>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let backend = plain_backend(Scenario::Settled, cfg, catalog);
    let limiter = ConcurrencyLimiter::unbounded();
    let dispatcher = TaskDispatcher::new().with_cancellation(token);

    let results = dispatcher
        .dispatch_all(cfg.dispatch.task_count, &limiter, &backend)
        .await;
    let cells: Vec<String> = results
        .iter()
        .map(|o| match o.value() {
            Some(_) => render::cell(o),
            None => render::skeleton(),
        })
        .collect();
    for row in cells.chunks(COLUMNS) {
        println!("{}", row.join(" "));
    }
    Ok(())
}

async fn throttled(
    scenario: Scenario,
    cfg: &DemoConfig,
    catalog: Arc<Catalog<Product>>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let window = cfg.dispatch.rate_window()?;
    let ticker = match cfg.dispatch.window_reset {
        WindowReset::Interval => Some(window.spawn_interval_reset(token.child_token())?),
        WindowReset::Lazy => None,
    };

    let backend = BackendSimulator::from_config(catalog, &cfg.backend).with_window(Arc::clone(&window));
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogSubscriber)];

    let (limiter, dispatcher) = match scenario {
        Scenario::NoLimit => (
            ConcurrencyLimiter::unbounded(),
            TaskDispatcher::new(),
        ),
        _ => (cfg.dispatch.limiter(), cfg.dispatch.dispatcher()),
    };
    let dispatcher = dispatcher
        .with_cancellation(token.clone())
        .with_subscribers(subscribers);

    let mut results = dispatcher
        .dispatch_all(cfg.dispatch.task_count, &limiter, &backend)
        .await;
    if let Some(policy) = &cfg.dispatch.retry {
        results = dispatcher
            .redispatch_throttled(results, policy, &limiter, &backend)
            .await;
    }

    if let Some(ticker) = ticker {
        token.cancel();
        ticker.await.context("interval reset task")?;
    }

    println!("{}", render::grid(&results, COLUMNS));
    let summary = results.summary();
    let snap = window.snapshot();
    info!(
        fulfilled = summary.fulfilled,
        throttled = summary.throttled,
        failed = summary.failed,
        cancelled = summary.cancelled,
        admitted = snap.admitted,
        denied = snap.denied,
        peak_concurrency = limiter.peak(),
        "done"
    );
    Ok(())
}
