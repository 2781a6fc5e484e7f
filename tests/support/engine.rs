use std::sync::Arc;
use std::time::{Duration, Instant};

use negrisk::application::snapshot::EngineView;
use negrisk::error::Result;
use negrisk::infrastructure::bootstrap::build_groups;
use negrisk::infrastructure::config::settings::Config;
use negrisk::infrastructure::orchestration::{Engine, EnginePorts};
use negrisk::port::{OrderBookSource, OrderService};
use negrisk::testkit::exchange::{MockBookSource, MockOrderService, StaticResolver};
use negrisk::testkit::stream::{channel_stream, ChannelStreamHandle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Knobs for the fast-cadence test configuration.
pub struct TestConfig {
    pub outcomes: Vec<&'static str>,
    pub taker: bool,
    pub maker_taker: bool,
    pub poll_interval_ms: u64,
    pub fallback_interval_ms: u64,
    pub stale_after_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            outcomes: vec!["a", "b", "c"],
            taker: true,
            maker_taker: false,
            // Long enough that only feed signals drive the taker.
            poll_interval_ms: 60_000,
            fallback_interval_ms: 60_000,
            stale_after_ms: 60_000,
        }
    }
}

impl TestConfig {
    pub fn build(&self) -> Config {
        let outcomes = self
            .outcomes
            .iter()
            .map(|o| format!("\"{o}\""))
            .collect::<Vec<_>>()
            .join(", ");

        let toml = format!(
            r#"
            dry_run = true
            max_spend = 10
            status_interval_secs = 60

            [[markets]]
            name = "election"
            outcomes = [{outcomes}]

            [strategies.taker]
            enabled = {taker}
            poll_interval_ms = {poll}

            [strategies.maker_taker]
            enabled = {maker}
            poll_interval_ms = {poll}
            order_size = 5

            [execution]
            shutdown_timeout_secs = 2

            [fallback]
            interval_ms = {fallback}
            stale_after_ms = {stale}
            degraded_interval_ms = 50
            request_timeout_ms = 500

            [reconnection]
            initial_delay_ms = 10
            max_delay_ms = 40
            backoff_multiplier = 2.0
            max_consecutive_failures = 3
            circuit_breaker_cooldown_ms = 50
            "#,
            taker = self.taker,
            maker = self.maker_taker,
            poll = self.poll_interval_ms,
            fallback = self.fallback_interval_ms,
            stale = self.stale_after_ms,
        );

        Config::parse_toml(&toml).expect("valid test config")
    }
}

/// A running engine wired to in-memory ports.
pub struct EngineHarness {
    pub stream: ChannelStreamHandle,
    pub books: Arc<MockBookSource>,
    pub orders: Arc<MockOrderService>,
    pub view: EngineView,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl EngineHarness {
    /// Start an engine; `prepare` runs against the stream handle before the
    /// engine first connects.
    pub async fn start(
        config: Config,
        books: MockBookSource,
        orders: MockOrderService,
        prepare: impl FnOnce(&ChannelStreamHandle),
    ) -> Self {
        let groups = build_groups(&config, &StaticResolver::new())
            .await
            .expect("groups build");
        let (stream, handle) = channel_stream(64);
        prepare(&handle);

        let books = Arc::new(books);
        let orders = Arc::new(orders);
        let engine = Engine::new(
            config,
            groups,
            EnginePorts {
                stream: Box::new(stream),
                books: Arc::clone(&books) as Arc<dyn OrderBookSource>,
                orders: Arc::clone(&orders) as Arc<dyn OrderService>,
            },
        );
        let view = engine.view();

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(engine.run_with_shutdown(rx));

        Self {
            stream: handle,
            books,
            orders,
            view,
            shutdown,
            task,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal shutdown and wait for the engine to return.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("engine stops within timeout")
            .expect("engine task does not panic")
    }
}

/// Poll `check` every 10ms until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
