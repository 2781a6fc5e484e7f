//! Engine composition root.
//!
//! [`Engine`] owns every long-running task: the market data listener, the
//! REST fallback poller, one loop per enabled strategy and market group, and
//! the status line. Build it with [`Engine::from_config`] for production or
//! [`Engine::new`] with injected ports.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::feed::run_feed;
use super::status::{log_status, run_status};
use crate::application::cache::QuoteCache;
use crate::application::execution::{ActiveExecutions, ExecutionCoordinator};
use crate::application::fallback::{FallbackPoller, FeedHealth};
use crate::application::feed::{FeedAdapter, GroupSignal};
use crate::application::lifecycle::wait_for_shutdown;
use crate::application::metrics::EngineMetrics;
use crate::application::snapshot::EngineView;
use crate::application::strategy::{
    MakerTakerStrategy, RestingBids, StrategyContext, TakerStrategy,
};
use crate::domain::group::MarketGroup;
use crate::error::Result;
use crate::infrastructure::bootstrap::build_groups;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::exchange::{ExchangeFactory, ReconnectingDataStream};
use crate::port::{MarketDataStream, OrderBookSource, OrderService};

/// External collaborators the engine talks to.
pub struct EnginePorts {
    /// Raw streaming feed; reconnection is added by the engine.
    pub stream: Box<dyn MarketDataStream>,
    pub books: Arc<dyn OrderBookSource>,
    pub orders: Arc<dyn OrderService>,
}

/// A fully wired engine, ready to run.
pub struct Engine {
    config: Config,
    groups: Vec<MarketGroup>,
    stream: ReconnectingDataStream<Box<dyn MarketDataStream>>,
    feed: Arc<FeedAdapter>,
    signals: HashMap<String, mpsc::Receiver<GroupSignal>>,
    ctx: StrategyContext,
    bids: Arc<RestingBids>,
    view: EngineView,
}

impl Engine {
    /// Build the production engine: resolve groups over REST, authenticate
    /// the order service and create the websocket feed.
    ///
    /// # Errors
    ///
    /// Returns an error if a group cannot be resolved or the order service
    /// cannot be created.
    pub async fn from_config(config: Config) -> Result<Self> {
        let client = ExchangeFactory::create_client(&config);
        let groups = build_groups(&config, client.as_ref()).await?;
        let orders = ExchangeFactory::create_order_service(&config).await?;
        let stream = ExchangeFactory::create_data_stream(&config);

        Ok(Self::new(
            config,
            groups,
            EnginePorts {
                stream,
                books: client,
                orders,
            },
        ))
    }

    /// Wire the engine around already-built groups and ports.
    #[must_use]
    pub fn new(config: Config, groups: Vec<MarketGroup>, ports: EnginePorts) -> Self {
        let cache = Arc::new(QuoteCache::new());
        let metrics = Arc::new(EngineMetrics::new());
        let active = Arc::new(ActiveExecutions::new());
        let bids = Arc::new(RestingBids::new());
        let health = FeedHealth::default();

        let mut feed = FeedAdapter::new(
            groups.clone(),
            Arc::clone(&cache),
            Arc::clone(&metrics),
            config.feed_settings(),
        );
        let mut signals = HashMap::new();
        if config.strategies.taker.enabled {
            for group in &groups {
                if let Some(rx) = feed.subscribe(group.name(), config.strategies.taker.signal_capacity)
                {
                    signals.insert(group.name().to_string(), rx);
                }
            }
        }
        let feed = Arc::new(feed);

        let poller = Arc::new(FallbackPoller::new(
            ports.books,
            Arc::clone(&feed),
            health.clone(),
            Arc::clone(&metrics),
            config.fallback.to_settings(),
        ));
        let coordinator = Arc::new(ExecutionCoordinator::new(
            ports.orders,
            Arc::clone(&active),
            Arc::clone(&cache),
            Arc::clone(&metrics),
            config.execution.to_settings(),
        ));

        let stream =
            ReconnectingDataStream::new(ports.stream, config.reconnection.clone(), health.clone());

        let view = EngineView::new(
            groups
                .iter()
                .map(|g| (g.clone(), g.effective_budget(config.max_spend)))
                .collect(),
            Arc::clone(&cache),
            Arc::clone(&bids),
            Arc::clone(&metrics),
            health,
            active,
        );

        let ctx = StrategyContext {
            cache,
            poller,
            coordinator,
            metrics,
            quote_max_age: config.execution.quote_max_age(),
        };

        Self {
            config,
            groups,
            stream,
            feed,
            signals,
            ctx,
            bids,
            view,
        }
    }

    /// Read-only handle on engine state; stays valid while the engine runs.
    #[must_use]
    pub fn view(&self) -> EngineView {
        self.view.clone()
    }

    #[must_use]
    pub fn groups(&self) -> &[MarketGroup] {
        &self.groups
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    ///
    /// On shutdown every loop is stopped, resting bids are cancelled and
    /// in-flight executions get `shutdown_timeout_secs` to finish.
    ///
    /// # Errors
    ///
    /// Currently infallible once built; steady-state failures are logged.
    pub async fn run_with_shutdown(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let Self {
            config,
            groups,
            stream,
            feed,
            mut signals,
            ctx,
            bids,
            view,
        } = self;

        info!(
            groups = groups.len(),
            dry_run = config.dry_run,
            strategies = ?config.strategies.enabled(),
            "Starting negrisk"
        );

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        tasks.push(tokio::spawn(run_feed(
            stream,
            feed.token_ids(),
            Arc::clone(&feed),
            shutdown.clone(),
        )));
        tasks.push(tokio::spawn(Arc::clone(&ctx.poller).run(shutdown.clone())));

        for group in groups {
            let budget = group.effective_budget(config.max_spend);

            if config.strategies.maker_taker.enabled {
                let strategy = MakerTakerStrategy::new(
                    group.clone(),
                    budget,
                    config.strategies.maker_taker.clone(),
                    config.execution.tick_size,
                    config.execution.min_order_notional,
                    ctx.clone(),
                    Arc::clone(&bids),
                );
                tasks.push(tokio::spawn(strategy.run(shutdown.clone())));
            }

            if let Some(rx) = signals.remove(group.name()) {
                let strategy = TakerStrategy::new(
                    group,
                    budget,
                    config.strategies.taker.clone(),
                    config.execution.min_order_notional,
                    ctx.clone(),
                );
                tasks.push(tokio::spawn(strategy.run(rx, shutdown.clone())));
            }
        }

        tasks.push(tokio::spawn(run_status(
            view.clone(),
            config.status_interval(),
            shutdown.clone(),
        )));

        wait_for_shutdown(&mut shutdown).await;
        info!("Shutdown signal received, stopping");

        let coordinator = Arc::clone(&ctx.coordinator);
        let drain = async move {
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Task ended abnormally");
                }
            }
            coordinator.wait_idle().await;
        };
        if tokio::time::timeout(config.execution.shutdown_timeout(), drain)
            .await
            .is_err()
        {
            warn!(
                in_flight = ctx.coordinator.in_flight(),
                "Shutdown timed out with work still in flight"
            );
        }

        log_status(&view, "Final status");
        info!("negrisk stopped");
        Ok(())
    }
}
