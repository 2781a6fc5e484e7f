//! Exchange component factory.
//!
//! Provides [`ExchangeFactory`] for creating the Polymarket adapters from
//! runtime configuration: the streaming feed, the REST client (order books
//! and market discovery) and the order service.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::adapter::outbound::paper::PaperOrderService;
use crate::adapter::outbound::polymarket::client::PolymarketClient;
#[cfg(feature = "polymarket")]
use crate::adapter::outbound::polymarket::executor::PolymarketExecutor;
use crate::adapter::outbound::polymarket::stream::PolymarketDataStream;
#[cfg(feature = "polymarket")]
use crate::error::ConfigError;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{MarketDataStream, OrderService};

/// Factory for creating exchange-specific components.
///
/// All factory methods are static; no instance state is required.
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Create the raw market data stream. Reconnection is layered on by the
    /// engine.
    #[must_use]
    pub fn create_data_stream(config: &Config) -> Box<dyn MarketDataStream> {
        let exchange = &config.exchange;
        Box::new(PolymarketDataStream::new(
            exchange.ws_url.clone(),
            Duration::from_secs(exchange.heartbeat_interval_secs),
        ))
    }

    /// Create the REST client used for order books and slug resolution.
    #[must_use]
    pub fn create_client(config: &Config) -> Arc<PolymarketClient> {
        Arc::new(PolymarketClient::from_config(&config.exchange))
    }

    /// Create the order service.
    ///
    /// Dry runs always get the paper service.
    ///
    /// # Errors
    ///
    /// Returns an error if live trading is requested without a usable
    /// `WALLET_PRIVATE_KEY` or if authentication fails.
    pub async fn create_order_service(config: &Config) -> Result<Arc<dyn OrderService>> {
        if config.dry_run {
            info!("Dry run: orders are logged, not sent");
            return Ok(Arc::new(PaperOrderService::new()));
        }
        Self::create_live_order_service(config).await
    }

    #[cfg(feature = "polymarket")]
    async fn create_live_order_service(config: &Config) -> Result<Arc<dyn OrderService>> {
        let runtime = config.runtime_config().ok_or(ConfigError::MissingField {
            field: "WALLET_PRIVATE_KEY",
        })?;
        let executor = PolymarketExecutor::new(&runtime).await?;
        Ok(Arc::new(executor))
    }

    #[cfg(not(feature = "polymarket"))]
    async fn create_live_order_service(_config: &Config) -> Result<Arc<dyn OrderService>> {
        tracing::warn!("Built without the `polymarket` feature, using paper orders");
        Ok(Arc::new(PaperOrderService::new()))
    }
}
