//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; the signing key only ever comes
//! from the `WALLET_PRIVATE_KEY` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use negrisk::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::execution::ExecutionConfig;
use super::fallback::FallbackConfig;
use super::logging::LoggingConfig;
use super::market::MarketConfig;
use super::reconnection::ReconnectionConfig;
use super::strategy::StrategiesConfig;
use crate::adapter::outbound::polymarket::settings::{PolymarketConfig, PolymarketRuntimeConfig};
use crate::application::feed::FeedSettings;
use crate::error::{ConfigError, Result};

/// Signing material loaded from the environment.
#[derive(Clone, Default)]
pub struct WalletConfig {
    pub private_key: Option<String>,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Log orders instead of sending them. Defaults to false.
    #[serde(default)]
    pub dry_run: bool,

    /// Budget for groups that carry none of their own (USDC per set).
    #[serde(default = "default_max_spend")]
    pub max_spend: Decimal,

    /// Period of the status line.
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Exchange endpoints and HTTP behaviour.
    #[serde(default, alias = "polymarket")]
    pub exchange: PolymarketConfig,

    /// Market groups to trade.
    #[serde(default)]
    pub markets: Vec<MarketConfig>,

    #[serde(default)]
    pub strategies: StrategiesConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,

    /// WebSocket reconnection settings.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    #[serde(skip)]
    pub wallet: WalletConfig,
}

fn default_max_spend() -> Decimal {
    Decimal::TEN
}

const fn default_status_interval_secs() -> u64 {
    30
}

fn invalid(field: &'static str, reason: impl Into<String>) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
    .into()
}

impl Config {
    /// Parse configuration from a TOML string.
    ///
    /// Reads the private key from `WALLET_PRIVATE_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Never from the config file.
        config.wallet.private_key = std::env::var("WALLET_PRIVATE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// Every violation is fatal at startup.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        self.validate_exchange()?;
        self.validate_markets()?;
        self.validate_strategies()?;
        self.validate_runtime()?;
        self.validate_reconnection()
    }

    #[allow(clippy::result_large_err)]
    fn validate_exchange(&self) -> Result<()> {
        let exchange = &self.exchange;
        if exchange.ws_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "ws_url" }.into());
        }
        if exchange.api_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "api_url" }.into());
        }
        if exchange.gamma_api_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "gamma_api_url",
            }
            .into());
        }
        if exchange.heartbeat_interval_secs == 0 {
            return Err(invalid("heartbeat_interval_secs", "must be greater than 0"));
        }
        if exchange.http.requests_per_second == 0 {
            return Err(invalid("requests_per_second", "must be greater than 0"));
        }
        if exchange.http.retry_max_attempts == 0 {
            return Err(invalid("retry_max_attempts", "must be greater than 0"));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_markets(&self) -> Result<()> {
        if self.markets.is_empty() {
            return Err(ConfigError::MissingField { field: "markets" }.into());
        }

        let mut names = HashSet::new();
        let mut tokens = HashSet::new();
        for market in &self.markets {
            if market.name.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "markets.name",
                }
                .into());
            }
            if !names.insert(market.name.as_str()) {
                return Err(invalid(
                    "markets.name",
                    format!("'{}' is configured twice", market.name),
                ));
            }

            let has_slug = market.slug.as_deref().is_some_and(|s| !s.trim().is_empty());
            if market.outcomes.is_empty() && !has_slug {
                return Err(invalid(
                    "markets.outcomes",
                    format!("'{}' needs a slug or at least two outcomes", market.name),
                ));
            }
            if !market.outcomes.is_empty() && market.outcomes.len() < 2 {
                return Err(invalid(
                    "markets.outcomes",
                    format!("'{}' needs at least two outcomes", market.name),
                ));
            }
            for token in &market.outcomes {
                if token.trim().is_empty() {
                    return Err(invalid(
                        "markets.outcomes",
                        format!("'{}' lists an empty token id", market.name),
                    ));
                }
                if !tokens.insert(token.as_str()) {
                    return Err(invalid(
                        "markets.outcomes",
                        format!("token {token} appears more than once"),
                    ));
                }
            }

            let budget = market.budget.unwrap_or(self.max_spend);
            if budget <= Decimal::ZERO {
                return Err(invalid(
                    "markets.budget",
                    format!("'{}' has no positive budget (max_spend or budget)", market.name),
                ));
            }
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_strategies(&self) -> Result<()> {
        let taker = &self.strategies.taker;
        let maker = &self.strategies.maker_taker;

        if self.strategies.enabled().is_empty() {
            return Err(invalid("strategies", "at least one strategy must be enabled"));
        }
        if taker.min_edge < Decimal::ZERO {
            return Err(invalid("min_edge", "must be 0 or greater"));
        }
        if maker.extra_edge < Decimal::ZERO {
            return Err(invalid("extra_edge", "must be 0 or greater"));
        }
        if taker.poll_interval_ms == 0 || maker.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "must be greater than 0"));
        }
        if taker.order_size <= Decimal::ZERO || maker.order_size <= Decimal::ZERO {
            return Err(invalid("order_size", "must be greater than 0"));
        }
        if taker.signal_capacity == 0 {
            return Err(invalid("signal_capacity", "must be greater than 0"));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_runtime(&self) -> Result<()> {
        let execution = &self.execution;
        if execution.tick_size <= Decimal::ZERO || execution.tick_size >= Decimal::ONE {
            return Err(invalid("tick_size", "must be between 0 and 1 (exclusive)"));
        }
        if execution.price_nudge < Decimal::ZERO {
            return Err(invalid("price_nudge", "must be 0 or greater"));
        }
        if execution.min_order_notional < Decimal::ZERO {
            return Err(invalid("min_order_notional", "must be 0 or greater"));
        }

        let fallback = &self.fallback;
        if fallback.interval_ms == 0
            || fallback.stale_after_ms == 0
            || fallback.degraded_interval_ms == 0
            || fallback.request_timeout_ms == 0
        {
            return Err(invalid("fallback", "intervals and timeout must be greater than 0"));
        }
        if fallback.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be greater than 0"));
        }
        if self.status_interval_secs == 0 {
            return Err(invalid("status_interval_secs", "must be greater than 0"));
        }
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_reconnection(&self) -> Result<()> {
        let reconnection = &self.reconnection;
        if reconnection.initial_delay_ms == 0 {
            return Err(invalid("initial_delay_ms", "must be greater than 0"));
        }
        if reconnection.max_delay_ms < reconnection.initial_delay_ms {
            return Err(invalid("max_delay_ms", "must be >= initial_delay_ms"));
        }
        if reconnection.backoff_multiplier < 1.0 {
            return Err(invalid("backoff_multiplier", "must be >= 1.0"));
        }
        if reconnection.max_consecutive_failures == 0 {
            return Err(invalid("max_consecutive_failures", "must be greater than 0"));
        }
        if reconnection.circuit_breaker_cooldown_ms == 0 {
            return Err(invalid("circuit_breaker_cooldown_ms", "must be greater than 0"));
        }
        Ok(())
    }

    /// Thresholds for the feed's inline pre-check.
    #[must_use]
    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            min_edge: self.strategies.taker.min_edge,
            default_budget: self.max_spend,
            quote_max_age: self.execution.quote_max_age(),
        }
    }

    #[must_use]
    pub const fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    /// Signing settings for the live order service, if a key is present.
    #[must_use]
    pub fn runtime_config(&self) -> Option<PolymarketRuntimeConfig> {
        self.wallet
            .private_key
            .as_ref()
            .map(|key| PolymarketRuntimeConfig {
                private_key: key.clone(),
                chain_id: self.exchange.chain_id,
                api_url: self.exchange.api_url.clone(),
            })
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
