//! Order pricing and shutdown configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::execution::ExecutionSettings;

/// `[execution]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Fraction added to the ask for taker legs.
    #[serde(default = "default_price_nudge")]
    pub price_nudge: Decimal,

    /// Price grid used until the feed reports a token's tick.
    #[serde(default = "default_tick_size")]
    pub tick_size: Decimal,

    /// Smallest order notional the exchange accepts (USDC).
    #[serde(default = "default_min_order_notional")]
    pub min_order_notional: Decimal,

    /// Quotes older than this are not trusted; `0` disables the bound.
    #[serde(default = "default_quote_max_age_ms")]
    pub quote_max_age_ms: u64,

    /// How long shutdown waits for in-flight executions.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_price_nudge() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_tick_size() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_min_order_notional() -> Decimal {
    Decimal::ONE
}

const fn default_quote_max_age_ms() -> u64 {
    30_000
}

const fn default_shutdown_timeout_secs() -> u64 {
    10
}

impl ExecutionConfig {
    #[must_use]
    pub fn to_settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            price_nudge: self.price_nudge,
            default_tick: self.tick_size,
        }
    }

    #[must_use]
    pub const fn quote_max_age(&self) -> Duration {
        Duration::from_millis(self.quote_max_age_ms)
    }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            price_nudge: default_price_nudge(),
            tick_size: default_tick_size(),
            min_order_notional: default_min_order_notional(),
            quote_max_age_ms: default_quote_max_age_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_exchange_grid() {
        let config = ExecutionConfig::default();
        let settings = config.to_settings();
        assert_eq!(settings.price_nudge, dec!(0.01));
        assert_eq!(settings.default_tick, dec!(0.01));
        assert_eq!(config.min_order_notional, dec!(1));
        assert_eq!(config.quote_max_age(), Duration::from_secs(30));
    }

    #[test]
    fn zero_age_disables_the_bound() {
        let config: ExecutionConfig = toml::from_str("quote_max_age_ms = 0").unwrap();
        assert_eq!(config.quote_max_age(), Duration::ZERO);
    }
}
