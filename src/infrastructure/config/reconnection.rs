//! `[reconnection]`: backoff and circuit breaker for the market feed.

use std::time::Duration;

use serde::Deserialize;

/// Feed reconnection policy.
///
/// Delays grow by `backoff_multiplier` from `initial_delay_ms` up to
/// `max_delay_ms`. After `max_consecutive_failures` failed attempts the
/// breaker opens for `circuit_breaker_cooldown_ms` and the feed counts as
/// degraded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectionConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_consecutive_failures: u32,
    pub circuit_breaker_cooldown_ms: u64,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            max_consecutive_failures: 5,
            circuit_breaker_cooldown_ms: 300_000,
        }
    }
}

impl ReconnectionConfig {
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    #[must_use]
    pub const fn circuit_breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_cooldown_ms)
    }
}
