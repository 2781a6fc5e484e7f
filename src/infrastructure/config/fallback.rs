//! REST fallback polling configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::fallback::FallbackSettings;

/// `[fallback]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    /// Stale sweep period while the feed is healthy.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Age after which an outcome is re-fetched.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,

    /// Full sweep period while the feed is degraded.
    #[serde(default = "default_degraded_interval_ms")]
    pub degraded_interval_ms: u64,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

const fn default_interval_ms() -> u64 {
    5_000
}

const fn default_stale_after_ms() -> u64 {
    5_000
}

const fn default_degraded_interval_ms() -> u64 {
    500
}

const fn default_max_concurrency() -> usize {
    10
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}

impl FallbackConfig {
    #[must_use]
    pub const fn to_settings(&self) -> FallbackSettings {
        FallbackSettings {
            interval: Duration::from_millis(self.interval_ms),
            stale_after: Duration::from_millis(self.stale_after_ms),
            degraded_interval: Duration::from_millis(self.degraded_interval_ms),
            max_concurrency: self.max_concurrency,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stale_after_ms: default_stale_after_ms(),
            degraded_interval_ms: default_degraded_interval_ms(),
            max_concurrency: default_max_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_carry_configured_cadence() {
        let config: FallbackConfig =
            toml::from_str("degraded_interval_ms = 250\nmax_concurrency = 4").unwrap();
        let settings = config.to_settings();
        assert_eq!(settings.degraded_interval, Duration::from_millis(250));
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(settings.interval, Duration::from_secs(5));
    }
}
