//! Polymarket exchange configuration.

use serde::Deserialize;

/// Polymarket HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketHttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum attempts for transient failures and HTTP 429.
    #[serde(default = "default_http_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// First backoff delay in milliseconds; doubled on each retry.
    #[serde(default = "default_http_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Upper bound on any single backoff delay, including `Retry-After`.
    #[serde(default = "default_http_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Request pacing across all REST calls. `0` disables pacing.
    #[serde(default = "default_http_requests_per_second")]
    pub requests_per_second: u32,
}

const fn default_http_timeout_ms() -> u64 {
    5000
}

const fn default_http_connect_timeout_ms() -> u64 {
    2000
}

const fn default_http_retry_max_attempts() -> u32 {
    5
}

const fn default_http_retry_backoff_ms() -> u64 {
    500
}

const fn default_http_max_backoff_ms() -> u64 {
    10_000
}

const fn default_http_requests_per_second() -> u32 {
    5
}

impl Default for PolymarketHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_http_connect_timeout_ms(),
            retry_max_attempts: default_http_retry_max_attempts(),
            retry_backoff_ms: default_http_retry_backoff_ms(),
            max_backoff_ms: default_http_max_backoff_ms(),
            requests_per_second: default_http_requests_per_second(),
        }
    }
}

/// Polymarket exchange configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketConfig {
    /// WebSocket URL for market data.
    #[serde(default = "default_polymarket_ws_url")]
    pub ws_url: String,
    /// CLOB REST API URL (order execution, order book queries).
    #[serde(default = "default_polymarket_api_url")]
    pub api_url: String,
    /// Gamma REST API URL (event lookup by slug).
    #[serde(default = "default_polymarket_gamma_url")]
    pub gamma_api_url: String,
    /// Chain ID: 137 for Polygon mainnet, 80002 for Amoy testnet.
    #[serde(default = "default_polymarket_chain_id")]
    pub chain_id: u64,
    /// Seconds between text `PING` frames on the market socket.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// HTTP client configuration for REST API calls.
    #[serde(default)]
    pub http: PolymarketHttpConfig,
}

fn default_polymarket_ws_url() -> String {
    "wss://ws-subscriptions-clob.polymarket.com/ws/market".into()
}

fn default_polymarket_api_url() -> String {
    "https://clob.polymarket.com".into()
}

fn default_polymarket_gamma_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

const fn default_polymarket_chain_id() -> u64 {
    137
}

const fn default_heartbeat_interval_secs() -> u64 {
    30
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            ws_url: default_polymarket_ws_url(),
            api_url: default_polymarket_api_url(),
            gamma_api_url: default_polymarket_gamma_url(),
            chain_id: default_polymarket_chain_id(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            http: PolymarketHttpConfig::default(),
        }
    }
}

/// Runtime credentials and network settings required by the signing adapter.
#[derive(Clone)]
pub struct PolymarketRuntimeConfig {
    /// Wallet private key (hex, with or without 0x prefix).
    pub private_key: String,
    /// Chain ID for signature domain separation.
    pub chain_id: u64,
    /// CLOB API base URL.
    pub api_url: String,
}

impl std::fmt::Debug for PolymarketRuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolymarketRuntimeConfig")
            .field("private_key", &"<redacted>")
            .field("chain_id", &self.chain_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_mainnet() {
        let config = PolymarketConfig::default();
        assert_eq!(config.chain_id, 137);
        assert_eq!(config.heartbeat_interval_secs, 30);
        assert!(config.ws_url.starts_with("wss://"));
        assert_eq!(config.http.requests_per_second, 5);
    }

    #[test]
    fn partial_http_section_keeps_other_defaults() {
        let config: PolymarketConfig = toml::from_str(
            r#"
            chain_id = 80002
            [http]
            max_backoff_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.chain_id, 80002);
        assert_eq!(config.http.max_backoff_ms, 2000);
        assert_eq!(config.http.retry_backoff_ms, 500);
        assert_eq!(config.api_url, "https://clob.polymarket.com");
    }

    #[test]
    fn runtime_config_debug_hides_key() {
        let runtime = PolymarketRuntimeConfig {
            private_key: "deadbeef".into(),
            chain_id: 137,
            api_url: "https://clob.polymarket.com".into(),
        };
        let rendered = format!("{runtime:?}");
        assert!(!rendered.contains("deadbeef"));
    }
}
