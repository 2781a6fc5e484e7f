//! Crate error types.
//!
//! [`ConfigError`] covers everything that can go wrong before the engine
//! starts and is always fatal. [`ExecutionError`] covers order placement and
//! is logged per leg. Transport failures convert into [`Error`] through `?`.

use std::time::Duration;

use thiserror::Error;

use crate::domain::error::DomainError;

/// Startup errors from loading, validating or resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("market group '{group}' could not be resolved: {reason}")]
    UnresolvedGroup { group: String, reason: String },
}

/// Order lifecycle failures reported by an order service.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("exchange authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid token ID '{token_id}': {reason}")]
    InvalidTokenId { token_id: String, reason: String },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("order could not be built: {0}")]
    OrderBuildFailed(String),

    #[error("order could not be signed: {0}")]
    SigningFailed(String),

    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    #[error("status of order {order_id} unavailable: {reason}")]
    StatusUnavailable { order_id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("rate limited after {attempts} attempts (last delay {last_delay:?})")]
    RateLimited { attempts: u32, last_delay: Duration },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("unexpected response: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
