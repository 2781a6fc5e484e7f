//! Polymarket exchange integration.
//!
//! - [`stream`]: market-channel WebSocket with local books
//! - [`client`]: CLOB order books and Gamma event discovery over REST
//! - [`executor`]: signed order placement (`polymarket` feature)

pub mod client;
pub mod dto;
#[cfg(feature = "polymarket")]
pub mod executor;
pub mod settings;
pub mod stream;

pub use client::PolymarketClient;
#[cfg(feature = "polymarket")]
pub use executor::PolymarketExecutor;
pub use settings::{PolymarketConfig, PolymarketHttpConfig, PolymarketRuntimeConfig};
pub use stream::PolymarketDataStream;
