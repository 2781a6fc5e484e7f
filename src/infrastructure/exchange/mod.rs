//! Exchange wiring.
//!
//! - [`factory`]: builds the exchange adapters from configuration
//! - [`reconnecting`]: reconnect, resubscribe and health reporting around any
//!   [`crate::port::MarketDataStream`]

pub mod factory;
pub mod reconnecting;

pub use factory::ExchangeFactory;
pub use reconnecting::ReconnectingDataStream;
