//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`stream`]: Mock [`MarketDataStream`](crate::port::MarketDataStream)
//!   implementations: `ScriptedStream`, `ChannelStream`.
//! - [`exchange`]: Recording order service, scripted book source, static
//!   market resolver.
//! - [`domain`]: Builders for tokens, groups, quotes, books and events.

pub mod domain;
pub mod exchange;
pub mod stream;
