//! negrisk - negative-risk arbitrage for multi-outcome prediction markets.
//!
//! In a market group where exactly one outcome resolves YES, buying the NO
//! side of `k` outcomes pays out at least `k - 1`. When the asks sum below
//! that payout the set is an arbitrage. The engine watches every outcome's
//! order book over a websocket feed (with REST as fallback) and runs two
//! strategies per group:
//!
//! - **taker**: buy every liquid outcome at once when the edge clears
//!   `min_edge` and the set fits the group budget
//! - **maker-taker**: rest bids priced so that any single fill completes a
//!   profitable set, then sweep the other outcomes at market
//!
//! # Modules
//!
//! - [`domain`] - Groups, books, quotes, opportunity math, price grid
//! - [`port`] - Traits for the feed, order books, orders and discovery
//! - [`adapter`] - Polymarket adapters, the paper order service and the CLI
//! - [`application`] - Quote cache, feed adapter, strategies, execution
//! - [`infrastructure`] - Configuration, wiring and the engine lifecycle
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `polymarket` - Live order placement through the Polymarket CLOB SDK.
//!   Without it, orders go to the paper order service.
//! - `testkit` - Mocks and builders for integration tests.

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
