//! Exchange-agnostic domain types.
//!
//! Everything here is pure: no I/O, no clocks beyond values passed in, no
//! shared state.

pub mod book;
pub mod error;
pub mod group;
pub mod id;
pub mod money;
pub mod opportunity;
pub mod pricing;
pub mod quote;
pub mod resting;

pub use book::{Book, BookSide, PriceLevel};
pub use error::DomainError;
pub use group::MarketGroup;
pub use id::{OrderId, TokenId};
pub use money::{Price, Volume};
pub use opportunity::{ArbitrageOpportunity, Decision, Economics, OpportunityLeg};
pub use quote::{OutcomeQuote, QuoteSource};
pub use resting::{BidAction, BidState, RestingBid};
