//! Per-group evaluation loops.
//!
//! - [`taker`]: buy every liquid outcome when the set's asks sum below the
//!   guaranteed payout.
//! - [`maker_taker`]: rest bids on every outcome and sweep the others when
//!   one fills.
//!
//! Both run one independent loop per market group and share the quote cache,
//! the execution coordinator and the per-group active flags through
//! [`context::StrategyContext`].

pub mod bids;
pub mod context;
pub mod maker_taker;
pub mod taker;

pub use bids::RestingBids;
pub use context::StrategyContext;
pub use maker_taker::{MakerTakerConfig, MakerTakerStrategy};
pub use taker::{TakerConfig, TakerStrategy};
