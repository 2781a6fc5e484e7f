//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │  Application (engine)    │
//!                 │  Domain + Port           │
//!                 └────────────┬─────────────┘
//!          ┌───────────┬───────┴──────┬──────────────┐
//!          ▼           ▼              ▼              ▼
//!     ┌─────────┐ ┌──────────┐ ┌────────────┐ ┌──────────┐
//!     │  Feed   │ │ Book     │ │  Ordering  │ │ Market   │
//!     │ (WS)    │ │ (REST)   │ │  service   │ │ resolver │
//!     └─────────┘ └──────────┘ └────────────┘ └──────────┘
//! ```

pub mod outbound;

pub use outbound::exchange::{
    MarketDataStream, MarketEvent, MarketResolver, OrderAck, OrderBookSource, OrderRequest,
    OrderService, OrderSide, OrderState, OrderStatus, ResolvedOutcomes, TimeInForce,
};
