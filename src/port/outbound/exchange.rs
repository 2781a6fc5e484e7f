//! Exchange port for market data and order placement.
//!
//! These traits are the seams between the engine and the exchange: the
//! streaming feed, the REST order-book query, the opaque ordering service
//! (signing and auth live behind it), and startup market discovery.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{book::Book, id::OrderId, id::TokenId, money::Price, money::Volume};
use crate::error::Error;

/// Events received from a market data stream.
#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// Full order book snapshot for a token.
    BookSnapshot {
        /// The token this order book belongs to.
        token_id: TokenId,
        /// The full order book state.
        book: Book,
    },
    /// Book after applying incremental price-level changes.
    BookDelta {
        /// The token this update applies to.
        token_id: TokenId,
        /// The order book with the changes applied.
        book: Book,
    },
    /// The exchange changed the minimum price increment for a token.
    TickSizeChanged {
        token_id: TokenId,
        tick_size: Price,
    },
    /// Connection established.
    Connected,
    /// Connection lost (may reconnect).
    Disconnected {
        /// The disconnection reason.
        reason: String,
    },
}

impl MarketEvent {
    /// Get the token ID if this event concerns one token.
    #[must_use]
    pub fn token_id(&self) -> Option<&TokenId> {
        match self {
            Self::BookSnapshot { token_id, .. }
            | Self::BookDelta { token_id, .. }
            | Self::TickSizeChanged { token_id, .. } => Some(token_id),
            Self::Connected | Self::Disconnected { .. } => None,
        }
    }

    /// Get the order book if this event contains one.
    #[must_use]
    pub fn order_book(&self) -> Option<&Book> {
        match self {
            Self::BookSnapshot { book, .. } | Self::BookDelta { book, .. } => Some(book),
            _ => None,
        }
    }
}

/// Real-time market data stream from an exchange.
///
/// Implementations handle connection management, subscriptions, and message
/// parsing for their specific exchange protocols.
#[async_trait]
pub trait MarketDataStream: Send {
    /// Connect to the exchange's real-time data feed.
    async fn connect(&mut self) -> Result<(), Error>;

    /// Subscribe to market data for the given tokens.
    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<(), Error>;

    /// Receive the next market event.
    ///
    /// Returns `None` when the stream is closed.
    async fn next_event(&mut self) -> Option<MarketEvent>;

    /// Close the connection. The default does nothing.
    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Get the exchange name for logging/debugging.
    fn exchange_name(&self) -> &'static str;
}

/// Implement MarketDataStream for boxed trait objects to allow use with generic wrappers.
#[async_trait]
impl MarketDataStream for Box<dyn MarketDataStream> {
    async fn connect(&mut self) -> Result<(), Error> {
        (**self).connect().await
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<(), Error> {
        (**self).subscribe(token_ids).await
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        (**self).next_event().await
    }

    async fn close(&mut self) -> Result<(), Error> {
        (**self).close().await
    }

    fn exchange_name(&self) -> &'static str {
        (**self).exchange_name()
    }
}

/// Synchronous order-book query used by the fallback path.
#[async_trait]
pub trait OrderBookSource: Send + Sync {
    /// Fetch the current book for one token.
    async fn order_book(&self, token_id: &TokenId) -> Result<Book, Error>;
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// How long an order may rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    /// Good till cancelled (maker bids).
    Gtc,
    /// Fill or kill (taker legs).
    Fok,
    /// Good till the given lifetime elapses.
    Gtd(Duration),
}

/// An order to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub token_id: TokenId,
    pub side: OrderSide,
    pub price: Price,
    pub size: Volume,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// A buy limit order.
    #[must_use]
    pub fn buy(token_id: TokenId, price: Price, size: Volume, time_in_force: TimeInForce) -> Self {
        Self {
            token_id,
            side: OrderSide::Buy,
            price,
            size,
            time_in_force,
        }
    }
}

/// Exchange acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: OrderId,
}

/// Lifecycle state reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Live,
    Matched,
    Cancelled,
    Unknown,
}

/// Status of a previously placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatus {
    pub state: OrderState,
    pub original_size: Volume,
    pub size_matched: Volume,
}

impl OrderStatus {
    /// True if any quantity has traded.
    #[must_use]
    pub fn has_fill(&self) -> bool {
        self.size_matched > Decimal::ZERO || self.state == OrderState::Matched
    }

    /// Quantity traded. A `Matched` order that reports no size counts as fully filled.
    #[must_use]
    pub fn filled_size(&self) -> Volume {
        if self.size_matched > Decimal::ZERO {
            self.size_matched
        } else if self.state == OrderState::Matched {
            self.original_size
        } else {
            Decimal::ZERO
        }
    }
}

/// Opaque ordering service. Order construction, signing and authentication
/// are the implementation's concern.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Build, sign and post an order.
    async fn post_order(&self, order: &OrderRequest) -> Result<OrderAck, Error>;

    /// Cancel an open order.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<(), Error>;

    /// Current status of an order.
    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatus, Error>;

    /// Get the exchange name for logging/debugging.
    fn exchange_name(&self) -> &'static str;
}

/// Outcomes of a market group as reported by market discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutcomes {
    /// Outcome tokens with display names, in exchange order.
    pub outcomes: Vec<(TokenId, String)>,
    /// Whether the exchange flags the group as negative-risk.
    pub neg_risk: bool,
}

/// Startup market discovery.
#[async_trait]
pub trait MarketResolver: Send + Sync {
    /// Resolve a group slug to its outcome tokens.
    async fn resolve_outcomes(&self, slug: &str) -> Result<ResolvedOutcomes, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn matched_without_size_counts_as_full_fill() {
        let status = OrderStatus {
            state: OrderState::Matched,
            original_size: dec!(5),
            size_matched: dec!(0),
        };
        assert!(status.has_fill());
        assert_eq!(status.filled_size(), dec!(5));
    }

    #[test]
    fn live_partial_fill_reports_matched_size() {
        let status = OrderStatus {
            state: OrderState::Live,
            original_size: dec!(5),
            size_matched: dec!(2),
        };
        assert!(status.has_fill());
        assert_eq!(status.filled_size(), dec!(2));
    }

    #[test]
    fn untouched_order_has_no_fill() {
        let status = OrderStatus {
            state: OrderState::Live,
            original_size: dec!(5),
            size_matched: dec!(0),
        };
        assert!(!status.has_fill());
        assert_eq!(status.filled_size(), dec!(0));
    }

    #[test]
    fn event_token_id_is_none_for_lifecycle_events() {
        assert!(MarketEvent::Connected.token_id().is_none());
        let event = MarketEvent::TickSizeChanged {
            token_id: TokenId::from("t"),
            tick_size: dec!(0.001),
        };
        assert_eq!(event.token_id().map(TokenId::as_str), Some("t"));
    }
}
