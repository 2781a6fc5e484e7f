//! Resting maker bids and their per-outcome state machine.
//!
//! ```text
//!            place ok                 reprice
//!   Absent ───────────▶ Resting(p) ───────────▶ Replacing ──▶ Resting(p')
//!     ▲                    │  │                     │
//!     │     cancel ok      │  │ fill                │ post failed
//!     └────────────────────┘  ▼                     ▼
//!                            Swept ──(cooldown)──▶ Absent
//! ```

use super::id::OrderId;
use super::money::{Price, Volume};

/// An open resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestingBid {
    pub order_id: OrderId,
    pub price: Price,
    pub size: Volume,
}

/// Lifecycle of the maker bid for one (group, outcome).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BidState {
    /// No order on the book.
    #[default]
    Absent,
    /// An order rests at `bid.price`.
    Resting(RestingBid),
    /// The previous order is being cancelled so a new price can be posted.
    Replacing { previous: RestingBid, target: Price },
    /// The group was swept; no bids until the cooldown ends.
    Swept,
}

/// What the strategy must do to move a bid toward the desired price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidAction {
    Keep,
    Place { price: Price },
    Replace { previous: RestingBid, price: Price },
    Cancel { previous: RestingBid },
}

impl BidState {
    /// Decide the action for a desired price (`None` = not viable).
    #[must_use]
    pub fn plan(&self, desired: Option<Price>) -> BidAction {
        match (self, desired) {
            (Self::Absent, Some(price)) => BidAction::Place { price },
            (Self::Resting(bid), Some(price)) if bid.price != price => BidAction::Replace {
                previous: bid.clone(),
                price,
            },
            (Self::Resting(bid), None) => BidAction::Cancel {
                previous: bid.clone(),
            },
            _ => BidAction::Keep,
        }
    }

    /// The order currently on the book, if any.
    #[must_use]
    pub fn resting(&self) -> Option<&RestingBid> {
        match self {
            Self::Resting(bid) => Some(bid),
            Self::Replacing { previous, .. } => Some(previous),
            Self::Absent | Self::Swept => None,
        }
    }

    #[must_use]
    pub fn is_swept(&self) -> bool {
        matches!(self, Self::Swept)
    }
}
