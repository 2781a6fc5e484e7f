//! Order book types for market depth representation.
//!
//! - [`PriceLevel`] - A single price level with size
//! - [`Book`] - Full depth for a single outcome token
//! - [`BookSide`] - Which side an incremental change applies to
//!
//! Exchanges do not agree on level ordering (some push asks descending), so
//! best prices are found by scanning rather than by position.
//!
//! # Examples
//!
//! ```
//! use negrisk::domain::book::{Book, BookSide, PriceLevel};
//! use negrisk::domain::id::TokenId;
//! use rust_decimal_macros::dec;
//!
//! let mut book = Book::with_levels(
//!     TokenId::new("no-token"),
//!     vec![PriceLevel::new(dec!(0.44), dec!(200)), PriceLevel::new(dec!(0.45), dec!(100))],
//!     vec![PriceLevel::new(dec!(0.47), dec!(300)), PriceLevel::new(dec!(0.46), dec!(150))],
//! );
//!
//! assert_eq!(book.best_bid().unwrap().price(), dec!(0.45));
//! assert_eq!(book.best_ask().unwrap().price(), dec!(0.46));
//!
//! // A zero size removes the level.
//! book.apply_change(BookSide::Ask, dec!(0.46), dec!(0));
//! assert_eq!(book.best_ask().unwrap().price(), dec!(0.47));
//! ```

use super::id::TokenId;
use super::money::{Price, Volume};

/// A single price level in an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    price: Price,
    size: Volume,
}

impl PriceLevel {
    /// Creates a new price level.
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }

    /// Returns the price at this level.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Returns the total volume available at this level.
    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }
}

/// Side of the book an incremental change targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

/// Order book for a single outcome token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    token_id: TokenId,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

impl Book {
    /// Creates a new empty order book.
    #[must_use]
    pub const fn new(token_id: TokenId) -> Self {
        Self {
            token_id,
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }

    /// Creates a book with initial price levels in any order.
    #[must_use]
    pub const fn with_levels(
        token_id: TokenId,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
    ) -> Self {
        Self {
            token_id,
            bids,
            asks,
        }
    }

    /// Returns the token ID for this book.
    #[must_use]
    pub const fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    /// Returns the highest bid with a positive price.
    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids
            .iter()
            .filter(|level| level.price > Price::ZERO)
            .max_by(|a, b| a.price.cmp(&b.price))
    }

    /// Returns the lowest ask with a positive price.
    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks
            .iter()
            .filter(|level| level.price > Price::ZERO)
            .min_by(|a, b| a.price.cmp(&b.price))
    }

    /// Apply an absolute size update at one price level.
    ///
    /// A zero (or negative) size removes the level; otherwise the level is
    /// replaced or inserted.
    pub fn apply_change(&mut self, side: BookSide, price: Price, size: Volume) {
        let levels = match side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        };

        let existing = levels.iter().position(|level| level.price == price);
        match (existing, size > Volume::ZERO) {
            (Some(index), true) => levels[index] = PriceLevel::new(price, size),
            (Some(index), false) => {
                levels.swap_remove(index);
            }
            (None, true) => levels.push(PriceLevel::new(price, size)),
            (None, false) => {}
        }
    }
}
