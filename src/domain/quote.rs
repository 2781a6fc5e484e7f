//! Top-of-book snapshot for one outcome.

use std::time::{Duration, Instant};

use super::book::Book;
use super::money::{Price, Volume};

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    /// Pushed by the streaming feed.
    Feed,
    /// Fetched by a REST order-book query.
    Poll,
}

/// Best bid/ask for one outcome at one instant.
///
/// Quotes are plain values: the cache replaces them wholesale and readers
/// always see a complete snapshot. A zero price means that side is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeQuote {
    pub best_ask: Price,
    pub best_ask_size: Volume,
    pub best_bid: Price,
    pub best_bid_size: Volume,
    pub updated_at: Instant,
    pub source: QuoteSource,
}

impl OutcomeQuote {
    /// Extract top of book from a full book.
    #[must_use]
    pub fn from_book(book: &Book, updated_at: Instant, source: QuoteSource) -> Self {
        let (best_ask, best_ask_size) = book
            .best_ask()
            .map_or((Price::ZERO, Volume::ZERO), |l| (l.price(), l.size()));
        let (best_bid, best_bid_size) = book
            .best_bid()
            .map_or((Price::ZERO, Volume::ZERO), |l| (l.price(), l.size()));

        Self {
            best_ask,
            best_ask_size,
            best_bid,
            best_bid_size,
            updated_at,
            source,
        }
    }

    /// True if the ask is a tradeable price in `(0, 1]`.
    #[must_use]
    pub fn has_ask(&self) -> bool {
        self.best_ask > Price::ZERO && self.best_ask <= Price::ONE
    }

    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.updated_at)
    }

    /// True if the quote is older than `max_age`. A zero bound disables the check.
    #[must_use]
    pub fn is_stale(&self, now: Instant, max_age: Duration) -> bool {
        !max_age.is_zero() && self.age(now) > max_age
    }

    /// Liquid means a tradeable ask that is not stale.
    #[must_use]
    pub fn is_liquid(&self, now: Instant, max_age: Duration) -> bool {
        self.has_ask() && !self.is_stale(now, max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::PriceLevel;
    use crate::domain::id::TokenId;
    use rust_decimal_macros::dec;

    fn quote(ask: Price, at: Instant) -> OutcomeQuote {
        OutcomeQuote {
            best_ask: ask,
            best_ask_size: dec!(10),
            best_bid: Price::ZERO,
            best_bid_size: Volume::ZERO,
            updated_at: at,
            source: QuoteSource::Feed,
        }
    }

    #[test]
    fn from_book_takes_best_levels() {
        let book = Book::with_levels(
            TokenId::from("t"),
            vec![PriceLevel::new(dec!(0.30), dec!(4))],
            vec![
                PriceLevel::new(dec!(0.35), dec!(9)),
                PriceLevel::new(dec!(0.33), dec!(2)),
            ],
        );
        let q = OutcomeQuote::from_book(&book, Instant::now(), QuoteSource::Poll);
        assert_eq!((q.best_ask, q.best_ask_size), (dec!(0.33), dec!(2)));
        assert_eq!((q.best_bid, q.best_bid_size), (dec!(0.30), dec!(4)));
        assert_eq!(q.source, QuoteSource::Poll);
    }

    #[test]
    fn empty_book_has_no_ask() {
        let q = OutcomeQuote::from_book(&Book::new(TokenId::from("t")), Instant::now(), QuoteSource::Feed);
        assert!(!q.has_ask());
    }

    #[test]
    fn out_of_range_ask_is_not_tradeable() {
        let now = Instant::now();
        assert!(!quote(dec!(1.2), now).has_ask());
        assert!(!quote(dec!(-0.1), now).has_ask());
        assert!(quote(dec!(1), now).has_ask());
    }

    #[test]
    fn staleness_respects_zero_bound() {
        let then = Instant::now();
        let later = then + Duration::from_secs(60);
        let q = quote(dec!(0.4), then);

        assert!(q.is_stale(later, Duration::from_secs(30)));
        assert!(!q.is_stale(later, Duration::ZERO));
        assert!(!q.is_liquid(later, Duration::from_secs(30)));
        assert!(q.is_liquid(later, Duration::ZERO));
    }
}
