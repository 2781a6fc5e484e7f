//! Builders for domain primitives used across tests.
//!
//! Concise factory functions so tests focus on assertions rather than
//! construction boilerplate.

use std::time::Instant;

use rust_decimal::Decimal;

use crate::domain::{
    book::Book, book::PriceLevel, group::MarketGroup, id::TokenId, quote::OutcomeQuote,
    quote::QuoteSource,
};
use crate::port::MarketEvent;

/// Generate `n` token IDs named `t0`, `t1`, ..., `t{n-1}`.
pub fn make_tokens(n: usize) -> Vec<TokenId> {
    (0..n).map(|i| TokenId::from(format!("t{i}"))).collect()
}

/// Create a [`TokenId`] from a string.
pub fn token(id: &str) -> TokenId {
    TokenId::from(id)
}

/// A validated group over the given token ids.
///
/// # Panics
///
/// Panics if the ids do not form a valid group.
pub fn group(name: &str, ids: &[&str]) -> MarketGroup {
    MarketGroup::try_new(name, ids.iter().map(|id| token(id)).collect())
        .expect("valid test group")
}

/// A feed quote with the given ask, size 100 on both sides, captured now.
pub fn quote(ask: Decimal) -> OutcomeQuote {
    quote_at(ask, Instant::now())
}

/// A feed quote captured at a specific instant.
pub fn quote_at(ask: Decimal, at: Instant) -> OutcomeQuote {
    OutcomeQuote {
        best_ask: ask,
        best_ask_size: Decimal::ONE_HUNDRED,
        best_bid: Decimal::ZERO,
        best_bid_size: Decimal::ZERO,
        updated_at: at,
        source: QuoteSource::Feed,
    }
}

/// A one-level book with the given ask (size 100).
pub fn book_with_ask(id: &str, ask: Decimal) -> Book {
    Book::with_levels(
        token(id),
        Vec::new(),
        vec![PriceLevel::new(ask, Decimal::ONE_HUNDRED)],
    )
}

/// Create a [`BookSnapshot`](MarketEvent::BookSnapshot) with a single ask.
pub fn ask_event(id: &str, ask: Decimal) -> MarketEvent {
    MarketEvent::BookSnapshot {
        token_id: token(id),
        book: book_with_ask(id, ask),
    }
}

/// Create a [`BookSnapshot`](MarketEvent::BookSnapshot) event with an empty book.
pub fn snapshot_event(id: &str) -> MarketEvent {
    MarketEvent::BookSnapshot {
        token_id: token(id),
        book: Book::new(token(id)),
    }
}

/// Create a [`Disconnected`](MarketEvent::Disconnected) event.
pub fn disconnect_event(reason: &str) -> MarketEvent {
    MarketEvent::Disconnected {
        reason: reason.to_string(),
    }
}
