//! Thread-safe top-of-book cache keyed by outcome token.
//!
//! The cache is the only mutable surface shared between the feed and the
//! strategies. Writers replace whole [`OutcomeQuote`] values; readers get
//! copies. Keys are sharded by [`DashMap`], so writers to different outcomes
//! do not contend.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::{id::TokenId, money::Price, quote::OutcomeQuote};

/// Concurrent map from outcome to its latest quote.
#[derive(Default)]
pub struct QuoteCache {
    quotes: DashMap<TokenId, OutcomeQuote>,
    tick_sizes: DashMap<TokenId, Price>,
}

impl QuoteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest quote, returning the one it replaced.
    pub fn update(&self, token_id: TokenId, quote: OutcomeQuote) -> Option<OutcomeQuote> {
        self.quotes.insert(token_id, quote)
    }

    /// Latest quote for a token, if any has been written.
    #[must_use]
    pub fn get(&self, token_id: &TokenId) -> Option<OutcomeQuote> {
        self.quotes.get(token_id).map(|entry| *entry.value())
    }

    /// Read several quotes back to back, in the order given.
    #[must_use]
    pub fn snapshot(&self, token_ids: &[TokenId]) -> Vec<Option<OutcomeQuote>> {
        token_ids.iter().map(|id| self.get(id)).collect()
    }

    /// Tokens among `token_ids` with no quote, no ask, or a quote older than
    /// `stale_after`.
    #[must_use]
    pub fn stale_tokens(
        &self,
        token_ids: &[TokenId],
        now: Instant,
        stale_after: Duration,
    ) -> Vec<TokenId> {
        token_ids
            .iter()
            .filter(|id| match self.get(id) {
                None => true,
                Some(quote) => !quote.has_ask() || quote.age(now) > stale_after,
            })
            .cloned()
            .collect()
    }

    /// Record an exchange tick-size override for a token.
    pub fn set_tick_size(&self, token_id: TokenId, tick_size: Price) {
        self.tick_sizes.insert(token_id, tick_size);
    }

    /// Tick size for a token, or `default` if the exchange never pushed one.
    #[must_use]
    pub fn tick_size(&self, token_id: &TokenId, default: Price) -> Price {
        self.tick_sizes
            .get(token_id)
            .map_or(default, |entry| *entry.value())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::quote::QuoteSource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn quote(ask: Decimal, at: Instant) -> OutcomeQuote {
        OutcomeQuote {
            best_ask: ask,
            best_ask_size: dec!(10),
            best_bid: ask - dec!(0.01),
            best_bid_size: dec!(10),
            updated_at: at,
            source: QuoteSource::Feed,
        }
    }

    #[test]
    fn test_update_and_get() {
        let cache = QuoteCache::new();
        let now = Instant::now();

        assert!(cache.get(&TokenId::from("a")).is_none());
        assert!(cache.update(TokenId::from("a"), quote(dec!(0.4), now)).is_none());
        assert_eq!(cache.get(&TokenId::from("a")), Some(quote(dec!(0.4), now)));
    }

    #[test]
    fn test_last_write_wins() {
        let cache = QuoteCache::new();
        let now = Instant::now();

        cache.update(TokenId::from("a"), quote(dec!(0.4), now));
        let previous = cache.update(TokenId::from("a"), quote(dec!(0.5), now));

        assert_eq!(previous.map(|q| q.best_ask), Some(dec!(0.4)));
        assert_eq!(cache.get(&TokenId::from("a")).unwrap().best_ask, dec!(0.5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_snapshot_preserves_order_and_gaps() {
        let cache = QuoteCache::new();
        let now = Instant::now();
        cache.update(TokenId::from("b"), quote(dec!(0.2), now));

        let snap = cache.snapshot(&[TokenId::from("a"), TokenId::from("b")]);
        assert!(snap[0].is_none());
        assert_eq!(snap[1].map(|q| q.best_ask), Some(dec!(0.2)));
    }

    #[test]
    fn test_stale_tokens() {
        let cache = QuoteCache::new();
        let start = Instant::now();
        let now = start + Duration::from_secs(10);

        cache.update(TokenId::from("fresh"), quote(dec!(0.3), now));
        cache.update(TokenId::from("old"), quote(dec!(0.3), start));
        cache.update(TokenId::from("empty"), quote(Decimal::ZERO, now));

        let ids: Vec<TokenId> = ["fresh", "old", "empty", "missing"]
            .into_iter()
            .map(TokenId::from)
            .collect();
        let stale = cache.stale_tokens(&ids, now, Duration::from_secs(5));

        assert_eq!(
            stale,
            vec![TokenId::from("old"), TokenId::from("empty"), TokenId::from("missing")]
        );
    }

    #[test]
    fn test_tick_size_override() {
        let cache = QuoteCache::new();
        let token = TokenId::from("a");
        assert_eq!(cache.tick_size(&token, dec!(0.01)), dec!(0.01));
        cache.set_tick_size(token.clone(), dec!(0.001));
        assert_eq!(cache.tick_size(&token, dec!(0.01)), dec!(0.001));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_update_then_get_under_concurrent_writers() {
        let cache = Arc::new(QuoteCache::new());
        let now = Instant::now();

        let writers: Vec<_> = (0..8)
            .map(|w| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    for i in 0..500u32 {
                        let ask = Decimal::from(i % 100) / Decimal::from(100);
                        cache.update(TokenId::from(format!("noise-{w}")), quote(ask, now));
                    }
                })
            })
            .collect();

        let target = TokenId::from("target");
        for i in 1..200u32 {
            let ask = Decimal::from(i) / Decimal::from(1000);
            cache.update(target.clone(), quote(ask, now));
            assert_eq!(cache.get(&target).map(|q| q.best_ask), Some(ask));
        }

        for writer in writers {
            writer.await.unwrap();
        }
        assert_eq!(cache.len(), 9);
    }
}
