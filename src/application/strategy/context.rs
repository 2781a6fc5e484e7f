//! Shared collaborators handed to every strategy loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::cache::QuoteCache;
use crate::application::execution::ExecutionCoordinator;
use crate::application::fallback::FallbackPoller;
use crate::application::metrics::EngineMetrics;
use crate::domain::{id::TokenId, quote::OutcomeQuote};

/// Everything a strategy needs besides its own group and config.
#[derive(Clone)]
pub struct StrategyContext {
    pub cache: Arc<QuoteCache>,
    /// REST path used for synchronous double-checks of illiquid outcomes.
    pub poller: Arc<FallbackPoller>,
    pub coordinator: Arc<ExecutionCoordinator>,
    pub metrics: Arc<EngineMetrics>,
    /// Quotes older than this count as missing (zero disables).
    pub quote_max_age: Duration,
}

impl StrategyContext {
    /// One back-to-back read of every outcome's quote.
    #[must_use]
    pub fn snapshot(&self, outcomes: &[TokenId]) -> Vec<Option<OutcomeQuote>> {
        self.cache.snapshot(outcomes)
    }

    /// True if the quote exists, has an ask, and is within the age bound.
    #[must_use]
    pub fn is_liquid(&self, quote: Option<&OutcomeQuote>, now: Instant) -> bool {
        quote.is_some_and(|q| q.is_liquid(now, self.quote_max_age))
    }
}
