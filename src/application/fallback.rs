//! REST backfill for the streaming feed.
//!
//! The poller runs in one of two modes, chosen from [`FeedHealth`]:
//!
//! - **Stale sweep** (feed healthy or reconnecting): every `interval`, fetch
//!   only the outcomes whose quote is missing, has no ask, or is older than
//!   `stale_after`.
//! - **Full polling** (feed degraded): every `degraded_interval`, fetch every
//!   outcome.
//!
//! Fetches run with at most `max_concurrency` requests in flight and are
//! written through [`FeedAdapter::ingest`], so polled quotes trigger the same
//! pre-check as streamed ones.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::feed::FeedAdapter;
use crate::application::lifecycle::wait_for_shutdown;
use crate::application::metrics::EngineMetrics;
use crate::domain::{id::TokenId, quote::OutcomeQuote, quote::QuoteSource};
use crate::port::OrderBookSource;

/// Connection state of the streaming feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Connected,
    /// Lost, reconnect attempts in progress.
    Reconnecting,
    /// Reconnects keep failing; REST is the primary data source.
    Degraded,
}

/// Shared, observable feed state.
#[derive(Clone)]
pub struct FeedHealth {
    tx: Arc<watch::Sender<FeedState>>,
}

impl FeedHealth {
    #[must_use]
    pub fn new(initial: FeedState) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// Publish a new state. Unchanged states do not wake watchers.
    pub fn set(&self, state: FeedState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            info!(state = ?state, "Feed state changed");
        }
    }

    #[must_use]
    pub fn state(&self) -> FeedState {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.state() == FeedState::Degraded
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.tx.subscribe()
    }
}

impl Default for FeedHealth {
    fn default() -> Self {
        Self::new(FeedState::Reconnecting)
    }
}

/// Poller cadence and limits.
#[derive(Debug, Clone, Copy)]
pub struct FallbackSettings {
    pub interval: Duration,
    pub stale_after: Duration,
    pub degraded_interval: Duration,
    pub max_concurrency: usize,
    /// Upper bound on a single order-book fetch.
    pub request_timeout: Duration,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5_000),
            stale_after: Duration::from_millis(5_000),
            degraded_interval: Duration::from_millis(500),
            max_concurrency: 10,
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Fetches order books over REST when the feed cannot be trusted.
pub struct FallbackPoller {
    books: Arc<dyn OrderBookSource>,
    feed: Arc<FeedAdapter>,
    health: FeedHealth,
    metrics: Arc<EngineMetrics>,
    settings: FallbackSettings,
    tokens: Vec<TokenId>,
}

impl FallbackPoller {
    #[must_use]
    pub fn new(
        books: Arc<dyn OrderBookSource>,
        feed: Arc<FeedAdapter>,
        health: FeedHealth,
        metrics: Arc<EngineMetrics>,
        settings: FallbackSettings,
    ) -> Self {
        let tokens = feed.token_ids();
        Self {
            books,
            feed,
            health,
            metrics,
            settings,
            tokens,
        }
    }

    #[must_use]
    pub fn health(&self) -> &FeedHealth {
        &self.health
    }

    /// Fetch one outcome's book and write its quote through the feed adapter.
    ///
    /// Failures are logged and counted; `None` means no data this time.
    pub async fn refresh(&self, token_id: &TokenId) -> Option<OutcomeQuote> {
        let fetched =
            tokio::time::timeout(self.settings.request_timeout, self.books.order_book(token_id))
                .await;

        let book = match fetched {
            Ok(Ok(book)) => book,
            Ok(Err(e)) => {
                warn!(token_id = %token_id, error = %e, "Order book fetch failed");
                self.metrics.record_poll(false);
                return None;
            }
            Err(_) => {
                warn!(token_id = %token_id, "Order book fetch timed out");
                self.metrics.record_poll(false);
                return None;
            }
        };

        self.metrics.record_poll(true);
        let quote = OutcomeQuote::from_book(&book, Instant::now(), QuoteSource::Poll);
        self.feed.ingest(token_id.clone(), quote);
        Some(quote)
    }

    /// Refresh only the outcomes that are missing, askless, or stale.
    ///
    /// Returns the number of outcomes fetched.
    pub async fn poll_stale(&self) -> usize {
        let stale = self.feed.cache().stale_tokens(
            &self.tokens,
            Instant::now(),
            self.settings.stale_after,
        );
        if stale.is_empty() {
            return 0;
        }
        debug!(count = stale.len(), "Polling stale outcomes");
        self.fetch_all(stale).await
    }

    /// Refresh every outcome.
    pub async fn poll_all(&self) -> usize {
        self.fetch_all(self.tokens.clone()).await
    }

    async fn fetch_all(&self, tokens: Vec<TokenId>) -> usize {
        let count = tokens.len();
        let refreshed = stream::iter(tokens)
            .map(|token_id| async move { self.refresh(&token_id).await.is_some() })
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .filter(|ok| futures_util::future::ready(*ok))
            .count()
            .await;
        if refreshed < count {
            debug!(requested = count, refreshed, "Poll cycle finished with failures");
        }
        count
    }

    /// Poll until shutdown, switching cadence with the feed state.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut state_rx = self.health.subscribe();
        info!(outcomes = self.tokens.len(), "Fallback poller started");

        loop {
            let degraded = *state_rx.borrow_and_update() == FeedState::Degraded;
            let wait = if degraded {
                self.settings.degraded_interval
            } else {
                self.settings.interval
            };

            tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => break,
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if *state_rx.borrow() != FeedState::Degraded {
                        continue;
                    }
                }
                () = tokio::time::sleep(wait) => {}
            }

            if self.health.is_degraded() {
                self.poll_all().await;
            } else {
                self.poll_stale().await;
            }
        }

        info!("Fallback poller stopped");
    }
}
