//! Feed adapter: turns market events into cache writes and strategy signals.
//!
//! Every book update for an outcome becomes a fresh [`OutcomeQuote`] in the
//! [`QuoteCache`]. When the ask moved, the owning group is re-priced inline
//! from cached quotes and, if the set looks executable, a [`GroupSignal`] is
//! pushed onto each of the group's bounded signal queues. A full queue drops
//! the signal; the strategies' periodic tick re-evaluates regardless.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::application::cache::QuoteCache;
use crate::application::metrics::EngineMetrics;
use crate::domain::{
    group::MarketGroup, id::TokenId, opportunity::Decision, opportunity::Economics,
    quote::OutcomeQuote, quote::QuoteSource,
};
use crate::port::MarketEvent;

/// Wake-up for a group's evaluation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSignal {
    pub group: String,
    /// When the quote that triggered the signal was written.
    pub captured_at: Instant,
}

/// Thresholds for the inline pre-check.
#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    pub min_edge: Decimal,
    /// Budget for groups that carry none of their own.
    pub default_budget: Decimal,
    /// Quotes older than this are ignored by the pre-check (zero disables).
    pub quote_max_age: Duration,
}

struct GroupEntry {
    group: MarketGroup,
    budget: Decimal,
    senders: Vec<mpsc::Sender<GroupSignal>>,
}

/// Normalizes feed and poll results into the cache.
pub struct FeedAdapter {
    cache: Arc<QuoteCache>,
    metrics: Arc<EngineMetrics>,
    settings: FeedSettings,
    groups: Vec<GroupEntry>,
    index: HashMap<TokenId, usize>,
}

impl FeedAdapter {
    /// Build the adapter and its outcome-to-group index.
    ///
    /// Outcomes are unique across groups after config validation; if one is
    /// repeated, the first group wins.
    #[must_use]
    pub fn new(
        groups: Vec<MarketGroup>,
        cache: Arc<QuoteCache>,
        metrics: Arc<EngineMetrics>,
        settings: FeedSettings,
    ) -> Self {
        let mut index = HashMap::new();
        let groups: Vec<GroupEntry> = groups
            .into_iter()
            .enumerate()
            .map(|(position, group)| {
                for token_id in group.outcomes() {
                    index.entry(token_id.clone()).or_insert(position);
                }
                GroupEntry {
                    budget: group.effective_budget(settings.default_budget),
                    group,
                    senders: Vec::new(),
                }
            })
            .collect();

        Self {
            cache,
            metrics,
            settings,
            groups,
            index,
        }
    }

    /// Open a bounded signal queue for `group`.
    ///
    /// Returns `None` for an unknown group.
    pub fn subscribe(
        &mut self,
        group: &str,
        capacity: usize,
    ) -> Option<mpsc::Receiver<GroupSignal>> {
        let entry = self.groups.iter_mut().find(|e| e.group.name() == group)?;
        let (tx, rx) = mpsc::channel(capacity.max(1));
        entry.senders.push(tx);
        Some(rx)
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }

    /// Every outcome across every group, in group order.
    #[must_use]
    pub fn token_ids(&self) -> Vec<TokenId> {
        self.groups
            .iter()
            .flat_map(|e| e.group.outcomes().iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn groups(&self) -> impl Iterator<Item = &MarketGroup> {
        self.groups.iter().map(|e| &e.group)
    }

    /// Name of the group that owns `token_id`.
    #[must_use]
    pub fn group_of(&self, token_id: &TokenId) -> Option<&str> {
        self.index
            .get(token_id)
            .map(|&position| self.groups[position].group.name())
    }

    /// Apply one market event.
    pub fn handle_event(&self, event: MarketEvent) {
        match event {
            MarketEvent::BookSnapshot { token_id, book }
            | MarketEvent::BookDelta { token_id, book } => {
                let quote = OutcomeQuote::from_book(&book, Instant::now(), QuoteSource::Feed);
                self.ingest(token_id, quote);
            }
            MarketEvent::TickSizeChanged {
                token_id,
                tick_size,
            } => {
                info!(token_id = %token_id, tick_size = %tick_size, "Tick size changed");
                self.cache.set_tick_size(token_id, tick_size);
            }
            MarketEvent::Connected => info!("Market data connected"),
            MarketEvent::Disconnected { reason } => {
                warn!(reason = %reason, "Market data disconnected");
            }
        }
    }

    /// Write a quote to the cache and run the pre-check if its ask moved.
    ///
    /// Returns true if at least one signal was delivered.
    pub fn ingest(&self, token_id: TokenId, quote: OutcomeQuote) -> bool {
        let Some(&position) = self.index.get(&token_id) else {
            trace!(token_id = %token_id, "Ignoring update for unknown outcome");
            return false;
        };

        let previous = self.cache.update(token_id, quote);
        if previous.is_some_and(|p| p.best_ask == quote.best_ask) {
            return false;
        }

        let entry = &self.groups[position];
        if !self.precheck(entry, quote.updated_at) {
            return false;
        }
        self.signal(entry, quote.updated_at)
    }

    fn precheck(&self, entry: &GroupEntry, now: Instant) -> bool {
        let asks = self
            .cache
            .snapshot(entry.group.outcomes())
            .into_iter()
            .flatten()
            .filter(|q| q.is_liquid(now, self.settings.quote_max_age))
            .map(|q| q.best_ask);

        Economics::from_asks(asks).is_some_and(|economics| {
            economics.decide(self.settings.min_edge, entry.budget) == Decision::Execute
        })
    }

    fn signal(&self, entry: &GroupEntry, captured_at: Instant) -> bool {
        let mut delivered = false;
        for sender in &entry.senders {
            let signal = GroupSignal {
                group: entry.group.name().to_string(),
                captured_at,
            };
            let sent = sender.try_send(signal).is_ok();
            if !sent {
                debug!(group = %entry.group.name(), "Signal queue full, dropping");
            }
            self.metrics.record_signal(sent);
            delivered |= sent;
        }
        delivered
    }
}
