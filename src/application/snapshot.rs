//! Read-only views of engine state for dashboards and status lines.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::application::cache::QuoteCache;
use crate::application::execution::ActiveExecutions;
use crate::application::fallback::{FeedHealth, FeedState};
use crate::application::metrics::{EngineMetrics, MetricsSnapshot};
use crate::application::strategy::RestingBids;
use crate::domain::{
    group::MarketGroup, id::TokenId, opportunity::Economics, quote::OutcomeQuote,
    resting::BidState,
};

/// One outcome's row in a group view.
#[derive(Debug, Clone)]
pub struct OutcomeView {
    pub token_id: TokenId,
    pub name: String,
    pub quote: Option<OutcomeQuote>,
    pub age: Option<Duration>,
    pub bid: BidState,
}

/// Cached state of one market group.
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub name: String,
    pub budget: Decimal,
    pub outcomes: Vec<OutcomeView>,
    /// Economics over the outcomes that currently have an ask.
    pub economics: Option<Economics>,
    pub executing: bool,
}

/// Engine-wide read handle.
#[derive(Clone)]
pub struct EngineView {
    groups: Arc<Vec<(MarketGroup, Decimal)>>,
    cache: Arc<QuoteCache>,
    bids: Arc<RestingBids>,
    metrics: Arc<EngineMetrics>,
    health: FeedHealth,
    active: Arc<ActiveExecutions>,
}

impl EngineView {
    #[must_use]
    pub fn new(
        groups: Vec<(MarketGroup, Decimal)>,
        cache: Arc<QuoteCache>,
        bids: Arc<RestingBids>,
        metrics: Arc<EngineMetrics>,
        health: FeedHealth,
        active: Arc<ActiveExecutions>,
    ) -> Self {
        Self {
            groups: Arc::new(groups),
            cache,
            bids,
            metrics,
            health,
            active,
        }
    }

    /// Snapshot of every group, in configuration order.
    #[must_use]
    pub fn groups(&self) -> Vec<GroupSnapshot> {
        let now = Instant::now();
        self.groups
            .iter()
            .map(|(group, budget)| self.group_snapshot(group, *budget, now))
            .collect()
    }

    /// Snapshot of one group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<GroupSnapshot> {
        let now = Instant::now();
        self.groups
            .iter()
            .find(|(group, _)| group.name() == name)
            .map(|(group, budget)| self.group_snapshot(group, *budget, now))
    }

    fn group_snapshot(&self, group: &MarketGroup, budget: Decimal, now: Instant) -> GroupSnapshot {
        let outcomes: Vec<OutcomeView> = group
            .outcomes()
            .iter()
            .zip(self.cache.snapshot(group.outcomes()))
            .map(|(token_id, quote)| OutcomeView {
                token_id: token_id.clone(),
                name: group.display_name(token_id).to_string(),
                age: quote.map(|q| q.age(now)),
                quote,
                bid: self.bids.get(group.name(), token_id),
            })
            .collect();

        let economics = Economics::from_asks(
            outcomes
                .iter()
                .filter_map(|o| o.quote.filter(OutcomeQuote::has_ask))
                .map(|q| q.best_ask),
        );

        GroupSnapshot {
            name: group.name().to_string(),
            budget,
            outcomes,
            economics,
            executing: self.active.is_active(group.name()),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[must_use]
    pub fn feed_state(&self) -> FeedState {
        self.health.state()
    }

    #[must_use]
    pub fn resting_bids(&self) -> usize {
        self.bids.resting_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{group, quote};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn view(cache: Arc<QuoteCache>, active: Arc<ActiveExecutions>) -> EngineView {
        let names = HashMap::from([(TokenId::from("a"), "Alice".to_string())]);
        let group = group("g", &["a", "b", "c"]).with_outcome_names(names);
        EngineView::new(
            vec![(group, dec!(1))],
            cache,
            Arc::new(RestingBids::new()),
            Arc::new(EngineMetrics::new()),
            FeedHealth::new(FeedState::Connected),
            active,
        )
    }

    #[test]
    fn test_group_snapshot_reports_cached_quotes() {
        let cache = Arc::new(QuoteCache::new());
        cache.update(TokenId::from("a"), quote(dec!(0.30)));
        cache.update(TokenId::from("b"), quote(dec!(0.33)));
        let view = view(cache, Arc::new(ActiveExecutions::new()));

        let snapshot = view.group("g").unwrap();

        assert_eq!(snapshot.outcomes.len(), 3);
        assert_eq!(snapshot.outcomes[0].name, "Alice");
        assert_eq!(snapshot.outcomes[1].name, "b");
        assert!(snapshot.outcomes[2].quote.is_none());
        let economics = snapshot.economics.unwrap();
        assert_eq!(economics.k, 2);
        assert_eq!(economics.edge, dec!(0.37));
        assert!(!snapshot.executing);
    }

    #[test]
    fn test_snapshot_shows_active_execution() {
        let active = Arc::new(ActiveExecutions::new());
        let _guard = active.try_acquire("g").unwrap();
        let view = view(Arc::new(QuoteCache::new()), Arc::clone(&active));

        assert!(view.groups()[0].executing);
        assert!(view.group("missing").is_none());
        assert_eq!(view.feed_state(), FeedState::Connected);
    }
}
