//! Maker-taker strategy: rest bids on every outcome, sweep on the first fill.
//!
//! For outcome J of an `n`-outcome group the strategy rests a bid at
//! `(n - 1 - extra_edge) - Σ ask_i (i ≠ J)`. If that bid fills, buying every
//! other outcome at its ask completes a set costing `n - 1 - extra_edge`,
//! which pays `n - 1`. Each cycle:
//!
//! 1. Sweep if any resting bid has filled since the last cycle.
//! 2. Skip unless every outcome has a fresh quote.
//! 3. Reprice every outcome: place, replace (cancel then post) or cancel.
//!
//! After a sweep all bids are cancelled and the group cools down before
//! quoting again. Every successful cancel is followed by a status check, so
//! a bid that filled while its cancel was in flight is still swept.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::bids::RestingBids;
use super::context::StrategyContext;
use crate::application::execution::{ExecutionPlan, ExecutionReport, LegOrder};
use crate::application::lifecycle::wait_for_shutdown;
use crate::domain::{
    group::MarketGroup,
    id::{OrderId, TokenId},
    money::Price,
    pricing,
    resting::{BidAction, BidState, RestingBid},
};
use crate::port::{OrderRequest, TimeInForce};

/// Configuration for the maker-taker strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct MakerTakerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Margin kept below the guaranteed payout when pricing bids.
    #[serde(default = "default_extra_edge")]
    pub extra_edge: Decimal,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Shares per resting bid.
    #[serde(default = "default_order_size")]
    pub order_size: Decimal,

    /// Pause after a sweep before quoting again.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_extra_edge() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

const fn default_poll_interval_ms() -> u64 {
    500
}

fn default_order_size() -> Decimal {
    Decimal::from(5)
}

const fn default_cooldown_ms() -> u64 {
    1_000
}

impl Default for MakerTakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            extra_edge: default_extra_edge(),
            poll_interval_ms: default_poll_interval_ms(),
            order_size: default_order_size(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

/// Counts of bid changes made in one repricing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepriceSummary {
    pub placed: usize,
    pub replaced: usize,
    pub cancelled: usize,
    pub failed: usize,
}

/// Result of one cycle.
#[derive(Debug)]
pub enum Cycle {
    /// Still cooling down after a sweep.
    Cooling,
    /// At least one outcome has no fresh quote.
    Incomplete,
    /// A full set at the bid prices would exceed the group budget.
    OverBudget,
    Repriced(RepriceSummary),
    Swept(ExecutionReport),
}

struct Fill {
    token_id: TokenId,
    bid: RestingBid,
    filled: Decimal,
}

/// Per-group maker-taker loop.
pub struct MakerTakerStrategy {
    group: MarketGroup,
    budget: Decimal,
    config: MakerTakerConfig,
    default_tick: Price,
    min_notional: Decimal,
    ctx: StrategyContext,
    bids: Arc<RestingBids>,
    cooldown_until: Option<Instant>,
}

impl MakerTakerStrategy {
    #[must_use]
    pub fn new(
        group: MarketGroup,
        budget: Decimal,
        config: MakerTakerConfig,
        default_tick: Price,
        min_notional: Decimal,
        ctx: StrategyContext,
        bids: Arc<RestingBids>,
    ) -> Self {
        Self {
            group,
            budget,
            config,
            default_tick,
            min_notional,
            ctx,
            bids,
            cooldown_until: None,
        }
    }

    /// Cost of one full set when a bid fills at its desired price.
    fn set_cost(&self) -> Decimal {
        Decimal::from(self.group.len().saturating_sub(1)) - self.config.extra_edge
    }

    /// Run one evaluation cycle.
    pub async fn cycle(&mut self) -> Cycle {
        let now = Instant::now();
        if let Some(until) = self.cooldown_until {
            if now < until {
                return Cycle::Cooling;
            }
            self.cooldown_until = None;
            for token_id in self.group.outcomes() {
                if self.bids.get(self.group.name(), token_id).is_swept() {
                    self.bids.set(self.group.name(), token_id, BidState::Absent);
                }
            }
            info!(group = %self.group.name(), "Cooldown over, resuming quotes");
        }

        if let Some(fill) = self.detect_fill().await {
            return Cycle::Swept(self.sweep(fill).await);
        }

        let quotes = self.ctx.snapshot(self.group.outcomes());
        if !quotes.iter().all(|q| self.ctx.is_liquid(q.as_ref(), now)) {
            debug!(group = %self.group.name(), "Missing fresh quotes, skipping cycle");
            return Cycle::Incomplete;
        }

        if self.set_cost() > self.budget {
            warn!(
                group = %self.group.name(),
                set_cost = %self.set_cost(),
                budget = %self.budget,
                "Set cost exceeds budget, withdrawing bids"
            );
            self.cancel_all().await;
            return Cycle::OverBudget;
        }

        let asks: Vec<Price> = quotes.iter().flatten().map(|q| q.best_ask).collect();
        let total: Decimal = asks.iter().sum();
        let n = self.group.len();

        let mut summary = RepriceSummary::default();
        let mut late_fill = None;
        for (token_id, ask) in self.group.outcomes().iter().zip(&asks) {
            let desired = pricing::desired_bid(n, self.config.extra_edge, total - ask);
            let tick = self.ctx.cache.tick_size(token_id, self.default_tick);
            let target = pricing::maker_bid_price(desired, tick);
            late_fill = self.apply(token_id, target, &mut summary).await;
            if late_fill.is_some() {
                break;
            }
        }
        if let Some(fill) = late_fill {
            return Cycle::Swept(self.sweep(fill).await);
        }

        if summary != RepriceSummary::default() {
            debug!(
                group = %self.group.name(),
                placed = summary.placed,
                replaced = summary.replaced,
                cancelled = summary.cancelled,
                failed = summary.failed,
                "Bids repriced"
            );
        }
        Cycle::Repriced(summary)
    }

    /// Move one outcome's bid toward `target`. Returns the fill of a bid
    /// that traded before its cancel landed.
    async fn apply(
        &self,
        token_id: &TokenId,
        target: Option<Price>,
        summary: &mut RepriceSummary,
    ) -> Option<Fill> {
        let group = self.group.name();
        match self.bids.get(group, token_id).plan(target) {
            BidAction::Keep => {}
            BidAction::Place { price } => match self.post_bid(token_id, price).await {
                Some(bid) => {
                    self.bids.set(group, token_id, BidState::Resting(bid));
                    summary.placed += 1;
                }
                None => summary.failed += 1,
            },
            BidAction::Replace { previous, price } => {
                self.bids.set(
                    group,
                    token_id,
                    BidState::Replacing {
                        previous: previous.clone(),
                        target: price,
                    },
                );
                if !self.cancel_bid(token_id, &previous).await {
                    self.bids.set(group, token_id, BidState::Resting(previous));
                    summary.failed += 1;
                    return None;
                }
                if let Some(fill) = self.fill_of(token_id, &previous).await {
                    self.bids.set(group, token_id, BidState::Absent);
                    return Some(fill);
                }
                match self.post_bid(token_id, price).await {
                    Some(bid) => {
                        self.bids.set(group, token_id, BidState::Resting(bid));
                        summary.replaced += 1;
                    }
                    None => {
                        self.bids.set(group, token_id, BidState::Absent);
                        summary.failed += 1;
                    }
                }
            }
            BidAction::Cancel { previous } => {
                if !self.cancel_bid(token_id, &previous).await {
                    summary.failed += 1;
                    return None;
                }
                self.bids.set(group, token_id, BidState::Absent);
                if let Some(fill) = self.fill_of(token_id, &previous).await {
                    return Some(fill);
                }
                summary.cancelled += 1;
            }
        }
        None
    }

    async fn post_bid(&self, token_id: &TokenId, price: Price) -> Option<RestingBid> {
        let size = pricing::leg_size(self.config.order_size, price, self.min_notional);
        let request = OrderRequest::buy(token_id.clone(), price, size, TimeInForce::Gtc);

        self.ctx.metrics.record_order_placed();
        let result = self.ctx.coordinator.orders().post_order(&request).await;
        self.ctx.metrics.record_order_result(result.is_ok());

        match result {
            Ok(ack) => {
                debug!(token_id = %token_id, order_id = %ack.order_id, price = %price, "Bid placed");
                Some(RestingBid {
                    order_id: ack.order_id,
                    price,
                    size,
                })
            }
            Err(e) => {
                warn!(token_id = %token_id, price = %price, error = %e, "Bid placement failed");
                None
            }
        }
    }

    async fn cancel_bid(&self, token_id: &TokenId, bid: &RestingBid) -> bool {
        match self.ctx.coordinator.orders().cancel_order(&bid.order_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(token_id = %token_id, order_id = %bid.order_id, error = %e, "Bid cancel failed");
                false
            }
        }
    }

    async fn fill_of(&self, token_id: &TokenId, bid: &RestingBid) -> Option<Fill> {
        match self.ctx.coordinator.orders().order_status(&bid.order_id).await {
            Ok(status) if status.has_fill() => Some(Fill {
                token_id: token_id.clone(),
                bid: bid.clone(),
                filled: status.filled_size(),
            }),
            Ok(_) => None,
            Err(e) => {
                debug!(order_id = %bid.order_id, error = %e, "Order status unavailable");
                None
            }
        }
    }

    async fn detect_fill(&self) -> Option<Fill> {
        for (token_id, bid) in self.bids.resting(self.group.name()) {
            if let Some(fill) = self.fill_of(&token_id, &bid).await {
                return Some(fill);
            }
        }
        None
    }

    /// Hedge the fill, withdraw all bids and start the cooldown. Bids that
    /// filled while being withdrawn are hedged too.
    async fn sweep(&mut self, fill: Fill) -> ExecutionReport {
        let hedged = fill.bid.order_id.clone();
        let report = self.hedge(fill).await;
        self.withdraw_bids(BidState::Swept, Some(&hedged)).await;
        self.cooldown_until = Some(Instant::now() + Duration::from_millis(self.config.cooldown_ms));
        report
    }

    /// Buy every other outcome for the filled quantity.
    async fn hedge(&self, fill: Fill) -> ExecutionReport {
        let captured_at = Instant::now();
        self.ctx.metrics.record_opportunity();
        self.ctx.metrics.record_sweep();
        info!(
            group = %self.group.name(),
            token_id = %fill.token_id,
            price = %fill.bid.price,
            filled = %fill.filled,
            "Resting bid filled, sweeping remaining outcomes"
        );

        let mut legs = Vec::with_capacity(self.group.len().saturating_sub(1));
        for token_id in self.group.outcomes() {
            if *token_id == fill.token_id {
                continue;
            }
            let quote = match self.ctx.cache.get(token_id).filter(|q| q.has_ask()) {
                Some(quote) => Some(quote),
                None => self.ctx.poller.refresh(token_id).await.filter(|q| q.has_ask()),
            };
            let Some(quote) = quote else {
                warn!(token_id = %token_id, "No ask for sweep leg, leaving it unhedged");
                continue;
            };
            legs.push(LegOrder {
                token_id: token_id.clone(),
                ask: quote.best_ask,
                size: pricing::leg_size(fill.filled, quote.best_ask, self.min_notional),
            });
        }

        let set_cost = fill.bid.price + legs.iter().map(|leg| leg.ask).sum::<Decimal>();
        let payout = Decimal::from(self.group.len().saturating_sub(1));
        let plan = ExecutionPlan {
            group: self.group.name().to_string(),
            legs,
            captured_at,
            expected_pnl: (payout - set_cost) * fill.filled,
        };

        let guard = self.ctx.coordinator.active().acquire(self.group.name()).await;
        self.ctx.coordinator.execute(guard, plan).await
    }

    /// Cancel every resting bid and leave each outcome in `after`.
    ///
    /// A bid whose cancel fails stays `Resting` so its fill is still seen,
    /// unless it is `hedged`, the bid whose fill has already been swept.
    async fn withdraw_bids(&self, after: BidState, hedged: Option<&OrderId>) {
        let group = self.group.name();
        let mut late = Vec::new();
        let mut kept = Vec::new();
        for (token_id, bid) in self.bids.resting(group) {
            if !self.cancel_bid(&token_id, &bid).await {
                if hedged != Some(&bid.order_id) {
                    kept.push(token_id);
                }
                continue;
            }
            if hedged != Some(&bid.order_id) {
                late.extend(self.fill_of(&token_id, &bid).await);
            }
        }
        for token_id in self.group.outcomes() {
            if !kept.contains(token_id) {
                self.bids.set(group, token_id, after.clone());
            }
        }
        for fill in late {
            warn!(
                group = %self.group.name(),
                token_id = %fill.token_id,
                filled = %fill.filled,
                "Bid filled while being withdrawn"
            );
            self.hedge(fill).await;
        }
    }

    /// Cancel every resting bid for the group.
    pub async fn cancel_all(&self) {
        let resting = self.bids.resting(self.group.name()).len();
        if resting > 0 {
            info!(group = %self.group.name(), bids = resting, "Cancelling resting bids");
        }
        self.withdraw_bids(BidState::Absent, None).await;
    }

    /// Cycle on every tick until shutdown, then cancel all resting bids.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(group = %self.group.name(), outcomes = self.group.len(), "Maker-taker strategy started");

        loop {
            tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }
            self.cycle().await;
        }

        self.cancel_all().await;
        info!(group = %self.group.name(), "Maker-taker strategy stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rust_decimal_macros::dec;

    use crate::application::cache::QuoteCache;
    use crate::application::execution::{ActiveExecutions, ExecutionCoordinator, ExecutionSettings};
    use crate::application::fallback::{FallbackPoller, FallbackSettings, FeedHealth, FeedState};
    use crate::application::feed::{FeedAdapter, FeedSettings};
    use crate::application::metrics::EngineMetrics;
    use crate::domain::pricing::DEFAULT_TICK;
    use crate::testkit::domain::{group, quote};
    use crate::error::Result;
    use crate::port::{OrderAck, OrderService, OrderStatus};
    use crate::testkit::exchange::{MockBookSource, MockOrderService};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    const IDS: [&str; 3] = ["a", "b", "c"];

    struct Harness {
        feed: Arc<FeedAdapter>,
        orders: Arc<MockOrderService>,
        bids: Arc<RestingBids>,
        metrics: Arc<EngineMetrics>,
        ctx: StrategyContext,
    }

    fn harness(orders: MockOrderService) -> Harness {
        let orders = Arc::new(orders);
        harness_with(Arc::clone(&orders), orders)
    }

    fn harness_with(orders: Arc<MockOrderService>, service: Arc<dyn OrderService>) -> Harness {
        let cache = Arc::new(QuoteCache::new());
        let metrics = Arc::new(EngineMetrics::new());
        let feed = Arc::new(FeedAdapter::new(
            vec![group("g", &IDS)],
            Arc::clone(&cache),
            Arc::clone(&metrics),
            FeedSettings {
                min_edge: dec!(0.01),
                default_budget: dec!(10),
                quote_max_age: Duration::ZERO,
            },
        ));
        let poller = Arc::new(FallbackPoller::new(
            Arc::new(MockBookSource::new()) as _,
            Arc::clone(&feed),
            FeedHealth::new(FeedState::Connected),
            Arc::clone(&metrics),
            FallbackSettings::default(),
        ));
        let coordinator = Arc::new(ExecutionCoordinator::new(
            service,
            Arc::new(ActiveExecutions::new()),
            Arc::clone(&cache),
            Arc::clone(&metrics),
            ExecutionSettings::default(),
        ));
        Harness {
            feed,
            orders,
            bids: Arc::new(RestingBids::new()),
            metrics: Arc::clone(&metrics),
            ctx: StrategyContext {
                cache,
                poller,
                coordinator,
                metrics,
                quote_max_age: Duration::ZERO,
            },
        }
    }

    fn strategy(h: &Harness, config: MakerTakerConfig, budget: Decimal) -> MakerTakerStrategy {
        MakerTakerStrategy::new(
            group("g", &IDS),
            budget,
            config,
            DEFAULT_TICK,
            dec!(1),
            h.ctx.clone(),
            Arc::clone(&h.bids),
        )
    }

    fn seed(h: &Harness, asks: [Decimal; 3]) {
        for (id, ask) in IDS.iter().zip(asks) {
            h.feed.ingest(TokenId::from(*id), quote(ask));
        }
    }

    /// Order service whose chosen bid trades just before its cancel lands.
    struct FillsOnCancel {
        inner: Arc<MockOrderService>,
        target: Mutex<Option<(OrderId, Decimal)>>,
    }

    impl FillsOnCancel {
        fn new(inner: Arc<MockOrderService>) -> Self {
            Self {
                inner,
                target: Mutex::new(None),
            }
        }

        /// Fill the current bid on `token` by `size` when it is next cancelled.
        fn arm(&self, bids: &RestingBids, token: &'static str, size: Decimal) {
            let order_id = bids
                .get("g", &TokenId::from(token))
                .resting()
                .map(|bid| bid.order_id.clone())
                .unwrap();
            *self.target.lock() = Some((order_id, size));
        }
    }

    #[async_trait]
    impl OrderService for FillsOnCancel {
        async fn post_order(&self, order: &OrderRequest) -> Result<OrderAck> {
            self.inner.post_order(order).await
        }

        async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
            let hit = {
                let mut target = self.target.lock();
                match target.as_ref() {
                    Some((id, _)) if id == order_id => target.take(),
                    _ => None,
                }
            };
            if let Some((id, size)) = hit {
                self.inner.fill_order(&id, size);
            }
            self.inner.cancel_order(order_id).await
        }

        async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatus> {
            self.inner.order_status(order_id).await
        }

        fn exchange_name(&self) -> &'static str {
            "mock"
        }
    }

    fn racy_harness() -> (Harness, Arc<FillsOnCancel>) {
        let orders = Arc::new(MockOrderService::new());
        let racy = Arc::new(FillsOnCancel::new(Arc::clone(&orders)));
        let h = harness_with(orders, Arc::clone(&racy) as Arc<dyn OrderService>);
        (h, racy)
    }

    fn fok_count(h: &Harness, token: &str) -> usize {
        h.orders
            .posted_for(token)
            .iter()
            .filter(|o| o.time_in_force == TimeInForce::Fok)
            .count()
    }

    fn bid_price(h: &Harness, id: &str) -> Option<Price> {
        h.bids
            .get("g", &TokenId::from(id))
            .resting()
            .map(|bid| bid.price)
    }

    #[tokio::test]
    async fn test_bids_rest_at_desired_prices() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));

        let Cycle::Repriced(summary) = strategy.cycle().await else {
            panic!("expected repricing");
        };

        assert_eq!(summary.placed, 3);
        // 1.99 - (0.62 + 0.64), 1.99 - (0.60 + 0.64), 1.99 - (0.60 + 0.62)
        assert_eq!(bid_price(&h, "a"), Some(dec!(0.73)));
        assert_eq!(bid_price(&h, "b"), Some(dec!(0.75)));
        assert_eq!(bid_price(&h, "c"), Some(dec!(0.77)));
        let posted = h.orders.posted();
        assert!(posted.iter().all(|o| o.time_in_force == TimeInForce::Gtc));
        assert!(posted.iter().all(|o| o.size == dec!(5)));
    }

    #[tokio::test]
    async fn test_unchanged_prices_keep_bids() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));

        strategy.cycle().await;
        let Cycle::Repriced(summary) = strategy.cycle().await else {
            panic!("expected repricing");
        };

        assert_eq!(summary, RepriceSummary::default());
        assert_eq!(h.orders.posted().len(), 3);
    }

    #[tokio::test]
    async fn test_price_move_replaces_bid() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;
        let old_a = h.bids.get("g", &TokenId::from("a")).resting().cloned().unwrap();

        h.feed.ingest(TokenId::from("c"), quote(dec!(0.66)));
        let Cycle::Repriced(summary) = strategy.cycle().await else {
            panic!("expected repricing");
        };

        // c's own bid does not depend on c's ask
        assert_eq!(summary.replaced, 2);
        assert!(h.orders.cancelled().contains(&old_a.order_id));
        assert_eq!(bid_price(&h, "a"), Some(dec!(0.71)));
        assert_eq!(bid_price(&h, "c"), Some(dec!(0.77)));
    }

    #[tokio::test]
    async fn test_non_viable_price_cancels_bid() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;

        seed(&h, [dec!(0.99), dec!(0.99), dec!(0.99)]);
        let Cycle::Repriced(summary) = strategy.cycle().await else {
            panic!("expected repricing");
        };

        assert_eq!(summary.cancelled, 3);
        assert!(h.bids.resting("g").is_empty());
    }

    #[tokio::test]
    async fn test_cancel_failure_keeps_bid_resting() {
        let h = harness(MockOrderService::new().fail_cancels());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;

        seed(&h, [dec!(0.99), dec!(0.99), dec!(0.99)]);
        let Cycle::Repriced(summary) = strategy.cycle().await else {
            panic!("expected repricing");
        };

        assert_eq!(summary.failed, 3);
        assert_eq!(h.bids.resting("g").len(), 3);
    }

    #[tokio::test]
    async fn test_missing_quote_skips_cycle() {
        let h = harness(MockOrderService::new());
        h.feed.ingest(TokenId::from("a"), quote(dec!(0.6)));
        h.feed.ingest(TokenId::from("b"), quote(dec!(0.6)));
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));

        assert!(matches!(strategy.cycle().await, Cycle::Incomplete));
        assert!(h.orders.posted().is_empty());
    }

    #[tokio::test]
    async fn test_over_budget_places_nothing() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(1));

        assert!(matches!(strategy.cycle().await, Cycle::OverBudget));
        assert!(h.orders.posted().is_empty());
    }

    #[tokio::test]
    async fn test_fill_sweeps_other_outcomes_and_cools_down() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;
        h.orders.fill_latest("a", dec!(5)).unwrap();

        let Cycle::Swept(report) = strategy.cycle().await else {
            panic!("expected sweep");
        };

        assert!(report.is_success());
        let swept: Vec<_> = report.legs.iter().map(|l| l.token_id.as_str()).collect();
        assert_eq!(swept, vec!["b", "c"]);
        assert!(report.legs.iter().all(|l| l.size == dec!(5)));
        assert_eq!(h.orders.posted_for("b").last().unwrap().time_in_force, TimeInForce::Fok);
        assert_eq!(h.orders.cancelled().len(), 3);
        assert!(h.bids.get("g", &TokenId::from("b")).is_swept());
        assert!(!strategy.ctx.coordinator.active().is_active("g"));

        let snap = h.metrics.snapshot();
        assert_eq!(snap.sweeps, 1);
        // (2 - (0.73 + 0.62 + 0.64)) * 5
        assert_eq!(snap.expected_pnl, dec!(0.05));

        assert!(matches!(strategy.cycle().await, Cycle::Cooling));
    }

    #[tokio::test]
    async fn test_partial_fill_sweeps_matched_quantity() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;
        h.orders.fill_latest("b", dec!(2)).unwrap();

        let Cycle::Swept(report) = strategy.cycle().await else {
            panic!("expected sweep");
        };

        assert!(report.legs.iter().all(|l| l.size == dec!(2)));
        assert!(h.bids.resting("g").is_empty());
    }

    #[tokio::test]
    async fn test_quoting_resumes_after_cooldown() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let config = MakerTakerConfig {
            cooldown_ms: 0,
            ..MakerTakerConfig::default()
        };
        let mut strategy = strategy(&h, config, dec!(10));
        strategy.cycle().await;
        h.orders.fill_latest("c", dec!(5)).unwrap();
        assert!(matches!(strategy.cycle().await, Cycle::Swept(_)));

        let Cycle::Repriced(summary) = strategy.cycle().await else {
            panic!("expected repricing");
        };
        assert_eq!(summary.placed, 3);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_resting_bids() {
        let h = harness(MockOrderService::new());
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let config = MakerTakerConfig {
            poll_interval_ms: 10,
            ..MakerTakerConfig::default()
        };
        let strategy = strategy(&h, config, dec!(10));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(strategy.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.bids.resting("g").len(), 3);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(h.bids.resting("g").is_empty());
        assert_eq!(h.orders.cancelled().len(), 3);
    }

    #[tokio::test]
    async fn test_fill_racing_a_replace_is_swept() {
        let (h, racy) = racy_harness();
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;
        racy.arm(&h.bids, "a", dec!(2));

        h.feed.ingest(TokenId::from("c"), quote(dec!(0.66)));
        let Cycle::Swept(report) = strategy.cycle().await else {
            panic!("expected sweep");
        };

        let swept: Vec<_> = report.legs.iter().map(|l| l.token_id.as_str()).collect();
        assert_eq!(swept, vec!["b", "c"]);
        assert!(report.legs.iter().all(|l| l.size == dec!(2)));
        // the filled bid is not reposted
        assert_eq!(h.orders.posted_for("a").len(), 1);
        assert!(h.bids.resting("g").is_empty());
        assert_eq!(h.metrics.snapshot().sweeps, 1);
        assert!(matches!(strategy.cycle().await, Cycle::Cooling));
    }

    #[tokio::test]
    async fn test_fill_racing_a_cancel_is_swept() {
        let (h, racy) = racy_harness();
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;
        racy.arm(&h.bids, "a", dec!(5));

        seed(&h, [dec!(0.99), dec!(0.99), dec!(0.99)]);
        let Cycle::Swept(report) = strategy.cycle().await else {
            panic!("expected sweep");
        };

        assert_eq!(report.legs.len(), 2);
        assert!(report.legs.iter().all(|l| l.size == dec!(5)));
        assert_eq!(fok_count(&h, "b"), 1);
        assert_eq!(fok_count(&h, "c"), 1);
        assert_eq!(h.metrics.snapshot().sweeps, 1);
    }

    #[tokio::test]
    async fn test_fill_racing_withdrawal_is_hedged_once() {
        let (h, racy) = racy_harness();
        seed(&h, [dec!(0.60), dec!(0.62), dec!(0.64)]);
        let mut strategy = strategy(&h, MakerTakerConfig::default(), dec!(10));
        strategy.cycle().await;
        h.orders.fill_latest("a", dec!(5)).unwrap();
        racy.arm(&h.bids, "b", dec!(2));

        assert!(matches!(strategy.cycle().await, Cycle::Swept(_)));

        // a's fill hedged by buying b and c; b's late fill by buying a and c
        assert_eq!(h.metrics.snapshot().sweeps, 2);
        assert_eq!(fok_count(&h, "a"), 1);
        assert_eq!(fok_count(&h, "b"), 1);
        assert_eq!(fok_count(&h, "c"), 2);
        assert_eq!(h.orders.posted_for("a").last().unwrap().size, dec!(2));
        assert!(h.bids.resting("g").is_empty());
    }
}
