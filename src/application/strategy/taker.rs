//! Taker strategy: buy every liquid outcome when the set is underpriced.
//!
//! In a group of mutually exclusive outcomes at most one resolves YES, so
//! holding one NO share of each of `k` outcomes pays at least `k - 1`. When
//! the sum of the `k` best asks falls below that by more than `min_edge` and
//! the set fits the group's budget, every leg is bought at once.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::context::StrategyContext;
use crate::application::execution::{ExecutionPlan, ExecutionReport, LegOrder};
use crate::application::feed::GroupSignal;
use crate::application::lifecycle::wait_for_shutdown;
use crate::domain::{
    group::MarketGroup, opportunity::ArbitrageOpportunity, opportunity::Decision,
    opportunity::OpportunityLeg, pricing,
};

/// Configuration for the taker strategy.
#[derive(Debug, Clone, Deserialize)]
pub struct TakerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Edge (payout minus cost) that must be exceeded to execute.
    #[serde(default = "default_min_edge")]
    pub min_edge: Decimal,

    /// Evaluation tick for each group.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Shares bought per leg before the minimum-notional bump.
    #[serde(default = "default_order_size")]
    pub order_size: Decimal,

    /// Illiquid outcomes re-fetched over REST per evaluation.
    #[serde(default = "default_max_sync_checks")]
    pub max_sync_checks: usize,

    /// Capacity of each group's signal queue.
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,
}

const fn default_enabled() -> bool {
    true
}

fn default_min_edge() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

const fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_order_size() -> Decimal {
    Decimal::ONE
}

const fn default_max_sync_checks() -> usize {
    3
}

const fn default_signal_capacity() -> usize {
    64
}

impl Default for TakerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_edge: default_min_edge(),
            poll_interval_ms: default_poll_interval_ms(),
            order_size: default_order_size(),
            max_sync_checks: default_max_sync_checks(),
            signal_capacity: default_signal_capacity(),
        }
    }
}

/// Result of one evaluation.
#[derive(Debug)]
pub enum Evaluation {
    /// Fewer than two liquid outcomes.
    Insufficient { liquid: usize },
    BelowEdge(ArbitrageOpportunity),
    OverBudget(ArbitrageOpportunity),
    /// A leg sized to zero shares.
    TooSmall(ArbitrageOpportunity),
    /// An execution is already in flight for the group.
    Busy(ArbitrageOpportunity),
    Started(JoinHandle<ExecutionReport>),
}

/// Per-group taker loop.
pub struct TakerStrategy {
    group: MarketGroup,
    budget: Decimal,
    config: TakerConfig,
    min_notional: Decimal,
    ctx: StrategyContext,
}

impl TakerStrategy {
    #[must_use]
    pub fn new(
        group: MarketGroup,
        budget: Decimal,
        config: TakerConfig,
        min_notional: Decimal,
        ctx: StrategyContext,
    ) -> Self {
        Self {
            group,
            budget,
            config,
            min_notional,
            ctx,
        }
    }

    #[must_use]
    pub fn group(&self) -> &MarketGroup {
        &self.group
    }

    /// Price the group from one cache snapshot and start an execution if it
    /// qualifies.
    ///
    /// `captured_at` is the signal's capture time; ticks use the snapshot
    /// time.
    pub async fn evaluate(&self, captured_at: Option<Instant>) -> Evaluation {
        let snapshot_at = Instant::now();
        let mut quotes = self.ctx.snapshot(self.group.outcomes());

        let mut checks = 0;
        for (token_id, slot) in self.group.outcomes().iter().zip(quotes.iter_mut()) {
            if checks >= self.config.max_sync_checks {
                break;
            }
            if self.ctx.is_liquid(slot.as_ref(), snapshot_at) {
                continue;
            }
            checks += 1;
            debug!(group = %self.group.name(), token_id = %token_id, "Double-checking illiquid outcome");
            if let Some(fresh) = self.ctx.poller.refresh(token_id).await {
                *slot = Some(fresh);
            }
        }

        let now = Instant::now();
        let legs: Vec<OpportunityLeg> = self
            .group
            .outcomes()
            .iter()
            .zip(&quotes)
            .filter(|(_, quote)| self.ctx.is_liquid(quote.as_ref(), now))
            .filter_map(|(token_id, quote)| {
                quote.map(|q| OpportunityLeg::new(token_id.clone(), q.best_ask, q.best_ask_size))
            })
            .collect();
        let liquid = legs.len();

        let Some(opportunity) = ArbitrageOpportunity::evaluate(
            self.group.name(),
            legs,
            self.config.min_edge,
            self.budget,
            captured_at.unwrap_or(snapshot_at),
        ) else {
            return Evaluation::Insufficient { liquid };
        };

        match opportunity.decision() {
            Decision::BelowEdge => Evaluation::BelowEdge(opportunity),
            Decision::OverBudget => {
                self.ctx.metrics.record_opportunity();
                self.ctx.metrics.record_over_budget();
                info!(
                    group = %self.group.name(),
                    cost = %opportunity.cost(),
                    budget = %self.budget,
                    edge = %opportunity.edge(),
                    "Opportunity skipped, cost exceeds budget"
                );
                Evaluation::OverBudget(opportunity)
            }
            Decision::Execute => {
                self.ctx.metrics.record_opportunity();
                self.execute(opportunity)
            }
        }
    }

    fn execute(&self, opportunity: ArbitrageOpportunity) -> Evaluation {
        let legs: Vec<LegOrder> = opportunity
            .legs()
            .iter()
            .map(|leg| LegOrder {
                token_id: leg.token_id().clone(),
                ask: leg.ask(),
                size: pricing::leg_size(self.config.order_size, leg.ask(), self.min_notional),
            })
            .collect();

        if legs.iter().any(|leg| leg.size <= Decimal::ZERO) {
            warn!(group = %self.group.name(), "Opportunity skipped, leg size is zero");
            return Evaluation::TooSmall(opportunity);
        }

        let hedged = legs
            .iter()
            .map(|leg| leg.size)
            .min()
            .unwrap_or(Decimal::ZERO);

        info!(
            group = %self.group.name(),
            k = opportunity.k(),
            outcomes = self.group.len(),
            cost = %opportunity.cost(),
            payout = %opportunity.payout(),
            edge = %opportunity.edge(),
            edge_pct = %opportunity.edge_percent().round_dp(2),
            "Negative-risk opportunity detected"
        );

        let plan = ExecutionPlan {
            group: self.group.name().to_string(),
            legs,
            captured_at: opportunity.captured_at(),
            expected_pnl: opportunity.edge() * hedged,
        };

        match self.ctx.coordinator.try_spawn(plan) {
            Some(handle) => Evaluation::Started(handle),
            None => Evaluation::Busy(opportunity),
        }
    }

    /// Evaluate on every tick and every signal until shutdown.
    pub async fn run(
        self,
        mut signals: mpsc::Receiver<GroupSignal>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.reset();
        let mut signals_open = true;

        info!(group = %self.group.name(), outcomes = self.group.len(), "Taker strategy started");

        loop {
            let captured_at = tokio::select! {
                () = wait_for_shutdown(&mut shutdown) => break,
                _ = ticker.tick() => None,
                signal = signals.recv(), if signals_open => match signal {
                    Some(signal) => Some(signal.captured_at),
                    None => {
                        signals_open = false;
                        continue;
                    }
                },
            };
            self.evaluate(captured_at).await;
        }

        info!(group = %self.group.name(), "Taker strategy stopped");
    }
}
