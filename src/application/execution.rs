//! Multi-leg execution with per-group mutual exclusion.
//!
//! Every execution holds an [`ExecutionGuard`] for its group. The guard is
//! the only lock the engine needs for correctness: while it is alive no other
//! execution for the same group can start. It is released when the last leg
//! has returned, whatever the outcome, so a failed execution never blocks the
//! next qualifying cycle.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::cache::QuoteCache;
use crate::application::metrics::EngineMetrics;
use crate::domain::{
    id::OrderId, id::TokenId, money::Price, money::Volume, pricing, pricing::DEFAULT_TICK,
};
use crate::port::{OrderRequest, OrderService, TimeInForce};

// ---------------------------------------------------------------------------
// Active execution flags
// ---------------------------------------------------------------------------

/// Set of groups with an execution in flight.
#[derive(Default)]
pub struct ActiveExecutions {
    active: Mutex<HashSet<String>>,
    released: Notify,
}

/// Holds a group's execution flag; clears it on drop.
#[must_use = "the execution flag is released as soon as the guard is dropped"]
pub struct ExecutionGuard {
    owner: Arc<ActiveExecutions>,
    group: String,
}

impl ActiveExecutions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag for `group` if it is clear.
    pub fn try_acquire(self: &Arc<Self>, group: &str) -> Option<ExecutionGuard> {
        if !self.active.lock().insert(group.to_string()) {
            return None;
        }
        Some(ExecutionGuard {
            owner: Arc::clone(self),
            group: group.to_string(),
        })
    }

    /// Wait until the flag for `group` is clear, then set it.
    pub async fn acquire(self: &Arc<Self>, group: &str) -> ExecutionGuard {
        loop {
            let released = self.released.notified();
            if let Some(guard) = self.try_acquire(group) {
                return guard;
            }
            released.await;
        }
    }

    #[must_use]
    pub fn is_active(&self, group: &str) -> bool {
        self.active.lock().contains(group)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    fn release(&self, group: &str) {
        self.active.lock().remove(group);
        self.released.notify_waiters();
    }
}

impl ExecutionGuard {
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        self.owner.release(&self.group);
    }
}

// ---------------------------------------------------------------------------
// Plans and reports
// ---------------------------------------------------------------------------

/// One leg to buy: the reference ask and the size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegOrder {
    pub token_id: TokenId,
    pub ask: Price,
    pub size: Volume,
}

/// A set of legs to place together.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub group: String,
    pub legs: Vec<LegOrder>,
    /// When the quotes behind this plan were read.
    pub captured_at: Instant,
    /// Expected profit if every leg fills.
    pub expected_pnl: Decimal,
}

/// Result of one leg.
#[derive(Debug, Clone)]
pub struct LegOutcome {
    pub token_id: TokenId,
    pub limit_price: Price,
    pub size: Volume,
    pub result: Result<OrderId, String>,
    pub response_latency: Duration,
}

impl LegOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-leg results of one execution.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub group: String,
    pub legs: Vec<LegOutcome>,
}

impl ExecutionReport {
    /// True only when there were legs and every one succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.legs.is_empty() && self.legs.iter().all(LegOutcome::is_success)
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.legs.len() - self.succeeded()
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Price-grid settings applied to taker legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSettings {
    /// Fraction added to the ask (0.01 = 1% through the touch).
    pub price_nudge: Decimal,
    /// Tick used when the exchange never pushed one for a token.
    pub default_tick: Price,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            price_nudge: Decimal::new(1, 2),
            default_tick: DEFAULT_TICK,
        }
    }
}

#[derive(Default)]
struct InFlightTracker {
    count: AtomicUsize,
    idle: Notify,
}

struct InFlight(Arc<InFlightTracker>);

impl InFlight {
    fn begin(tracker: &Arc<InFlightTracker>) -> Self {
        tracker.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(tracker))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Places every leg of a plan concurrently and reconciles the results.
pub struct ExecutionCoordinator {
    orders: Arc<dyn OrderService>,
    active: Arc<ActiveExecutions>,
    cache: Arc<QuoteCache>,
    metrics: Arc<EngineMetrics>,
    settings: ExecutionSettings,
    in_flight: Arc<InFlightTracker>,
}

impl ExecutionCoordinator {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderService>,
        active: Arc<ActiveExecutions>,
        cache: Arc<QuoteCache>,
        metrics: Arc<EngineMetrics>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            orders,
            active,
            cache,
            metrics,
            settings,
            in_flight: Arc::default(),
        }
    }

    #[must_use]
    pub fn active(&self) -> &Arc<ActiveExecutions> {
        &self.active
    }

    #[must_use]
    pub fn orders(&self) -> &Arc<dyn OrderService> {
        &self.orders
    }

    /// Start an execution in the background if the group is idle.
    ///
    /// Returns `None` without side effects when an execution is already in
    /// flight for the group.
    pub fn try_spawn(self: &Arc<Self>, plan: ExecutionPlan) -> Option<JoinHandle<ExecutionReport>> {
        let Some(guard) = self.active.try_acquire(&plan.group) else {
            debug!(group = %plan.group, "Execution already in flight, skipping");
            return None;
        };
        let in_flight = InFlight::begin(&self.in_flight);
        let coordinator = Arc::clone(self);
        Some(tokio::spawn(async move {
            coordinator.run(guard, plan, in_flight).await
        }))
    }

    /// Run a plan to completion under an already acquired guard.
    ///
    /// The guard is released only after every leg has returned.
    pub async fn execute(&self, guard: ExecutionGuard, plan: ExecutionPlan) -> ExecutionReport {
        let in_flight = InFlight::begin(&self.in_flight);
        self.run(guard, plan, in_flight).await
    }

    async fn run(
        &self,
        guard: ExecutionGuard,
        plan: ExecutionPlan,
        _in_flight: InFlight,
    ) -> ExecutionReport {
        self.metrics.record_execution_started();
        info!(
            group = %plan.group,
            legs = plan.legs.len(),
            expected_pnl = %plan.expected_pnl,
            "Executing legs"
        );

        let legs = join_all(
            plan.legs
                .iter()
                .map(|leg| self.place_leg(leg, plan.captured_at)),
        )
        .await;

        let report = ExecutionReport {
            group: plan.group,
            legs,
        };

        if report.is_success() {
            self.metrics.record_execution_completed(plan.expected_pnl);
            info!(group = %report.group, legs = report.legs.len(), "All legs executed successfully");
        } else {
            let errors: Vec<&str> = report
                .legs
                .iter()
                .filter_map(|leg| leg.result.as_ref().err().map(String::as_str))
                .collect();
            warn!(
                group = %report.group,
                succeeded = report.succeeded(),
                failed = report.failed(),
                errors = ?errors,
                "Execution incomplete, filled legs are kept"
            );
        }

        drop(guard);
        report
    }

    async fn place_leg(&self, leg: &LegOrder, captured_at: Instant) -> LegOutcome {
        let tick = self.cache.tick_size(&leg.token_id, self.settings.default_tick);
        let limit_price = pricing::taker_price(leg.ask, self.settings.price_nudge, tick);
        let request = OrderRequest::buy(leg.token_id.clone(), limit_price, leg.size, TimeInForce::Fok);

        let submitted_at = Instant::now();
        self.metrics
            .record_capture_to_order(submitted_at.saturating_duration_since(captured_at));
        self.metrics.record_order_placed();

        let result = self.orders.post_order(&request).await;
        let response_latency = submitted_at.elapsed();
        self.metrics.record_order_execution(response_latency);
        self.metrics.record_order_result(result.is_ok());

        let result = match result {
            Ok(ack) => {
                debug!(
                    token_id = %leg.token_id,
                    order_id = %ack.order_id,
                    price = %limit_price,
                    size = %leg.size,
                    "Leg placed"
                );
                Ok(ack.order_id)
            }
            Err(e) => {
                warn!(token_id = %leg.token_id, error = %e, "Leg failed");
                Err(e.to_string())
            }
        };

        LegOutcome {
            token_id: leg.token_id.clone(),
            limit_price,
            size: leg.size,
            result,
            response_latency,
        }
    }

    /// Number of executions currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Wait until no execution is running.
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            idle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::exchange::MockOrderService;
    use rust_decimal_macros::dec;

    fn plan(group: &str, tokens: &[&str]) -> ExecutionPlan {
        ExecutionPlan {
            group: group.to_string(),
            legs: tokens
                .iter()
                .map(|t| LegOrder {
                    token_id: TokenId::from(*t),
                    ask: dec!(0.30),
                    size: dec!(10),
                })
                .collect(),
            captured_at: Instant::now(),
            expected_pnl: dec!(1),
        }
    }

    fn coordinator(orders: Arc<MockOrderService>) -> Arc<ExecutionCoordinator> {
        Arc::new(ExecutionCoordinator::new(
            orders,
            Arc::new(ActiveExecutions::new()),
            Arc::new(QuoteCache::new()),
            Arc::new(EngineMetrics::new()),
            ExecutionSettings::default(),
        ))
    }

    #[test]
    fn test_flag_is_exclusive_per_group() {
        let active = Arc::new(ActiveExecutions::new());

        let first = active.try_acquire("g1");
        assert!(first.is_some());
        assert!(active.try_acquire("g1").is_none());
        assert!(active.try_acquire("g2").is_some());

        drop(first);
        assert!(!active.is_active("g1"));
        assert!(active.try_acquire("g1").is_some());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let active = Arc::new(ActiveExecutions::new());
        let guard = active.try_acquire("g").unwrap();

        let waiter = {
            let active = Arc::clone(&active);
            tokio::spawn(async move { active.acquire("g").await.group().to_string() })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(waiter.await.unwrap(), "g");
    }

    #[tokio::test]
    async fn test_legs_use_nudged_fok_prices() {
        let orders = Arc::new(MockOrderService::new());
        let coordinator = coordinator(Arc::clone(&orders));

        let report = coordinator
            .try_spawn(plan("g", &["a", "b"]))
            .unwrap()
            .await
            .unwrap();

        assert!(report.is_success());
        let posted = orders.posted();
        assert_eq!(posted.len(), 2);
        assert!(posted.iter().all(|o| o.price == dec!(0.31)));
        assert!(posted.iter().all(|o| o.time_in_force == TimeInForce::Fok));
    }

    #[tokio::test]
    async fn test_partial_failure_clears_flag_and_credits_nothing() {
        let orders = Arc::new(MockOrderService::new().fail_token("b"));
        let coordinator = coordinator(Arc::clone(&orders));

        let report = coordinator
            .try_spawn(plan("g", &["a", "b", "c"]))
            .unwrap()
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!coordinator.active().is_active("g"));

        let snap = coordinator.metrics.snapshot();
        assert_eq!(snap.orders_placed, 3);
        assert_eq!(snap.orders_failed, 1);
        assert_eq!(snap.executions_completed, 0);
        assert_eq!(snap.expected_pnl, Decimal::ZERO);
        assert_eq!(snap.capture_to_order.count, 3);
        assert_eq!(snap.order_execution.count, 3);
    }

    #[tokio::test]
    async fn test_second_spawn_is_rejected_while_in_flight() {
        let orders = Arc::new(MockOrderService::new().with_delay(Duration::from_millis(50)));
        let coordinator = coordinator(orders);

        let first = coordinator.try_spawn(plan("g", &["a", "b"])).unwrap();
        assert!(coordinator.try_spawn(plan("g", &["a", "b"])).is_none());
        assert_eq!(coordinator.in_flight(), 1);

        // still one once the spawned task is placing legs
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(coordinator.in_flight(), 1);

        first.await.unwrap();
        coordinator.wait_idle().await;
        assert_eq!(coordinator.in_flight(), 0);
        assert!(coordinator.try_spawn(plan("g", &["a", "b"])).is_some());
    }

    #[tokio::test]
    async fn test_success_credits_expected_pnl() {
        let orders = Arc::new(MockOrderService::new());
        let coordinator = coordinator(orders);

        coordinator
            .try_spawn(plan("g", &["a", "b"]))
            .unwrap()
            .await
            .unwrap();

        let snap = coordinator.metrics.snapshot();
        assert_eq!(snap.executions_completed, 1);
        assert_eq!(snap.expected_pnl, dec!(1));
    }
}
