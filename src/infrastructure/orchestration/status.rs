//! Periodic status line.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::application::lifecycle::wait_for_shutdown;
use crate::application::snapshot::EngineView;

fn millis(duration: Duration) -> u128 {
    duration.as_millis()
}

/// Log engine counters and latency aggregates once.
pub(crate) fn log_status(view: &EngineView, label: &'static str) {
    let metrics = view.metrics();
    info!(
        feed = ?view.feed_state(),
        opportunities = metrics.opportunities_found,
        over_budget = metrics.opportunities_over_budget,
        executions_started = metrics.executions_started,
        executions_completed = metrics.executions_completed,
        orders_placed = metrics.orders_placed,
        orders_failed = metrics.orders_failed,
        signals_dropped = metrics.signals_dropped,
        polls = metrics.polls,
        poll_failures = metrics.poll_failures,
        sweeps = metrics.sweeps,
        resting_bids = view.resting_bids(),
        expected_pnl = %metrics.expected_pnl,
        capture_to_order_count = metrics.capture_to_order.count,
        capture_to_order_mean_ms = millis(metrics.capture_to_order.mean),
        capture_to_order_p99_ms = millis(metrics.capture_to_order.p99),
        order_execution_count = metrics.order_execution.count,
        order_execution_mean_ms = millis(metrics.order_execution.mean),
        order_execution_p99_ms = millis(metrics.order_execution.p99),
        "{label}"
    );

    for group in view.groups() {
        let quoted = group.outcomes.iter().filter(|o| o.quote.is_some()).count();
        match group.economics {
            Some(economics) => debug!(
                group = %group.name,
                quoted,
                outcomes = group.outcomes.len(),
                cost = %economics.cost,
                payout = %economics.payout,
                edge = %economics.edge,
                executing = group.executing,
                "Group status"
            ),
            None => debug!(
                group = %group.name,
                quoted,
                outcomes = group.outcomes.len(),
                "Group status: not enough liquid outcomes"
            ),
        }
    }
}

/// Log the status line every `interval` until shutdown.
pub(crate) async fn run_status(
    view: EngineView,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.reset();

    loop {
        tokio::select! {
            () = wait_for_shutdown(&mut shutdown) => break,
            _ = ticker.tick() => log_status(&view, "Status"),
        }
    }
}
