//! Engine counters and latency aggregates.
//!
//! One [`EngineMetrics`] is created per engine and shared by `Arc` with every
//! component that records into it. Counters are atomics; latency samples are
//! appended to bounded windows and only read for aggregate statistics.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

/// Most recent samples retained per latency kind.
const MAX_SAMPLES: usize = 10_000;

/// Append-only window of latency samples.
pub struct LatencyRecorder {
    samples: RwLock<VecDeque<Duration>>,
    max_samples: usize,
}

/// Aggregate view of a latency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySummary {
    pub count: usize,
    pub mean: Duration,
    pub p99: Duration,
}

impl LatencyRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }

    #[must_use]
    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            samples: RwLock::new(VecDeque::with_capacity(max_samples.min(1024))),
            max_samples: max_samples.max(1),
        }
    }

    pub fn record(&self, sample: Duration) {
        let mut samples = self.samples.write();
        samples.push_back(sample);
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
    }

    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        let mut sorted: Vec<Duration> = self.samples.read().iter().copied().collect();
        if sorted.is_empty() {
            return LatencySummary::default();
        }
        sorted.sort_unstable();

        let total: Duration = sorted.iter().sum();
        let count = sorted.len();
        LatencySummary {
            count,
            mean: total / u32::try_from(count).unwrap_or(u32::MAX),
            p99: percentile(&sorted, 0.99),
        }
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let index = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Counters and latencies for the whole engine.
#[derive(Default)]
pub struct EngineMetrics {
    opportunities_found: AtomicU64,
    opportunities_over_budget: AtomicU64,
    executions_started: AtomicU64,
    executions_completed: AtomicU64,
    orders_placed: AtomicU64,
    orders_succeeded: AtomicU64,
    orders_failed: AtomicU64,
    signals_sent: AtomicU64,
    signals_dropped: AtomicU64,
    polls: AtomicU64,
    poll_failures: AtomicU64,
    sweeps: AtomicU64,
    expected_pnl: Mutex<Decimal>,
    capture_to_order: LatencyRecorder,
    order_execution: LatencyRecorder,
}

/// Point-in-time copy of every counter and aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub opportunities_found: u64,
    pub opportunities_over_budget: u64,
    pub executions_started: u64,
    pub executions_completed: u64,
    pub orders_placed: u64,
    pub orders_succeeded: u64,
    pub orders_failed: u64,
    pub signals_sent: u64,
    pub signals_dropped: u64,
    pub polls: u64,
    pub poll_failures: u64,
    pub sweeps: u64,
    pub expected_pnl: Decimal,
    pub capture_to_order: LatencySummary,
    pub order_execution: LatencySummary,
}

impl EngineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_opportunity(&self) {
        self.opportunities_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_over_budget(&self) {
        self.opportunities_over_budget.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_execution_started(&self) {
        self.executions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// An execution where every leg succeeded.
    pub fn record_execution_completed(&self, expected_pnl: Decimal) {
        self.executions_completed.fetch_add(1, Ordering::Relaxed);
        *self.expected_pnl.lock() += expected_pnl;
    }

    pub fn record_order_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_order_result(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.orders_succeeded
        } else {
            &self.orders_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signal(&self, delivered: bool) {
        let counter = if delivered {
            &self.signals_sent
        } else {
            &self.signals_dropped
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll(&self, succeeded: bool) {
        self.polls.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.poll_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    /// Time from quote capture to order submission.
    pub fn record_capture_to_order(&self, latency: Duration) {
        self.capture_to_order.record(latency);
    }

    /// Time from order submission to exchange response.
    pub fn record_order_execution(&self, latency: Duration) {
        self.order_execution.record(latency);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            opportunities_found: self.opportunities_found.load(Ordering::Relaxed),
            opportunities_over_budget: self.opportunities_over_budget.load(Ordering::Relaxed),
            executions_started: self.executions_started.load(Ordering::Relaxed),
            executions_completed: self.executions_completed.load(Ordering::Relaxed),
            orders_placed: self.orders_placed.load(Ordering::Relaxed),
            orders_succeeded: self.orders_succeeded.load(Ordering::Relaxed),
            orders_failed: self.orders_failed.load(Ordering::Relaxed),
            signals_sent: self.signals_sent.load(Ordering::Relaxed),
            signals_dropped: self.signals_dropped.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            expected_pnl: *self.expected_pnl.lock(),
            capture_to_order: self.capture_to_order.summary(),
            order_execution: self.order_execution.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_recorder_summarizes_to_zero() {
        assert_eq!(LatencyRecorder::new().summary(), LatencySummary::default());
    }

    #[test]
    fn summary_reports_mean_and_p99() {
        let recorder = LatencyRecorder::new();
        for ms in 1..=100 {
            recorder.record(Duration::from_millis(ms));
        }

        let summary = recorder.summary();
        assert_eq!(summary.count, 100);
        assert_eq!(summary.mean, Duration::from_micros(50_500));
        assert_eq!(summary.p99, Duration::from_millis(99));
    }

    #[test]
    fn window_drops_oldest_samples() {
        let recorder = LatencyRecorder::with_capacity(3);
        for ms in [500, 1, 2, 3] {
            recorder.record(Duration::from_millis(ms));
        }
        let summary = recorder.summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.p99, Duration::from_millis(3));
    }

    #[test]
    fn order_results_split_into_success_and_failure() {
        let metrics = EngineMetrics::new();
        metrics.record_order_placed();
        metrics.record_order_placed();
        metrics.record_order_result(true);
        metrics.record_order_result(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.orders_placed, 2);
        assert_eq!(snap.orders_succeeded, 1);
        assert_eq!(snap.orders_failed, 1);
    }

    #[test]
    fn completed_executions_accumulate_pnl() {
        let metrics = EngineMetrics::new();
        metrics.record_execution_completed(dec!(0.25));
        metrics.record_execution_completed(dec!(1.5));

        let snap = metrics.snapshot();
        assert_eq!(snap.executions_completed, 2);
        assert_eq!(snap.expected_pnl, dec!(1.75));
    }
}
