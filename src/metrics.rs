//! Engine counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct EngineMetrics {
    start_time: Instant,
    ticks: AtomicU64,
    tick_failures: AtomicU64,
    ticks_skipped: AtomicU64,
    rounds_opened: AtomicU64,
    rounds_archived: AtomicU64,
    wagers_placed: AtomicU64,
    wagers_settled: AtomicU64,
    wins_credited: AtomicU64,
    settlement_failures: AtomicU64,
    amount_paid: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub ticks: u64,
    pub tick_failures: u64,
    pub ticks_skipped: u64,
    pub rounds_opened: u64,
    pub rounds_archived: u64,
    pub wagers_placed: u64,
    pub wagers_settled: u64,
    pub wins_credited: u64,
    pub settlement_failures: u64,
    /// Minor units
    pub amount_paid: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: AtomicU64::new(0),
            tick_failures: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            rounds_opened: AtomicU64::new(0),
            rounds_archived: AtomicU64::new(0),
            wagers_placed: AtomicU64::new(0),
            wagers_settled: AtomicU64::new(0),
            wins_credited: AtomicU64::new(0),
            settlement_failures: AtomicU64::new(0),
            amount_paid: AtomicU64::new(0),
        }
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_failure(&self) {
        self.tick_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_opened(&self) {
        self.rounds_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_round_archived(&self) {
        self.rounds_archived.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wager_placed(&self) {
        self.wagers_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settlement(&self, settled: u64, credited: u64, failed: u64, paid: u64) {
        self.wagers_settled.fetch_add(settled, Ordering::Relaxed);
        self.wins_credited.fetch_add(credited, Ordering::Relaxed);
        self.settlement_failures.fetch_add(failed, Ordering::Relaxed);
        self.amount_paid.fetch_add(paid, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.uptime().as_secs(),
            ticks: self.ticks.load(Ordering::Relaxed),
            tick_failures: self.tick_failures.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            rounds_opened: self.rounds_opened.load(Ordering::Relaxed),
            rounds_archived: self.rounds_archived.load(Ordering::Relaxed),
            wagers_placed: self.wagers_placed.load(Ordering::Relaxed),
            wagers_settled: self.wagers_settled.load(Ordering::Relaxed),
            wins_credited: self.wins_credited.load(Ordering::Relaxed),
            settlement_failures: self.settlement_failures.load(Ordering::Relaxed),
            amount_paid: self.amount_paid.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = EngineMetrics::new();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_tick_failure();
        metrics.record_settlement(3, 1, 1, 3900);
        metrics.record_settlement(1, 0, 0, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.tick_failures, 1);
        assert_eq!(snapshot.wagers_settled, 4);
        assert_eq!(snapshot.wins_credited, 1);
        assert_eq!(snapshot.amount_paid, 3900);
    }
}
