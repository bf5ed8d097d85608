//! # Sync Metrics
//!
//! Counters for the fetch pipeline: how many reads started, settled, failed,
//! were skipped because one was already running, or were dropped on arrival.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMetrics {
    pub fetches_started: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    /// Ticks that found a request already in flight
    pub ticks_skipped: u64,
    /// Responses older than what the cache already held
    pub stale_discarded: u64,
    /// Responses that arrived after their subscription ended
    pub cancelled_discarded: u64,
    pub mutations_succeeded: u64,
    pub mutations_failed: u64,
    pub average_fetch_duration: Duration,
    pub last_fetch_duration: Option<Duration>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch_start(&mut self) {
        self.fetches_started += 1;
    }

    pub fn record_fetch_success(&mut self, duration: Duration) {
        self.last_fetch_duration = Some(duration);
        self.fetches_succeeded += 1;

        // Update rolling average
        let count = u32::try_from(self.fetches_succeeded).unwrap_or(u32::MAX);
        let total_duration = self.average_fetch_duration * (count - 1) + duration;
        self.average_fetch_duration = total_duration / count;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetches_failed += 1;
    }

    pub fn record_tick_skipped(&mut self) {
        self.ticks_skipped += 1;
    }

    pub fn record_stale_discard(&mut self) {
        self.stale_discarded += 1;
    }

    pub fn record_cancelled_discard(&mut self) {
        self.cancelled_discarded += 1;
    }

    pub fn record_mutation(&mut self, succeeded: bool) {
        if succeeded {
            self.mutations_succeeded += 1;
        } else {
            self.mutations_failed += 1;
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.fetches_started == 0 {
            0.0
        } else {
            self.fetches_succeeded as f64 / self.fetches_started as f64
        }
    }
}
