//! # Poll Scheduler
//!
//! Drives the fetches of one subscribed fingerprint: an initial read, a read
//! every poll interval, and a read whenever a refresh is requested.
//!
//! The scheduler only decides *when*. Whether a fetch actually starts (or is
//! skipped because one is already running) is the query engine's call.
//!
//! ## Behavior
//!
//! - **Immediate**: the initial fetch happens on start unless a fresh
//!   snapshot is cached
//! - **Background**: ticks keep coming regardless of view focus
//! - **Missed ticks**: skipped, never bunched up
//! - **Cancellation**: cooperative; the loop exits at the next await point

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::client::sync::cache::Snapshot;
use crate::client::sync::inflight::FetchMode;

/// Per-query scheduling options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fixed refetch cadence; `None` fetches on demand only
    pub poll_interval: Option<Duration>,
    /// A cached snapshot younger than this is served without fetching
    pub stale_time: Duration,
}

impl QueryOptions {
    /// Poll every `interval`, always refetching on subscribe
    pub fn polling(interval: Duration) -> Self {
        Self {
            poll_interval: Some(interval),
            stale_time: Duration::ZERO,
        }
    }

    /// Fetch on subscribe when stale and after invalidation
    pub fn on_demand(stale_time: Duration) -> Self {
        Self {
            poll_interval: None,
            stale_time,
        }
    }
}

/// Cooperative cancellation flag shared by a query's scheduler and its
/// in-flight fetches
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelToken::cancel`] has been called
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.notify.notified().await;
        }
    }
}

/// Fetch timing for one fingerprint
#[derive(Debug)]
pub struct PollScheduler {
    options: QueryOptions,
    cancel: Arc<CancelToken>,
    refresh: Arc<Notify>,
}

impl PollScheduler {
    pub fn new(options: QueryOptions, cancel: Arc<CancelToken>, refresh: Arc<Notify>) -> Self {
        Self {
            options,
            cancel,
            refresh,
        }
    }

    /// Whether the subscribe-time read must go to the network
    pub fn wants_initial_fetch<T>(&self, cached: Option<&Snapshot<T>>, now: DateTime<Utc>) -> bool {
        cached.map_or(true, |snapshot| !snapshot.is_fresh(self.options.stale_time, now))
    }

    /// Run until cancelled, calling `on_fetch` whenever a read is due
    pub async fn run<F>(self, initial_fetch: bool, mut on_fetch: F)
    where
        F: FnMut(FetchMode),
    {
        if self.cancel.is_cancelled() {
            return;
        }
        if initial_fetch {
            on_fetch(FetchMode::Initial);
        }

        let mut interval = self.options.poll_interval.map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.refresh.notified() => on_fetch(FetchMode::Refresh),
                _ = next_tick(&mut interval) => on_fetch(FetchMode::Tick),
            }
        }
        tracing::debug!("Poll scheduler stopped");
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
