//! # In-flight State
//!
//! Per-fingerprint request bookkeeping: whether a request is running, the
//! last error, and whether a refetch was requested while one was running.
//!
//! A poll tick that finds a request in flight is skipped. An explicit refresh
//! (invalidation, manual refetch) is queued instead, and at most one refresh
//! is ever queued.

use crate::shared::error::SyncError;

/// Loading/error status exposed to the view projector
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InFlightState {
    pub is_loading: bool,
    pub last_error: Option<SyncError>,
}

/// Lifecycle of a query subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPhase {
    #[default]
    Idle,
    Fetching,
    Settled,
    Failed,
    /// Terminal: the last subscriber went away
    Cancelled,
}

/// Why a fetch is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// First read after subscribing
    Initial,
    /// Poll interval elapsed
    Tick,
    /// Invalidation or manual refetch
    Refresh,
}

/// Result of asking to start a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    Started,
    /// A request is running; this tick is dropped
    Skipped,
    /// A request is running; one refetch will follow it
    Queued,
}

/// How a request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Response stored in the cache
    Stored,
    /// Response arrived but a newer one (or an invalidation) won
    Discarded,
    Failed(SyncError),
}

#[derive(Debug, Default)]
pub(crate) struct InFlightTracker {
    state: InFlightState,
    phase: QueryPhase,
    running: bool,
    pending_refetch: bool,
}

impl InFlightTracker {
    pub fn state(&self) -> &InFlightState {
        &self.state
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn try_begin(&mut self, mode: FetchMode) -> BeginOutcome {
        if self.running {
            return match mode {
                FetchMode::Refresh => {
                    self.pending_refetch = true;
                    BeginOutcome::Queued
                }
                FetchMode::Initial | FetchMode::Tick => BeginOutcome::Skipped,
            };
        }
        self.running = true;
        self.state.is_loading = true;
        self.phase = QueryPhase::Fetching;
        BeginOutcome::Started
    }

    /// Record the end of the running request. Returns `true` when a queued
    /// refetch should start now; loading stays on in that case.
    pub fn finish(&mut self, outcome: &SettleOutcome) -> bool {
        self.running = false;
        match outcome {
            SettleOutcome::Stored => {
                self.state.last_error = None;
                self.phase = QueryPhase::Settled;
            }
            SettleOutcome::Discarded => {
                self.phase = QueryPhase::Settled;
            }
            SettleOutcome::Failed(err) => {
                self.state.last_error = Some(err.clone());
                self.phase = QueryPhase::Failed;
            }
        }
        let refetch = std::mem::take(&mut self.pending_refetch);
        self.state.is_loading = refetch;
        if refetch {
            self.phase = QueryPhase::Fetching;
        }
        refetch
    }

    /// A refetch is owed before the next settle. Loading turns on right away
    /// so a dropped snapshot is never published as a settled empty query.
    pub fn refresh_requested(&mut self) {
        self.state.is_loading = true;
        if self.running {
            self.pending_refetch = true;
        }
    }

    pub fn cancel(&mut self) {
        self.pending_refetch = false;
        self.state.is_loading = false;
        self.phase = QueryPhase::Cancelled;
    }
}
