//! # Query Engine
//!
//! Registry of active queries, one per fingerprint. Subscribers of the same
//! fingerprint share one query: one poll scheduler, one in-flight request,
//! one `watch` channel of [`QueryState`].
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Fetching -> {Settled | Failed} -> Fetching -> ... -> Cancelled
//! ```
//!
//! The query is cancelled when its last subscription is dropped. A fetch
//! still in flight at that point runs to completion, but its response is
//! dropped without touching the cache.

use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::client::sync::cache::{CollectionCache, Snapshot};
use crate::client::sync::fingerprint::Fingerprint;
use crate::client::sync::inflight::{
    BeginOutcome, FetchMode, InFlightState, InFlightTracker, QueryPhase, SettleOutcome,
};
use crate::client::sync::metrics::SyncMetrics;
use crate::client::sync::scheduler::{CancelToken, PollScheduler, QueryOptions};
use crate::shared::error::SyncResult;

/// Produces one read of the remote resource behind a fingerprint
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, SyncResult<T>> + Send + Sync>;

/// Everything a view needs to know about one fingerprint
#[derive(Debug)]
pub struct QueryState<T> {
    pub snapshot: Option<Arc<Snapshot<T>>>,
    pub in_flight: InFlightState,
    pub phase: QueryPhase,
}

impl<T> QueryState<T> {
    pub fn data(&self) -> Option<&T> {
        self.snapshot.as_deref().map(|snapshot| &snapshot.data)
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            in_flight: self.in_flight.clone(),
            phase: self.phase,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            in_flight: InFlightState::default(),
            phase: QueryPhase::Idle,
        }
    }
}

struct QueryEntry<T> {
    generation: u64,
    subscribers: HashSet<Uuid>,
    tracker: InFlightTracker,
    state_tx: watch::Sender<QueryState<T>>,
    refresh: Arc<Notify>,
    cancel: Arc<CancelToken>,
    fetcher: Fetcher<T>,
}

impl<T> QueryEntry<T> {
    fn publish(&self) {
        self.state_tx.send_modify(|state| {
            state.in_flight = self.tracker.state().clone();
            state.phase = self.tracker.phase();
        });
    }
}

struct QueryShared<T> {
    cache: Arc<CollectionCache<T>>,
    queries: Mutex<HashMap<Fingerprint, QueryEntry<T>>>,
    metrics: Arc<Mutex<SyncMetrics>>,
    next_generation: AtomicU64,
}

/// Shared-fetch query registry over one [`CollectionCache`]
pub struct QueryEngine<T: Send + Sync + 'static> {
    shared: Arc<QueryShared<T>>,
}

impl<T: Send + Sync + 'static> Clone for QueryEngine<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + Sync + 'static> QueryEngine<T> {
    pub fn new(cache: Arc<CollectionCache<T>>, metrics: Arc<Mutex<SyncMetrics>>) -> Self {
        Self {
            shared: Arc::new(QueryShared {
                cache,
                queries: Mutex::new(HashMap::new()),
                metrics,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn cache(&self) -> &Arc<CollectionCache<T>> {
        &self.shared.cache
    }

    /// Join the query for `fingerprint`, starting it if nobody else has
    pub async fn subscribe(
        &self,
        fingerprint: Fingerprint,
        options: QueryOptions,
        fetcher: Fetcher<T>,
    ) -> QuerySubscription<T> {
        let cached = self.shared.cache.get(&fingerprint).await;
        let id = Uuid::new_v4();

        let mut queries = self.shared.lock_queries();
        if let Some(entry) = queries.get_mut(&fingerprint) {
            entry.subscribers.insert(id);
            tracing::debug!(
                "Joined query {} ({} subscribers)",
                fingerprint,
                entry.subscribers.len()
            );
            return QuerySubscription {
                id,
                rx: entry.state_tx.subscribe(),
                fingerprint,
                shared: Arc::clone(&self.shared),
            };
        }

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = Arc::new(CancelToken::new());
        let refresh = Arc::new(Notify::new());
        let scheduler = PollScheduler::new(options, Arc::clone(&cancel), Arc::clone(&refresh));
        let initial_fetch = scheduler.wants_initial_fetch(cached.as_deref(), Utc::now());

        // Loading from the start when a fetch is due, so views never flash empty
        let (state_tx, rx) = watch::channel(QueryState {
            snapshot: cached,
            in_flight: InFlightState {
                is_loading: initial_fetch,
                last_error: None,
            },
            phase: QueryPhase::Idle,
        });
        queries.insert(
            fingerprint.clone(),
            QueryEntry {
                generation,
                subscribers: HashSet::from([id]),
                tracker: InFlightTracker::default(),
                state_tx,
                refresh,
                cancel,
                fetcher,
            },
        );
        drop(queries);
        tracing::debug!("Started query {} (generation {})", fingerprint, generation);

        let shared = Arc::clone(&self.shared);
        let key = fingerprint.clone();
        tokio::spawn(async move {
            scheduler
                .run(initial_fetch, |mode| shared.trigger(&key, generation, mode))
                .await;
        });

        QuerySubscription {
            id,
            rx,
            fingerprint,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Ask for a fresh read of an active query. Returns `false` if nobody is
    /// subscribed to `fingerprint`.
    pub fn refetch(&self, fingerprint: &Fingerprint) -> bool {
        let queries = self.shared.lock_queries();
        match queries.get(fingerprint) {
            Some(entry) => {
                entry.refresh.notify_one();
                true
            }
            None => false,
        }
    }

    /// Drop matching snapshots from the cache and schedule a refetch for the
    /// matching active queries
    pub async fn invalidate<F>(&self, predicate: F) -> Vec<Fingerprint>
    where
        F: Fn(&Fingerprint) -> bool,
    {
        let matched = self.shared.cache.invalidate(&predicate).await;
        let mut queries = self.shared.lock_queries();
        for (fingerprint, entry) in queries.iter_mut().filter(|(fp, _)| predicate(fp)) {
            entry.tracker.refresh_requested();
            let in_flight = entry.tracker.state().clone();
            entry.state_tx.send_modify(|state| {
                state.snapshot = None;
                state.in_flight = in_flight;
            });
            entry.refresh.notify_one();
            tracing::debug!("Invalidated active query {}", fingerprint);
        }
        matched
    }

    pub fn active_fingerprints(&self) -> Vec<Fingerprint> {
        let mut active: Vec<_> = self.shared.lock_queries().keys().cloned().collect();
        active.sort();
        active
    }

    pub fn subscriber_count(&self, fingerprint: &Fingerprint) -> usize {
        self.shared
            .lock_queries()
            .get(fingerprint)
            .map_or(0, |entry| entry.subscribers.len())
    }
}

impl<T: Send + Sync + 'static> QueryShared<T> {
    fn lock_queries(&self) -> MutexGuard<'_, HashMap<Fingerprint, QueryEntry<T>>> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_metrics(&self) -> MutexGuard<'_, SyncMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a fetch for the query unless one is already running
    fn trigger(self: &Arc<Self>, fingerprint: &Fingerprint, generation: u64, mode: FetchMode) {
        let (fetcher, cancel) = {
            let mut queries = self.lock_queries();
            let Some(entry) = queries
                .get_mut(fingerprint)
                .filter(|entry| entry.generation == generation)
            else {
                return;
            };
            match entry.tracker.try_begin(mode) {
                BeginOutcome::Started => {}
                BeginOutcome::Skipped => {
                    tracing::trace!("Skipping {:?} for {}: request in flight", mode, fingerprint);
                    self.lock_metrics().record_tick_skipped();
                    return;
                }
                BeginOutcome::Queued => {
                    tracing::debug!("Queued refetch for {}", fingerprint);
                    return;
                }
            }
            entry.publish();
            (Arc::clone(&entry.fetcher), Arc::clone(&entry.cancel))
        };

        let shared = Arc::clone(self);
        let fingerprint = fingerprint.clone();
        tokio::spawn(async move {
            shared.run_fetch(fingerprint, generation, fetcher, cancel).await;
        });
    }

    async fn run_fetch(
        self: Arc<Self>,
        fingerprint: Fingerprint,
        generation: u64,
        fetcher: Fetcher<T>,
        cancel: Arc<CancelToken>,
    ) {
        let seq = self.cache.issue_seq(&fingerprint).await;
        self.lock_metrics().record_fetch_start();
        tracing::debug!("Fetching {} (seq {})", fingerprint, seq);
        let started = Instant::now();

        let result = fetcher().await;

        if cancel.is_cancelled() {
            tracing::debug!("Dropping response for cancelled query {} (seq {})", fingerprint, seq);
            self.lock_metrics().record_cancelled_discard();
            return;
        }

        let (outcome, snapshot) = match result {
            Ok(data) => match self.cache.put(&fingerprint, Snapshot::new(data), seq).await {
                Ok(snapshot) => {
                    self.lock_metrics().record_fetch_success(started.elapsed());
                    (SettleOutcome::Stored, Some(snapshot))
                }
                Err(err) => {
                    tracing::debug!("{}", err);
                    self.lock_metrics().record_stale_discard();
                    (SettleOutcome::Discarded, None)
                }
            },
            Err(err) => {
                tracing::warn!("Fetch of {} failed: {}", fingerprint, err);
                self.lock_metrics().record_fetch_failure();
                (SettleOutcome::Failed(err), None)
            }
        };

        self.settle(&fingerprint, generation, outcome, snapshot);
    }

    fn settle(
        &self,
        fingerprint: &Fingerprint,
        generation: u64,
        outcome: SettleOutcome,
        snapshot: Option<Arc<Snapshot<T>>>,
    ) {
        let mut queries = self.lock_queries();
        let Some(entry) = queries
            .get_mut(fingerprint)
            .filter(|entry| entry.generation == generation)
        else {
            return;
        };
        let refetch = entry.tracker.finish(&outcome);
        if let Some(snapshot) = snapshot {
            entry.state_tx.send_modify(|state| state.snapshot = Some(snapshot));
        }
        entry.publish();
        if refetch {
            entry.refresh.notify_one();
        }
    }

    fn release(&self, fingerprint: &Fingerprint, id: Uuid) {
        let mut queries = self.lock_queries();
        let Some(entry) = queries.get_mut(fingerprint) else {
            return;
        };
        if !entry.subscribers.remove(&id) || !entry.subscribers.is_empty() {
            return;
        }
        if let Some(mut entry) = queries.remove(fingerprint) {
            entry.cancel.cancel();
            entry.tracker.cancel();
            entry.publish();
            tracing::debug!("Cancelled query {}", fingerprint);
        }
    }
}

/// A live subscription to one fingerprint; dropping it unsubscribes
pub struct QuerySubscription<T: Send + Sync + 'static> {
    id: Uuid,
    fingerprint: Fingerprint,
    rx: watch::Receiver<QueryState<T>>,
    shared: Arc<QueryShared<T>>,
}

impl<T: Send + Sync + 'static> QuerySubscription<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn current(&self) -> QueryState<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change. `None` once the query is gone.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}

    /// Current state followed by every change
    pub fn into_stream(self) -> SubscriptionStream<T> {
        SubscriptionStream {
            stream: WatchStream::new(self.rx.clone()).boxed(),
            _subscription: self,
        }
    }
}

impl<T: Send + Sync + 'static> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        self.shared.release(&self.fingerprint, self.id);
    }
}

/// Stream of [`QueryState`] that keeps its subscription alive
pub struct SubscriptionStream<T: Send + Sync + 'static> {
    stream: BoxStream<'static, QueryState<T>>,
    _subscription: QuerySubscription<T>,
}

impl<T: Send + Sync + 'static> Stream for SubscriptionStream<T> {
    type Item = QueryState<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}
