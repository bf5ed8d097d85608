//! # Collection Cache
//!
//! Last-known server snapshot per fingerprint.
//!
//! Every request is stamped with a sequence number from [`CollectionCache::issue_seq`].
//! `put` only accepts a response whose number is newer than the one recorded
//! for the fingerprint, so a slow early request never overwrites a faster
//! later one. `invalidate` drops snapshots and raises the recorded number to
//! the latest issued one: responses to requests started before the
//! invalidation are discarded on arrival.
//!
//! All access goes through one `RwLock`; nothing awaits while holding it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::client::sync::fingerprint::Fingerprint;
use crate::shared::error::{SyncError, SyncResult};

/// Request sequence number, unique per cache
pub type RequestSeq = u64;

/// Immutable server response with the time it was received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
        }
    }

    /// Younger than `stale_time` as of `now`
    pub fn is_fresh(&self, stale_time: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(stale_time) {
            Ok(stale_time) => now - self.fetched_at < stale_time,
            Err(_) => true,
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    snapshot: Option<Arc<Snapshot<T>>>,
    seq: RequestSeq,
}

#[derive(Debug)]
struct CacheInner<T> {
    slots: HashMap<Fingerprint, Slot<T>>,
    last_seq: RequestSeq,
}

/// Snapshot cache shared by every subscriber of a collection
#[derive(Debug)]
pub struct CollectionCache<T> {
    inner: RwLock<CacheInner<T>>,
}

impl<T> Default for CollectionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollectionCache<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                slots: HashMap::new(),
                last_seq: 0,
            }),
        }
    }

    /// Allocate the sequence number of a request about to start
    pub async fn issue_seq(&self, fingerprint: &Fingerprint) -> RequestSeq {
        let mut inner = self.inner.write().await;
        inner.last_seq += 1;
        let seq = inner.last_seq;
        inner
            .slots
            .entry(fingerprint.clone())
            .or_insert(Slot {
                snapshot: None,
                seq: 0,
            });
        seq
    }

    /// Current snapshot, if any. Never waits on the network.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Snapshot<T>>> {
        let inner = self.inner.read().await;
        inner
            .slots
            .get(fingerprint)
            .and_then(|slot| slot.snapshot.clone())
    }

    /// Store a response unless a newer one (or an invalidation) got there first
    pub async fn put(
        &self,
        fingerprint: &Fingerprint,
        snapshot: Snapshot<T>,
        seq: RequestSeq,
    ) -> SyncResult<Arc<Snapshot<T>>> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .slots
            .entry(fingerprint.clone())
            .or_insert(Slot {
                snapshot: None,
                seq: 0,
            });
        if seq <= slot.seq {
            return Err(SyncError::StaleResponseDiscarded {
                fingerprint: fingerprint.to_string(),
                seq,
                current: slot.seq,
            });
        }
        let snapshot = Arc::new(snapshot);
        slot.snapshot = Some(Arc::clone(&snapshot));
        slot.seq = seq;
        Ok(snapshot)
    }

    /// Drop every snapshot whose fingerprint matches; returns the matched keys
    pub async fn invalidate<F>(&self, predicate: F) -> Vec<Fingerprint>
    where
        F: Fn(&Fingerprint) -> bool,
    {
        let mut inner = self.inner.write().await;
        let barrier = inner.last_seq;
        let mut matched = Vec::new();
        for (fingerprint, slot) in inner.slots.iter_mut() {
            if predicate(fingerprint) {
                slot.snapshot = None;
                slot.seq = slot.seq.max(barrier);
                matched.push(fingerprint.clone());
            }
        }
        matched.sort();
        matched
    }

    /// Number of fingerprints currently holding a snapshot
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner
            .slots
            .values()
            .filter(|slot| slot.snapshot.is_some())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
