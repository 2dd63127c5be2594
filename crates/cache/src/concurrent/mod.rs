//! The cached-query engine
//!
//! `QueryCache` maps cache keys to observable query state. It is the only
//! component that mutates entries: callers read snapshots, subscribe to
//! changes and request fetches or invalidations by key.

mod entry;


use crate::keys::{CacheKey, KeyFilter};
use crate::state::QueryState;
use crate::QueryContext;
use dashmap::DashMap;
use entry::QueryEntry;
use listwise_core::Result;
use listwise_utils::cache_event;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Capacity of the invalidation broadcast channel
const INVALIDATION_CHANNEL_CAPACITY: usize = 256;

/// Process-wide key to query-state store.
///
/// Guarantees at most one request in flight per key: concurrent fetches of
/// the same key join the running request, and a refetch supersedes it by
/// aborting its signal. Results of superseded requests are never committed.
pub struct QueryCache<V> {
    entries: DashMap<CacheKey, Arc<QueryEntry<V>>>,
    invalidations: broadcast::Sender<CacheKey>,
    stale_time: Duration,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose data is stale as soon as it is committed
    pub fn new() -> Self {
        Self::with_stale_time(Duration::ZERO)
    }

    /// Create a cache that serves committed data without refetching for `stale_time`
    pub fn with_stale_time(stale_time: Duration) -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: DashMap::new(),
            invalidations,
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    fn entry(&self, key: &CacheKey) -> Arc<QueryEntry<V>> {
        if let Some(existing) = self.entries.get(key) {
            return Arc::clone(existing.value());
        }
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(QueryEntry::new(key.clone())));
        Arc::clone(entry.value())
    }

    /// Snapshot of the entry for `key`, if one exists
    pub fn get(&self, key: &CacheKey) -> Option<QueryState<V>> {
        self.entries.get(key).map(|entry| entry.snapshot())
    }

    /// Last committed data for `key`
    pub fn get_data(&self, key: &CacheKey) -> Option<V> {
        self.entries.get(key).and_then(|entry| entry.snapshot().data)
    }

    /// Store `data` for `key` as if a request had succeeded
    pub fn set(&self, key: &CacheKey, data: V) {
        self.entry(key).replace_data(data);
    }

    /// Subscribe to state changes of `key`, creating an empty entry if needed
    pub fn watch(&self, key: &CacheKey) -> watch::Receiver<QueryState<V>> {
        // Subscribe under the shard lock so `remove` never drops an entry
        // that is gaining an observer.
        self.entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(QueryEntry::new(key.clone())))
            .subscribe()
    }

    /// Claim the reactions (notifications, auth forwarding) to the outcome
    /// of `key` numbered `outcome`, see [`QueryState::outcome_count`].
    /// Returns `true` for exactly one caller per committed outcome, however
    /// many observers share the entry.
    pub fn claim_outcome(&self, key: &CacheKey, outcome: u64) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.claim_outcome(outcome))
            .unwrap_or(false)
    }

    /// Keys announced here have been invalidated and should be refetched by
    /// their active observers
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<CacheKey> {
        self.invalidations.subscribe()
    }

    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.is_in_flight())
            .unwrap_or(false)
    }

    /// Mark every entry selected by `filter` as invalidated and announce it.
    /// Returns the number of entries matched.
    pub fn invalidate(&self, filter: &KeyFilter) -> usize {
        let matched: Vec<Arc<QueryEntry<V>>> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry.key()))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for entry in &matched {
            entry.invalidate();
            // No receivers simply means nobody is observing right now.
            let _ = self.invalidations.send(entry.key().clone());
        }

        debug!(?filter, matched = matched.len(), "invalidated cache entries");
        matched.len()
    }

    /// Read-through fetch: return fresh data, join the request in flight, or
    /// start a new one with `fetcher`.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<V>
    where
        F: FnOnce(QueryContext) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let entry = self.entry(key);
        let label = key.fingerprint();

        if let Some(data) = entry.fresh_data(self.stale_time) {
            cache_event(&label, true, "fetch");
            return Ok(data);
        }

        let (generation, request, joined) = entry.join_or_launch(fetcher);
        if joined {
            debug!(key = %label, generation, "joined in-flight request");
        } else {
            cache_event(&label, false, "fetch");
        }
        entry.settle(generation, request).await
    }

    /// Start a new request for `key`, superseding and aborting any request
    /// already in flight.
    pub async fn refetch<F, Fut>(&self, key: &CacheKey, fetcher: F) -> Result<V>
    where
        F: FnOnce(QueryContext) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let entry = self.entry(key);
        let (generation, request) = entry.relaunch(fetcher);
        entry.settle(generation, request).await
    }

    /// Abort the request in flight for `key` without starting another.
    /// Returns whether there was one.
    pub fn cancel(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
            .map(|entry| entry.cancel())
            .unwrap_or(false)
    }

    /// Forget the entry for `key`, aborting its request if one is in flight.
    ///
    /// An entry nobody watches is dropped. A watched entry is reset in place
    /// instead, so its observers keep following the key.
    pub fn remove(&self, key: &CacheKey) -> bool {
        if let Some((_, entry)) = self.entries.remove_if(key, |_, entry| !entry.is_observed()) {
            entry.cancel();
            return true;
        }
        let Some(entry) = self.entries.get(key).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        entry.reset();
        debug!(key = %key, "reset observed cache entry");
        true
    }

    pub fn clear(&self) {
        let keys: Vec<CacheKey> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        for key in keys {
            self.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl<V> Default for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
