//! The list query handle and the observer that reacts to its cache entry

use crate::executor::{CachedList, Executor};
use crate::live::{LiveBinder, LiveBinding};
use crate::outcome::{OutcomeReactor, Transition, TransitionTracker};
use crate::overtime::OvertimeMonitor;
use crate::params::NormalizedParams;
use listwise_cache::{CacheKey, FetchStatus, QueryCache, QueryState, QueryStatus};
use listwise_core::{BaseRecord, Error, ListResult, Result};
use listwise_utils::query_disabled;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What a list query currently exposes
#[derive(Debug, Clone, PartialEq)]
pub struct ListQueryResult<R = BaseRecord> {
    pub status: QueryStatus,
    pub fetch_status: FetchStatus,
    /// Sliced and reshaped envelope; empty data and no total until a result exists
    pub result: ListResult<R>,
    pub error: Option<Error>,
    /// Elapsed time of the request in flight, republished on every overtime tick
    pub overtime: Option<Duration>,
    pub is_enabled: bool,
}

impl<R> ListQueryResult<R> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.fetch_status == FetchStatus::Fetching
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn data(&self) -> &[R] {
        &self.result.data
    }

    pub fn total(&self) -> Option<u64> {
        self.result.total
    }
}

pub(crate) struct QueryInner<R> {
    pub(crate) key: CacheKey,
    pub(crate) params: NormalizedParams,
    pub(crate) cache: Arc<QueryCache<CachedList>>,
    pub(crate) executor: Executor<R>,
    pub(crate) enabled: AtomicBool,
    /// Why the query cannot run regardless of the enable flag
    pub(crate) blocked: Option<String>,
    pub(crate) binder: LiveBinder,
    pub(crate) binding: Mutex<Option<LiveBinding>>,
    pub(crate) reactor: OutcomeReactor,
    pub(crate) tracker: Mutex<TransitionTracker>,
    pub(crate) overtime: OvertimeMonitor,
    pub(crate) results: watch::Sender<ListQueryResult<R>>,
}

impl<R> QueryInner<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn project(&self, state: &QueryState<CachedList>) -> ListQueryResult<R> {
        ListQueryResult {
            status: state.status,
            fetch_status: state.fetch_status,
            result: state
                .data
                .as_ref()
                .map(|raw| self.executor.project(raw))
                .unwrap_or_default(),
            error: state.error.clone(),
            overtime: self.overtime.elapsed(),
            is_enabled: self.is_enabled(),
        }
    }

    fn snapshot(&self) -> ListQueryResult<R> {
        let state = self.cache.get(&self.key).unwrap_or_default();
        self.project(&state)
    }

    fn on_state(&self, state: &QueryState<CachedList>) {
        if state.is_fetching() {
            self.overtime.start();
        } else {
            self.overtime.stop();
        }

        self.results.send_replace(self.project(state));

        let Some(transition) = self.tracker.lock().observe(state) else {
            return;
        };
        // Handles sharing the entry each see the outcome; one of them reacts.
        if !self.cache.claim_outcome(&self.key, state.outcome_count()) {
            debug!(key = %self.key.fingerprint(), "outcome handled by another query");
            return;
        }
        match transition {
            Transition::Success(raw) => self.reactor.on_success(&raw),
            Transition::Error(error) => {
                warn!(
                    resource = %self.params.identifier(),
                    status_code = ?error.status_code(),
                    auth_failure = error.is_auth_failure(),
                    error = %error,
                    "list query failed"
                );
                self.reactor.on_error(&error);
            }
        }
    }

    fn on_overtime(&self, elapsed: Option<Duration>) {
        self.results.send_if_modified(|result| {
            if result.overtime == elapsed {
                return false;
            }
            result.overtime = elapsed;
            true
        });
    }

    /// Refetch after an invalidation without blocking the observer
    fn refetch_in_background(&self) {
        if !self.is_enabled() {
            return;
        }
        let cache = Arc::clone(&self.cache);
        let key = self.key.clone();
        let fetcher = self.executor.fetcher();
        tokio::spawn(async move {
            if let Err(e) = cache.fetch(&key, fetcher).await {
                debug!(key = %key, error = %e, "background refetch did not complete");
            }
        });
    }

    fn rebind(&self) {
        let binding = if self.is_enabled() {
            self.binder.bind()
        } else {
            None
        };
        *self.binding.lock() = binding;
    }
}

/// Follows the cache entry and invalidations of one query until aborted
async fn observe<R>(
    inner: Arc<QueryInner<R>>,
    mut state: watch::Receiver<QueryState<CachedList>>,
    mut invalidations: broadcast::Receiver<CacheKey>,
) where
    R: Clone + Send + Sync + 'static,
{
    let mut overtime = inner.overtime.subscribe();
    loop {
        tokio::select! {
            biased;

            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                inner.on_state(&snapshot);
            }
            Ok(()) = overtime.changed() => {
                let elapsed = *overtime.borrow_and_update();
                inner.on_overtime(elapsed);
            }
            invalidated = invalidations.recv() => match invalidated {
                Ok(key) if key == inner.key => inner.refetch_in_background(),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(key = %inner.key, skipped, "invalidation stream lagged");
                    if state.borrow().is_invalidated {
                        inner.refetch_in_background();
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

/// A live handle on one list query.
///
/// Created by [`ListClient::list`](crate::ListClient::list). Nothing is
/// fetched until [`fetch`](Self::fetch) is called; afterwards the handle
/// refetches on invalidation, dispatches notifications on terminal states
/// and tracks overtime. Dropping it releases the live subscription and
/// stops all background work.
pub struct ListQuery<R = BaseRecord>
where
    R: Clone + Send + Sync + 'static,
{
    inner: Arc<QueryInner<R>>,
    observer: JoinHandle<()>,
}

impl<R> ListQuery<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub(crate) fn start(inner: QueryInner<R>) -> Self {
        let inner = Arc::new(inner);
        let state = inner.cache.watch(&inner.key);
        *inner.tracker.lock() = TransitionTracker::new(&*state.borrow());
        inner.results.send_replace(inner.project(&*state.borrow()));
        let invalidations = inner.cache.subscribe_invalidations();
        inner.rebind();

        let observer = tokio::spawn(observe(Arc::clone(&inner), state, invalidations));
        Self { inner, observer }
    }

    /// Read-through fetch: fresh cached data, the request in flight, or a
    /// new request. A disabled query returns what is cached without
    /// contacting the backend.
    pub async fn fetch(&self) -> Result<ListResult<R>> {
        if !self.is_enabled() {
            self.log_disabled();
            return Ok(self.inner.snapshot().result);
        }
        let raw = self
            .inner
            .cache
            .fetch(&self.inner.key, self.inner.executor.fetcher())
            .await?;
        Ok(self.inner.executor.project(&raw))
    }

    /// Start a new request, aborting the one in flight
    pub async fn refetch(&self) -> Result<ListResult<R>> {
        if !self.is_enabled() {
            self.log_disabled();
            return Ok(self.inner.snapshot().result);
        }
        let raw = self
            .inner
            .cache
            .refetch(&self.inner.key, self.inner.executor.fetcher())
            .await?;
        Ok(self.inner.executor.project(&raw))
    }

    /// Abort the request in flight. Returns whether there was one.
    pub fn cancel(&self) -> bool {
        self.inner.cache.cancel(&self.inner.key)
    }

    /// Current state, derived from the shared cache entry
    pub fn result(&self) -> ListQueryResult<R> {
        self.inner.snapshot()
    }

    /// Results published after every state change of the cache entry and
    /// every overtime tick
    pub fn watch(&self) -> watch::Receiver<ListQueryResult<R>> {
        self.inner.results.subscribe()
    }

    /// Elapsed time of the request in flight, `None` when idle
    pub fn overtime(&self) -> Option<Duration> {
        self.inner.overtime.elapsed()
    }

    pub fn watch_overtime(&self) -> watch::Receiver<Option<Duration>> {
        self.inner.overtime.subscribe()
    }

    pub fn key(&self) -> &CacheKey {
        &self.inner.key
    }

    pub fn params(&self) -> &NormalizedParams {
        &self.inner.params
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    /// Enable or disable the query. Disabling releases the live subscription
    /// and prevents new requests; a request already in flight completes.
    pub fn set_enabled(&self, enabled: bool) {
        let enabled = enabled && self.inner.blocked.is_none();
        if self.inner.enabled.swap(enabled, Ordering::AcqRel) != enabled {
            self.inner.rebind();
        }
    }

    pub fn is_live(&self) -> bool {
        self.inner.binding.lock().is_some()
    }

    fn log_disabled(&self) {
        let reason = self
            .inner
            .blocked
            .as_deref()
            .unwrap_or("query is disabled");
        query_disabled(self.inner.params.identifier.as_deref(), reason);
    }
}

impl<R> Drop for ListQuery<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.observer.abort();
        self.inner.binding.lock().take();
        self.inner.overtime.stop();
    }
}

impl<R> fmt::Debug for ListQuery<R>
where
    R: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListQuery")
            .field("key", &self.inner.key)
            .field("enabled", &self.is_enabled())
            .field("live", &self.is_live())
            .finish()
    }
}
