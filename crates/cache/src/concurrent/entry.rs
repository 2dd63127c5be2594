//! One cache entry: observable state plus the request in flight

use crate::cancel::AbortController;
use crate::keys::CacheKey;
use crate::state::QueryState;
use crate::QueryContext;
use futures::future::{BoxFuture, FutureExt, Shared};
use listwise_core::{Error, Result};
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

pub(crate) type SharedFetch<V> = Shared<BoxFuture<'static, Result<V>>>;

struct InFlight<V> {
    generation: u64,
    controller: AbortController,
    request: SharedFetch<V>,
}

enum Successor<V> {
    InFlight(u64, SharedFetch<V>),
    Settled(Result<V>),
}

pub(crate) struct QueryEntry<V> {
    key: CacheKey,
    state: watch::Sender<QueryState<V>>,
    in_flight: Mutex<Option<InFlight<V>>>,
    last_outcome: Mutex<Option<(u64, Result<V>)>>,
    generation: AtomicU64,
    /// Highest outcome count whose reactions have been claimed
    reacted_through: AtomicU64,
}

impl<V> QueryEntry<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(key: CacheKey) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            key,
            state,
            in_flight: Mutex::new(None),
            last_outcome: Mutex::new(None),
            generation: AtomicU64::new(0),
            reacted_through: AtomicU64::new(0),
        }
    }

    pub(crate) fn key(&self) -> &CacheKey {
        &self.key
    }

    pub(crate) fn snapshot(&self) -> QueryState<V> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<QueryState<V>> {
        self.state.subscribe()
    }

    pub(crate) fn is_observed(&self) -> bool {
        self.state.receiver_count() > 0
    }

    /// Claim the reactions to the outcome numbered `outcome`. Succeeds for
    /// exactly one caller per outcome.
    pub(crate) fn claim_outcome(&self, outcome: u64) -> bool {
        self.reacted_through.fetch_max(outcome, Ordering::AcqRel) < outcome
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    pub(crate) fn fresh_data(&self, stale_time: Duration) -> Option<V> {
        let state = self.state.borrow();
        if state.is_stale(stale_time) {
            None
        } else {
            state.data.clone()
        }
    }

    pub(crate) fn replace_data(&self, data: V) {
        self.state.send_modify(|state| {
            let fetch_status = state.fetch_status;
            let fetch_started_at = state.fetch_started_at;
            state.succeed(data);
            state.fetch_status = fetch_status;
            state.fetch_started_at = fetch_started_at;
        });
    }

    pub(crate) fn invalidate(&self) {
        self.state.send_modify(|state| state.is_invalidated = true);
    }

    /// Join the request in flight or launch one. The third element tells
    /// whether an existing request was joined.
    pub(crate) fn join_or_launch<F, Fut>(
        self: &Arc<Self>,
        fetcher: F,
    ) -> (u64, SharedFetch<V>, bool)
    where
        F: FnOnce(QueryContext) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut slot = self.in_flight.lock();
        if let Some(flight) = slot.as_ref() {
            return (flight.generation, flight.request.clone(), true);
        }
        let (generation, request) = self.launch(&mut slot, fetcher);
        (generation, request, false)
    }

    /// Launch a request, superseding the one in flight
    pub(crate) fn relaunch<F, Fut>(self: &Arc<Self>, fetcher: F) -> (u64, SharedFetch<V>)
    where
        F: FnOnce(QueryContext) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut slot = self.in_flight.lock();
        self.launch(&mut slot, fetcher)
    }

    // Called with the in-flight lock held so the spawned request cannot
    // commit before it is registered.
    fn launch<F, Fut>(
        self: &Arc<Self>,
        slot: &mut Option<InFlight<V>>,
        fetcher: F,
    ) -> (u64, SharedFetch<V>)
    where
        F: FnOnce(QueryContext) -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = slot.take() {
            previous.controller.abort();
            debug!(
                key = %self.key,
                superseded = previous.generation,
                generation,
                "superseding in-flight request"
            );
        }

        let controller = AbortController::new();
        let signal = controller.signal();
        let request = fetcher(QueryContext::new(self.key.clone(), controller.signal()));
        self.state.send_modify(QueryState::begin_fetch);

        let entry = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = signal.aborted() => Err(Error::cancelled(entry.key.to_string())),
                outcome = AssertUnwindSafe(request).catch_unwind() => outcome.unwrap_or_else(|_| {
                    Err(Error::internal(format!("fetcher for {} panicked", entry.key)))
                }),
            };
            entry.commit(generation, &outcome);
            outcome
        });

        let key = self.key.to_string();
        let request: SharedFetch<V> = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => Err(Error::internal(format!(
                    "request task for {key} was lost: {join_error}"
                ))),
            }
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            generation,
            controller,
            request: request.clone(),
        });
        (generation, request)
    }

    /// Await `request`; when it was superseded, follow the newer request or
    /// adopt its outcome if it has already settled.
    pub(crate) async fn settle(
        self: &Arc<Self>,
        mut generation: u64,
        mut request: SharedFetch<V>,
    ) -> Result<V> {
        loop {
            match request.await {
                Err(error) if error.is_cancelled() => match self.newer_than(generation) {
                    Some(Successor::InFlight(next_generation, next_request)) => {
                        generation = next_generation;
                        request = next_request;
                    }
                    Some(Successor::Settled(outcome)) => return outcome,
                    None => return Err(error),
                },
                outcome => return outcome,
            }
        }
    }

    fn newer_than(&self, generation: u64) -> Option<Successor<V>> {
        let slot = self.in_flight.lock();
        if let Some(flight) = slot.as_ref().filter(|flight| flight.generation > generation) {
            return Some(Successor::InFlight(flight.generation, flight.request.clone()));
        }
        let last_outcome = self.last_outcome.lock();
        last_outcome
            .as_ref()
            .filter(|(settled, _)| *settled > generation)
            .map(|(_, outcome)| Successor::Settled(outcome.clone()))
    }

    fn commit(&self, generation: u64, outcome: &Result<V>) {
        let mut slot = self.in_flight.lock();
        if slot.as_ref().map(|flight| flight.generation) != Some(generation) {
            debug!(key = %self.key, generation, "discarding result of superseded request");
            return;
        }
        *slot = None;

        match outcome {
            Err(error) if error.is_cancelled() => {
                self.state.send_modify(QueryState::end_fetch);
                return;
            }
            Ok(data) => self.state.send_modify(|state| state.succeed(data.clone())),
            Err(error) => self.state.send_modify(|state| state.fail(error.clone())),
        }
        *self.last_outcome.lock() = Some((generation, outcome.clone()));
    }

    pub(crate) fn cancel(&self) -> bool {
        let Some(flight) = self.in_flight.lock().take() else {
            return false;
        };
        flight.controller.abort();
        self.state.send_modify(QueryState::end_fetch);
        debug!(key = %self.key, generation = flight.generation, "cancelled in-flight request");
        true
    }

    /// Abort the request in flight and forget data and error, keeping the
    /// entry and its observers
    pub(crate) fn reset(&self) {
        if let Some(flight) = self.in_flight.lock().take() {
            flight.controller.abort();
        }
        *self.last_outcome.lock() = None;
        self.state.send_modify(QueryState::reset);
    }
}
