//! Observable state of one cache entry

use listwise_core::Error;
use std::time::Duration;
use tokio::time::Instant;

/// Whether a query has produced data or an error yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    Pending,
    Success,
    Error,
}

/// Whether a request is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    Fetching,
    Idle,
}

/// Snapshot of a cache entry.
///
/// The update counters increase by one on every committed success or error,
/// which lets observers react exactly once per terminal transition.
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub fetch_status: FetchStatus,
    pub data: Option<V>,
    pub error: Option<Error>,
    pub data_updated_at: Option<Instant>,
    pub error_updated_at: Option<Instant>,
    pub data_update_count: u64,
    pub error_update_count: u64,
    pub fetch_started_at: Option<Instant>,
    pub is_invalidated: bool,
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Pending,
            fetch_status: FetchStatus::Idle,
            data: None,
            error: None,
            data_updated_at: None,
            error_updated_at: None,
            data_update_count: 0,
            error_update_count: 0,
            fetch_started_at: None,
            is_invalidated: false,
        }
    }
}

impl<V> QueryState<V> {
    pub fn is_fetching(&self) -> bool {
        self.fetch_status == FetchStatus::Fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Number of successes and errors committed so far. Identifies the latest
    /// outcome of the entry and never decreases, not even across a reset.
    pub fn outcome_count(&self) -> u64 {
        self.data_update_count + self.error_update_count
    }

    /// Data older than `stale_time`, or invalidated, must be refetched on read
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        if self.is_invalidated {
            return true;
        }
        match self.data_updated_at {
            Some(updated_at) => updated_at.elapsed() >= stale_time,
            None => true,
        }
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.fetch_status = FetchStatus::Fetching;
        self.fetch_started_at = Some(Instant::now());
    }

    pub(crate) fn end_fetch(&mut self) {
        self.fetch_status = FetchStatus::Idle;
        self.fetch_started_at = None;
    }

    pub(crate) fn succeed(&mut self, data: V) {
        self.end_fetch();
        self.status = QueryStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.data_updated_at = Some(Instant::now());
        self.data_update_count += 1;
        self.is_invalidated = false;
    }

    /// Forget data, error and timestamps. The update counters are kept so
    /// observers can still tell later outcomes apart from earlier ones.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            data_update_count: self.data_update_count,
            error_update_count: self.error_update_count,
            ..Self::default()
        };
    }

    pub(crate) fn fail(&mut self, error: Error) {
        self.end_fetch();
        self.status = QueryStatus::Error;
        self.error = Some(error);
        self.error_updated_at = Some(Instant::now());
        self.error_update_count += 1;
        self.is_invalidated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pending_idle() {
        let state: QueryState<u8> = QueryState::default();
        assert_eq!(state.status, QueryStatus::Pending);
        assert_eq!(state.fetch_status, FetchStatus::Idle);
        assert!(state.is_stale(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_follows_stale_time() {
        let mut state = QueryState::default();
        state.begin_fetch();
        state.succeed(1u8);
        assert!(!state.is_stale(Duration::from_secs(5)));
        assert!(state.is_stale(Duration::ZERO));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(state.is_stale(Duration::from_secs(5)));
    }

    #[test]
    fn test_counters_advance_per_outcome() {
        let mut state = QueryState::default();
        state.begin_fetch();
        state.succeed("a");
        state.begin_fetch();
        state.fail(Error::http(500, "boom"));

        assert_eq!(state.data_update_count, 1);
        assert_eq!(state.error_update_count, 1);
        assert_eq!(state.status, QueryStatus::Error);
        assert_eq!(state.data, Some("a"));
        assert_eq!(state.fetch_status, FetchStatus::Idle);
        assert_eq!(state.outcome_count(), 2);
    }

    #[test]
    fn test_reset_keeps_counters() {
        let mut state = QueryState::default();
        state.begin_fetch();
        state.succeed(5u8);
        state.begin_fetch();
        state.reset();

        assert_eq!(state.status, QueryStatus::Pending);
        assert_eq!(state.fetch_status, FetchStatus::Idle);
        assert_eq!(state.data, None);
        assert_eq!(state.data_updated_at, None);
        assert_eq!(state.outcome_count(), 1);
    }
}
