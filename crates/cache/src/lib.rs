//! Cache keys and the cached-query engine for listwise
//!
//! This crate provides:
//! - Deterministic, hierarchical cache keys (`[provider, resource, action, params]`)
//! - Abort controllers whose signals are forwarded to data providers
//! - `QueryCache`, a process-wide key to state store with in-flight request
//!   deduplication, supersede-and-cancel refetches and invalidation broadcast

pub mod cancel;
pub mod concurrent;
pub mod context;
pub mod keys;
pub mod state;

pub use cancel::{AbortController, AbortSignal};
pub use concurrent::QueryCache;
pub use context::QueryContext;
pub use keys::{CacheKey, KeyBuilder, KeyFilter, ListKeyParams};
pub use state::{FetchStatus, QueryState, QueryStatus};
