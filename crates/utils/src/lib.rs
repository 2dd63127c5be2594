//! Shared utilities and pure functions for listwise
//!
//! This crate provides the logging setup and the small memoisation primitive
//! used throughout the listwise workspace.

pub mod memo;
pub mod tracing;

pub use self::memo::Memo;
pub use self::tracing::{cache_event, init, init_with_default, query_completed, query_disabled, query_span};
