//! Request context supplied to a fetcher at invocation time

use crate::cancel::AbortSignal;
use crate::keys::CacheKey;

/// The active cache key and the cancellation signal of one invocation.
///
/// Data providers receive it with every request so they can abort obsolete
/// network or storage work.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub key: CacheKey,
    pub signal: AbortSignal,
}

impl QueryContext {
    pub fn new(key: CacheKey, signal: AbortSignal) -> Self {
        Self { key, signal }
    }
}
