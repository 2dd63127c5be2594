//! Data provider contract and registry

use async_trait::async_trait;
use listwise_cache::QueryContext;
use listwise_core::{
    CrudFilters, CrudSorting, ListResult, Meta, Pagination, Result, DEFAULT_DATA_PROVIDER,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One list request as seen by a backend
#[derive(Debug, Clone)]
pub struct ListRequest {
    /// Resource name, as registered
    pub resource: String,
    pub pagination: Pagination,
    pub filters: CrudFilters,
    pub sorters: CrudSorting,
    /// Merged resource and call-site meta
    pub meta: Meta,
    /// Active cache key and the signal that aborts this request
    pub context: QueryContext,
}

/// A backend able to list records of a resource.
///
/// Implementations should watch `request.context.signal` and stop work when
/// it fires; the orchestrator drops the returned future on abort either way.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get_list(&self, request: ListRequest) -> Result<ListResult>;
}

/// Data providers addressable by name
#[derive(Clone, Default)]
pub struct DataProviders {
    providers: HashMap<String, Arc<dyn DataProvider>>,
}

impl DataProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `provider` under the default name
    pub fn single(provider: Arc<dyn DataProvider>) -> Self {
        Self::new().with(DEFAULT_DATA_PROVIDER, provider)
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, provider: Arc<dyn DataProvider>) -> Self {
        self.insert(name, provider);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, provider: Arc<dyn DataProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DataProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for DataProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProviders")
            .field("names", &self.names())
            .finish()
    }
}
