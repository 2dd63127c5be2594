//! Backend invocation and the post-fetch transform

use crate::contracts::{DataProvider, ListRequest};
use crate::params::{NormalizedParams, SelectFn};
use futures::future::{BoxFuture, FutureExt};
use listwise_cache::QueryContext;
use listwise_core::{Error, ListResult, Result};
use listwise_utils::{query_completed, query_span, Memo};
use std::ops::Range;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;

/// Value stored in the shared cache: the backend envelope, untouched
pub type CachedList = Arc<ListResult>;

/// Inputs the exposed envelope is derived from. Equality is identity for
/// the fetched envelope and the select function.
#[derive(Clone)]
struct ProjectionInputs {
    raw: CachedList,
    window: Option<Range<usize>>,
    select: usize,
}

impl PartialEq for ProjectionInputs {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.raw, &other.raw)
            && self.window == other.window
            && self.select == other.select
    }
}

/// Runs the list operation of one query and derives what it exposes
pub(crate) struct Executor<R> {
    provider: Option<Arc<dyn DataProvider>>,
    params: NormalizedParams,
    select: SelectFn<R>,
    projection: Memo<ProjectionInputs, ListResult<R>>,
}

impl<R> Executor<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        provider: Option<Arc<dyn DataProvider>>,
        params: NormalizedParams,
        select: SelectFn<R>,
    ) -> Self {
        Self {
            provider,
            params,
            select,
            projection: Memo::new(),
        }
    }

    /// Fetcher handed to the cache. The cache supplies the context carrying
    /// the active key and abort signal when it actually launches a request.
    pub(crate) fn fetcher(
        &self,
    ) -> impl FnOnce(QueryContext) -> BoxFuture<'static, Result<CachedList>> + Send + 'static {
        let provider = self.provider.clone();
        let params = self.params.clone();

        move |context: QueryContext| {
            async move {
                let provider = provider
                    .ok_or_else(|| Error::provider_not_found(params.provider_name.clone()))?;
                let label = context.key.fingerprint();
                let span = query_span(&label, &params.resource_name);
                let request = ListRequest {
                    resource: params.resource_name,
                    pagination: params.pagination,
                    filters: params.filters,
                    sorters: params.sorters,
                    meta: params.meta,
                    context,
                };

                let started = Instant::now();
                let outcome = provider.get_list(request).instrument(span).await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                query_completed(&label, elapsed_ms, outcome.is_ok());
                outcome.map(Arc::new)
            }
            .boxed()
        }
    }

    /// The envelope consumers see: client-mode window first, then `select`.
    /// Recomputed only when the fetched envelope changes.
    pub(crate) fn project(&self, raw: &CachedList) -> ListResult<R> {
        let inputs = ProjectionInputs {
            raw: Arc::clone(raw),
            window: self.params.pagination.client_window(),
            select: Arc::as_ptr(&self.select).cast::<()>() as usize,
        };
        let window = inputs.window.clone();
        self.projection.get_or_compute(inputs, || {
            let sliced = match window {
                Some(window) => raw.window(window),
                None => ListResult::clone(raw),
            };
            (self.select)(sliced)
        })
    }
}
