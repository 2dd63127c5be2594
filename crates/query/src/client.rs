//! Entry point tying collaborators, configuration and the shared cache together

use crate::config::ListConfig;
use crate::contracts::{
    AuthErrorHandler, DataProvider, DataProviders, DefaultTranslator, LiveCallback, LiveProvider,
    NotificationProvider, ResourceResolver, StaticResourceResolver, Translator,
};
use crate::executor::{CachedList, Executor};
use crate::live::LiveBinder;
use crate::outcome::{OutcomeReactor, TransitionTracker};
use crate::overtime::OvertimeMonitor;
use crate::params::{ListParams, NormalizedParams, Unavailable};
use crate::query::{ListQuery, ListQueryResult, QueryInner};
use listwise_cache::{KeyFilter, QueryCache, QueryState};
use listwise_core::{Error, LiveEvent, Result};
use listwise_utils::query_disabled;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Creates list queries over a shared cache.
///
/// Cloning is cheap; clones share the cache and collaborators.
#[derive(Clone)]
pub struct ListClient {
    config: Arc<ListConfig>,
    cache: Arc<QueryCache<CachedList>>,
    providers: DataProviders,
    resources: Arc<dyn ResourceResolver>,
    notifications: Option<Arc<dyn NotificationProvider>>,
    auth: Option<Arc<dyn AuthErrorHandler>>,
    live: Option<Arc<dyn LiveProvider>>,
    on_live_event: Option<LiveCallback>,
    translator: Arc<dyn Translator>,
}

impl ListClient {
    pub fn builder() -> ListClientBuilder {
        ListClientBuilder::default()
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    /// The shared cache every query of this client reads through
    pub fn cache(&self) -> &Arc<QueryCache<CachedList>> {
        &self.cache
    }

    /// Normalise `params` and build a query handle.
    ///
    /// Must be called within a tokio runtime: the handle spawns its observer.
    pub fn list<R>(&self, params: ListParams<R>) -> ListQuery<R>
    where
        R: Clone + Send + Sync + 'static,
    {
        let normalized = NormalizedParams::resolve(&params, self.resources.as_ref(), &self.config);
        let key = normalized.key();

        let availability = normalized.availability(params.enabled, &self.providers);
        match &availability {
            Err(Unavailable::UnknownProvider(error)) => warn!(
                resource = normalized.identifier.as_deref().unwrap_or(""),
                error = %error,
                "list query cannot run"
            ),
            Err(reason) => query_disabled(normalized.identifier.as_deref(), &reason.to_string()),
            Ok(()) => {}
        }
        let blocked = availability
            .as_ref()
            .err()
            .filter(|reason| reason.is_permanent())
            .map(ToString::to_string);
        debug!(key = %key, enabled = availability.is_ok(), "list query created");

        let executor = Executor::new(
            self.providers.get(&normalized.provider_name),
            normalized.clone(),
            params.select,
        );
        let binder = LiveBinder {
            provider: self.live.clone(),
            cache: Arc::downgrade(&self.cache),
            params: normalized.clone(),
            on_event: params.on_live_event,
            on_any_event: self.on_live_event.clone(),
        };
        let reactor = OutcomeReactor {
            identifier: normalized.identifier().to_string(),
            context: normalized.notification_context(),
            key_suffix: self.config.notification_key_suffix.clone(),
            success: params.success_notification,
            error: params.error_notification,
            notifications: self.notifications.clone(),
            auth: self.auth.clone(),
            translator: Arc::clone(&self.translator),
        };
        let overtime = OvertimeMonitor::new(params.overtime.resolve(&self.config.overtime));
        let (results, _) = watch::channel(ListQueryResult {
            status: listwise_cache::QueryStatus::Pending,
            fetch_status: listwise_cache::FetchStatus::Idle,
            result: Default::default(),
            error: None,
            overtime: None,
            is_enabled: availability.is_ok(),
        });

        ListQuery::start(QueryInner {
            key,
            params: normalized,
            cache: Arc::clone(&self.cache),
            executor,
            enabled: AtomicBool::new(availability.is_ok()),
            blocked,
            binder,
            binding: Mutex::new(None),
            reactor,
            tracker: Mutex::new(TransitionTracker::new(&QueryState::<CachedList>::default())),
            overtime,
            results,
        })
    }

    /// Invalidate every list query of `resource` served by `provider`
    /// (the configured default when `None`). Active queries refetch.
    pub fn invalidate(&self, resource: &str, provider: Option<&str>) -> usize {
        let provider = provider.unwrap_or(&self.config.default_data_provider);
        self.cache.invalidate(&KeyFilter::resource(provider, resource))
    }

    /// Invalidate with an arbitrary filter
    pub fn invalidate_matching(&self, filter: &KeyFilter) -> usize {
        self.cache.invalidate(filter)
    }
}

impl fmt::Debug for ListClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListClient")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .field("cached_queries", &self.cache.len())
            .field("live", &self.live.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ListClient`]
#[derive(Default)]
pub struct ListClientBuilder {
    config: Option<ListConfig>,
    providers: DataProviders,
    resources: Option<Arc<dyn ResourceResolver>>,
    notifications: Option<Arc<dyn NotificationProvider>>,
    auth: Option<Arc<dyn AuthErrorHandler>>,
    live: Option<Arc<dyn LiveProvider>>,
    on_live_event: Option<LiveCallback>,
    translator: Option<Arc<dyn Translator>>,
}

impl ListClientBuilder {
    pub fn config(mut self, config: ListConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register `provider` under the configured default provider name
    pub fn data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        let name = self
            .config
            .as_ref()
            .map(|config| config.default_data_provider.clone())
            .unwrap_or_else(|| listwise_core::DEFAULT_DATA_PROVIDER.to_string());
        self.providers.insert(name, provider);
        self
    }

    pub fn named_data_provider(
        mut self,
        name: impl Into<String>,
        provider: Arc<dyn DataProvider>,
    ) -> Self {
        self.providers.insert(name, provider);
        self
    }

    pub fn data_providers(mut self, providers: DataProviders) -> Self {
        self.providers = providers;
        self
    }

    pub fn resources(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resources = Some(resolver);
        self
    }

    pub fn notifications(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.notifications = Some(provider);
        self
    }

    pub fn auth_handler(mut self, handler: Arc<dyn AuthErrorHandler>) -> Self {
        self.auth = Some(handler);
        self
    }

    pub fn live_provider(mut self, provider: Arc<dyn LiveProvider>) -> Self {
        self.live = Some(provider);
        self
    }

    /// Hook receiving every live event delivered to any query of the client
    pub fn on_live_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LiveEvent) + Send + Sync + 'static,
    {
        self.on_live_event = Some(Arc::new(callback));
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn build(self) -> Result<ListClient> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        if self.providers.is_empty() {
            return Err(Error::configuration(
                "at least one data provider must be registered",
            ));
        }

        Ok(ListClient {
            cache: Arc::new(QueryCache::with_stale_time(config.stale_time())),
            config: Arc::new(config),
            providers: self.providers,
            resources: self
                .resources
                .unwrap_or_else(|| Arc::new(StaticResourceResolver::default()) as Arc<dyn ResourceResolver>),
            notifications: self.notifications,
            auth: self.auth,
            live: self.live,
            on_live_event: self.on_live_event,
            translator: self
                .translator
                .unwrap_or_else(|| Arc::new(DefaultTranslator) as Arc<dyn Translator>),
        })
    }
}
