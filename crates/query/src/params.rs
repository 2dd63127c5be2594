//! Call-site parameters of a list query and their normalised form

use crate::config::ListConfig;
use crate::contracts::{DataProviders, LiveCallback, ResourceItem, ResourceResolver};
use crate::outcome::{NotificationContext, NotificationSetting};
use crate::overtime::OvertimeOptions;
use listwise_cache::{CacheKey, KeyBuilder, ListKeyParams};
use listwise_core::{
    BaseRecord, CrudFilters, CrudSorting, Error, ListResult, LiveEvent, LiveMode, Meta,
    Pagination, PaginationInput, PaginationMode,
};
use std::fmt;
use std::sync::Arc;

/// Reshapes the exposed envelope after client-side slicing
pub type SelectFn<R> = Arc<dyn Fn(ListResult) -> ListResult<R> + Send + Sync>;

/// What a caller asks for. Every field is optional; [`NormalizedParams`]
/// fills the gaps from the resolved resource and the client configuration.
pub struct ListParams<R = BaseRecord> {
    /// Resource override; `None` uses the resolver's active resource
    pub resource: Option<String>,
    pub pagination: Option<PaginationInput>,
    pub filters: CrudFilters,
    pub sorters: CrudSorting,
    pub meta: Meta,
    pub data_provider_name: Option<String>,
    /// Explicit enable flag; when unset the query runs iff the resource resolves
    pub enabled: Option<bool>,
    pub live_mode: Option<LiveMode>,
    pub on_live_event: Option<LiveCallback>,
    pub success_notification: Option<NotificationSetting<ListResult>>,
    pub error_notification: Option<NotificationSetting<Error>>,
    pub overtime: OvertimeOptions,
    pub(crate) select: SelectFn<R>,
}

impl ListParams<BaseRecord> {
    pub fn new() -> Self {
        Self::selecting(|result: ListResult| result)
    }
}

impl Default for ListParams<BaseRecord> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ListParams<R> {
    /// Parameters whose exposed envelope is reshaped by `select`
    pub fn selecting<F>(select: F) -> Self
    where
        F: Fn(ListResult) -> ListResult<R> + Send + Sync + 'static,
    {
        Self {
            resource: None,
            pagination: None,
            filters: Vec::new(),
            sorters: Vec::new(),
            meta: Meta::new(),
            data_provider_name: None,
            enabled: None,
            live_mode: None,
            on_live_event: None,
            success_notification: None,
            error_notification: None,
            overtime: OvertimeOptions::default(),
            select: Arc::new(select),
        }
    }

    #[must_use]
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    #[must_use]
    pub fn pagination(mut self, pagination: PaginationInput) -> Self {
        self.pagination = Some(pagination);
        self
    }

    #[must_use]
    pub fn filters(mut self, filters: CrudFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn sorters(mut self, sorters: CrudSorting) -> Self {
        self.sorters = sorters;
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn data_provider(mut self, name: impl Into<String>) -> Self {
        self.data_provider_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn live_mode(mut self, mode: LiveMode) -> Self {
        self.live_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn on_live_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LiveEvent) + Send + Sync + 'static,
    {
        self.on_live_event = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn success_notification(mut self, setting: NotificationSetting<ListResult>) -> Self {
        self.success_notification = Some(setting);
        self
    }

    #[must_use]
    pub fn error_notification(mut self, setting: NotificationSetting<Error>) -> Self {
        self.error_notification = Some(setting);
        self
    }

    #[must_use]
    pub fn overtime(mut self, overtime: OvertimeOptions) -> Self {
        self.overtime = overtime;
        self
    }
}

impl<R> fmt::Debug for ListParams<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListParams")
            .field("resource", &self.resource)
            .field("pagination", &self.pagination)
            .field("filters", &self.filters)
            .field("sorters", &self.sorters)
            .field("meta", &self.meta)
            .field("data_provider_name", &self.data_provider_name)
            .field("enabled", &self.enabled)
            .field("live_mode", &self.live_mode)
            .finish_non_exhaustive()
    }
}

/// Fully resolved request parameters of one list query
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedParams {
    /// Resource name handed to the data provider; empty when unresolved
    pub resource_name: String,
    /// Cache and notification identity; `None` when unresolved
    pub identifier: Option<String>,
    pub resource: Option<ResourceItem>,
    pub pagination: Pagination,
    pub filters: CrudFilters,
    pub sorters: CrudSorting,
    /// Resource meta with call-site meta layered on top
    pub meta: Meta,
    pub provider_name: String,
    pub live_mode: LiveMode,
}

impl NormalizedParams {
    /// Resolve `params` against the registered resources and `config`
    pub fn resolve<R>(
        params: &ListParams<R>,
        resolver: &dyn ResourceResolver,
        config: &ListConfig,
    ) -> Self {
        let resolution = resolver.resolve(params.resource.as_deref());
        let resource = resolution.resource;

        let input = params.pagination.unwrap_or_default();
        let mode = input
            .mode
            .or_else(|| resource.as_ref().and_then(|item| item.pagination_mode))
            .unwrap_or(config.default_pagination_mode);
        let pagination = Pagination::new(
            input.current_page.unwrap_or(config.default_current_page),
            input.page_size.unwrap_or(config.default_page_size),
            mode,
        );

        let meta = match &resource {
            Some(item) => Meta::merged(&item.meta, &params.meta),
            None => params.meta.clone(),
        };

        let provider_name = params
            .data_provider_name
            .clone()
            .or_else(|| {
                resource
                    .as_ref()
                    .and_then(|item| item.data_provider_name.clone())
            })
            .unwrap_or_else(|| config.default_data_provider.clone());

        Self {
            resource_name: resource
                .as_ref()
                .map(|item| item.name.clone())
                .unwrap_or_default(),
            identifier: resolution.identifier,
            resource,
            pagination,
            filters: params.filters.clone(),
            sorters: params.sorters.clone(),
            meta,
            provider_name,
            live_mode: params.live_mode.unwrap_or(config.live_mode),
        }
    }

    /// Identifier used in cache keys and notification keys
    pub fn identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.identifier.is_some()
    }

    pub fn is_client_paginated(&self) -> bool {
        self.pagination.mode == PaginationMode::Client
    }

    /// `[provider, identifier, "list", {meta, filters, pagination, sorters}]`
    pub fn key(&self) -> CacheKey {
        let params = ListKeyParams::new(&self.meta, &self.filters, &self.pagination, &self.sorters);
        KeyBuilder::data(&self.provider_name)
            .resource(self.identifier())
            .params(params.to_value())
            .build()
    }

    pub fn notification_context(&self) -> NotificationContext {
        NotificationContext {
            meta: self.meta.clone(),
            filters: self.filters.clone(),
            sorters: self.sorters.clone(),
            pagination: self.pagination,
        }
    }

    /// Whether the query may execute, and why not when it may not.
    ///
    /// An explicit flag overrides resource resolution; a provider that is not
    /// registered disables the query either way.
    pub fn availability(
        &self,
        enabled: Option<bool>,
        providers: &DataProviders,
    ) -> std::result::Result<(), Unavailable> {
        if !providers.contains(&self.provider_name) {
            return Err(Unavailable::UnknownProvider(Error::resolution(
                "data provider",
                format!("'{}' is not registered", self.provider_name),
            )));
        }
        match enabled {
            Some(true) => Ok(()),
            Some(false) => Err(Unavailable::DisabledByCaller),
            None if self.is_resolved() => Ok(()),
            None => Err(Unavailable::UnresolvedResource(Error::resolution(
                "resource",
                "none was given and none is active",
            ))),
        }
    }
}

/// Why a list query may not execute
#[derive(Debug, Clone, PartialEq)]
pub enum Unavailable {
    DisabledByCaller,
    UnresolvedResource(Error),
    /// Blocks the query for its whole lifetime, whatever the enable flag says
    UnknownProvider(Error),
}

impl Unavailable {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Unavailable::UnknownProvider(_))
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::DisabledByCaller => f.write_str("disabled by caller"),
            Unavailable::UnresolvedResource(error) | Unavailable::UnknownProvider(error) => {
                write!(f, "{error}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{DataProvider, ListRequest, StaticResourceResolver};
    use async_trait::async_trait;
    use listwise_core::{CrudSort, Result};

    struct NullProvider;

    #[async_trait]
    impl DataProvider for NullProvider {
        async fn get_list(&self, _request: ListRequest) -> Result<ListResult> {
            Ok(ListResult::empty())
        }
    }

    fn resolver() -> StaticResourceResolver {
        StaticResourceResolver::new(vec![
            ResourceItem::new("posts").with_meta(Meta::new().with("locale", "en").with("audience", "all")),
            ResourceItem::new("users")
                .with_pagination_mode(PaginationMode::Client)
                .with_data_provider("accounts"),
        ])
    }

    #[test]
    fn test_pagination_defaults() {
        let normalized =
            NormalizedParams::resolve(&ListParams::new().resource("posts"), &resolver(), &ListConfig::default());
        assert_eq!(normalized.pagination, Pagination::new(1, 10, PaginationMode::Server));
        assert_eq!(normalized.resource_name, "posts");
        assert_eq!(normalized.provider_name, "default");
        assert_eq!(normalized.live_mode, LiveMode::Off);
    }

    #[test]
    fn test_pagination_mode_precedence() {
        let config = ListConfig {
            default_pagination_mode: PaginationMode::Off,
            default_page_size: 20,
            ..ListConfig::default()
        };

        let from_config = NormalizedParams::resolve(&ListParams::new().resource("posts"), &resolver(), &config);
        assert_eq!(from_config.pagination.mode, PaginationMode::Off);
        assert_eq!(from_config.pagination.page_size, 20);

        let from_resource = NormalizedParams::resolve(&ListParams::new().resource("users"), &resolver(), &config);
        assert_eq!(from_resource.pagination.mode, PaginationMode::Client);

        let params = ListParams::new()
            .resource("users")
            .pagination(PaginationInput::new().mode(PaginationMode::Server).current_page(3));
        let from_caller = NormalizedParams::resolve(&params, &resolver(), &config);
        assert_eq!(from_caller.pagination, Pagination::new(3, 20, PaginationMode::Server));
    }

    #[test]
    fn test_call_site_meta_wins() {
        let params = ListParams::new()
            .resource("posts")
            .meta(Meta::new().with("locale", "de").with("draft", true));
        let normalized = NormalizedParams::resolve(&params, &resolver(), &ListConfig::default());

        assert_eq!(normalized.meta.get("locale"), Some(&serde_json::json!("de")));
        assert_eq!(normalized.meta.get("audience"), Some(&serde_json::json!("all")));
        assert_eq!(normalized.meta.get("draft"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_provider_selection_order() {
        let config = ListConfig::default();
        let from_resource = NormalizedParams::resolve(&ListParams::new().resource("users"), &resolver(), &config);
        assert_eq!(from_resource.provider_name, "accounts");

        let from_call_site = NormalizedParams::resolve(
            &ListParams::new().resource("users").data_provider("archive"),
            &resolver(),
            &config,
        );
        assert_eq!(from_call_site.provider_name, "archive");
    }

    #[test]
    fn test_key_excludes_client_pagination() {
        let config = ListConfig::default();
        let server = NormalizedParams::resolve(&ListParams::new().resource("posts"), &resolver(), &config);
        assert!(server.key().params().get("pagination").is_some());

        let client = NormalizedParams::resolve(
            &ListParams::new()
                .resource("posts")
                .pagination(PaginationInput::new().mode(PaginationMode::Client)),
            &resolver(),
            &config,
        );
        assert!(client.key().params().get("pagination").is_none());
        assert_eq!(client.key().resource(), "posts");
        assert_eq!(client.key().provider(), "default");
    }

    #[test]
    fn test_unresolved_resource() {
        let params = ListParams::new().sorters(vec![CrudSort::asc("id")]);
        let normalized = NormalizedParams::resolve(&params, &resolver(), &ListConfig::default());
        assert!(!normalized.is_resolved());
        assert_eq!(normalized.identifier(), "");
        assert_eq!(normalized.resource_name, "");
        assert_eq!(normalized.key().resource(), "");
    }

    #[test]
    fn test_availability() {
        let providers = DataProviders::single(Arc::new(NullProvider));
        let config = ListConfig::default();

        let resolved = NormalizedParams::resolve(&ListParams::new().resource("posts"), &resolver(), &config);
        assert!(resolved.availability(None, &providers).is_ok());
        assert_eq!(
            resolved.availability(Some(false), &providers),
            Err(Unavailable::DisabledByCaller)
        );

        let unresolved = NormalizedParams::resolve(&ListParams::new(), &resolver(), &config);
        assert!(matches!(
            unresolved.availability(None, &providers),
            Err(Unavailable::UnresolvedResource(_))
        ));
        assert!(unresolved.availability(Some(true), &providers).is_ok());

        let missing = NormalizedParams::resolve(&ListParams::new().resource("users"), &resolver(), &config);
        let reason = missing.availability(Some(true), &providers).unwrap_err();
        assert!(reason.is_permanent());
        assert!(matches!(
            &reason,
            Unavailable::UnknownProvider(Error::Resolution { subject, .. }) if subject == "data provider"
        ));
        assert!(reason.to_string().contains("accounts"));
    }
}
