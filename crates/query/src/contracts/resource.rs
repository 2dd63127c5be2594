//! Resource resolution contract and a fixed-list resolver

use listwise_core::{Meta, PaginationMode};
use serde::{Deserialize, Serialize};

/// A resource as registered with the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceItem {
    /// Name sent to the data provider
    pub name: String,
    /// Cache and notification identity; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Meta merged under every call-site meta for this resource
    #[serde(default)]
    pub meta: Meta,
    /// Provider serving this resource when the call site names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_provider_name: Option<String>,
    /// Pagination mode for this resource when the call site names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_mode: Option<PaginationMode>,
}

impl ResourceItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn with_data_provider(mut self, name: impl Into<String>) -> Self {
        self.data_provider_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_pagination_mode(mut self, mode: PaginationMode) -> Self {
        self.pagination_mode = Some(mode);
        self
    }

    pub fn identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or(&self.name)
    }
}

/// Outcome of resolving the active resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceResolution {
    /// Every resource the host knows
    pub resources: Vec<ResourceItem>,
    pub resource: Option<ResourceItem>,
    /// `None` when no resource could be determined
    pub identifier: Option<String>,
}

impl ResourceResolution {
    pub fn unresolved(resources: Vec<ResourceItem>) -> Self {
        Self {
            resources,
            resource: None,
            identifier: None,
        }
    }
}

/// Resolves the resource a list query targets
pub trait ResourceResolver: Send + Sync {
    /// `name` is the call-site override; `None` asks for the ambient resource
    fn resolve(&self, name: Option<&str>) -> ResourceResolution;
}

/// Resolver over a fixed set of resources with an optional active one
#[derive(Debug, Clone, Default)]
pub struct StaticResourceResolver {
    resources: Vec<ResourceItem>,
    active: Option<String>,
}

impl StaticResourceResolver {
    pub fn new(resources: Vec<ResourceItem>) -> Self {
        Self {
            resources,
            active: None,
        }
    }

    /// Resource used when a query names none, as a router would supply
    #[must_use]
    pub fn with_active(mut self, name: impl Into<String>) -> Self {
        self.active = Some(name.into());
        self
    }

    fn find(&self, name: &str) -> Option<&ResourceItem> {
        self.resources
            .iter()
            .find(|item| item.identifier.as_deref() == Some(name))
            .or_else(|| self.resources.iter().find(|item| item.name == name))
    }
}

impl ResourceResolver for StaticResourceResolver {
    fn resolve(&self, name: Option<&str>) -> ResourceResolution {
        let Some(name) = name.or(self.active.as_deref()) else {
            return ResourceResolution::unresolved(self.resources.clone());
        };

        let resource = self
            .find(name)
            .cloned()
            .unwrap_or_else(|| ResourceItem::new(name));
        ResourceResolution {
            resources: self.resources.clone(),
            identifier: Some(resource.identifier().to_string()),
            resource: Some(resource),
        }
    }
}
