//! Hierarchical cache keys
//!
//! A key is the ordered sequence `[provider, resource, action, params]`. The
//! params segment is stored in canonical JSON form, so two parameter sets
//! that are equal by value always produce equal keys.

pub mod builder;
pub mod digest;
pub mod params;

pub use builder::KeyBuilder;
pub use params::ListKeyParams;

use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of one logical query
#[derive(Debug, Clone)]
pub struct CacheKey {
    provider: String,
    resource: String,
    action: String,
    params: Value,
    canonical: String,
}

impl CacheKey {
    pub(crate) fn from_parts(
        provider: String,
        resource: String,
        action: String,
        params: Value,
    ) -> Self {
        let params = digest::canonicalize(&params);
        let canonical = digest::canonical_string(&params);
        Self {
            provider,
            resource,
            action,
            params,
            canonical,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    /// The key as a JSON array `[provider, resource, action, params]`
    pub fn segments(&self) -> Value {
        Value::Array(vec![
            Value::String(self.provider.clone()),
            Value::String(self.resource.clone()),
            Value::String(self.action.clone()),
            self.params.clone(),
        ])
    }

    /// Short stable digest for log fields
    pub fn fingerprint(&self) -> String {
        digest::fingerprint(&self.to_string())
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider
            && self.resource == other.resource
            && self.action == other.action
            && self.canonical == other.canonical
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.resource.hash(state);
        self.action.hash(state);
        self.canonical.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{},{}]",
            Value::String(self.provider.clone()),
            Value::String(self.resource.clone()),
            Value::String(self.action.clone()),
            self.canonical
        )
    }
}

/// Selects the cache entries an invalidation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    /// Exactly one key
    Exact(CacheKey),
    /// Every key of one resource served by one provider
    Resource { provider: String, resource: String },
    /// Every key served by one provider
    Provider(String),
    /// Every key
    All,
}

impl KeyFilter {
    pub fn resource(provider: impl Into<String>, resource: impl Into<String>) -> Self {
        KeyFilter::Resource {
            provider: provider.into(),
            resource: resource.into(),
        }
    }

    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            KeyFilter::Exact(exact) => exact == key,
            KeyFilter::Resource { provider, resource } => {
                key.provider == *provider && key.resource == *resource
            }
            KeyFilter::Provider(provider) => key.provider == *provider,
            KeyFilter::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(resource: &str, params: Value) -> CacheKey {
        KeyBuilder::data("default")
            .resource(resource)
            .action("list")
            .params(params)
            .build()
    }

    #[test]
    fn test_display_is_json_array() {
        let key = key("posts", json!({"filters": []}));
        assert_eq!(key.to_string(), r#"["default","posts","list",{"filters":[]}]"#);
        assert_eq!(
            key.segments(),
            json!(["default", "posts", "list", {"filters": []}])
        );
    }

    #[test]
    fn test_resource_filter() {
        let posts = key("posts", json!({}));
        let users = key("users", json!({}));
        let filter = KeyFilter::resource("default", "posts");

        assert!(filter.matches(&posts));
        assert!(!filter.matches(&users));
        assert!(KeyFilter::All.matches(&users));
        assert!(KeyFilter::Provider("default".into()).matches(&users));
        assert!(!KeyFilter::Provider("other".into()).matches(&users));
        assert!(KeyFilter::Exact(posts.clone()).matches(&posts));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = key("posts", json!({"b": 1, "a": 2}));
        let b = key("posts", json!({"a": 2, "b": 1}));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
