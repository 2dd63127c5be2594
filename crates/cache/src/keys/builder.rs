//! Fluent construction of cache keys

use super::CacheKey;
use listwise_core::LIST_ACTION;
use serde_json::Value;

/// Builds a [`CacheKey`] segment by segment:
/// `KeyBuilder::data(provider).resource(id).action("list").params(p).build()`.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    provider: String,
    resource: String,
    action: String,
    params: Value,
}

impl KeyBuilder {
    /// Start a key for data served by `provider`
    pub fn data(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            resource: String::new(),
            action: LIST_ACTION.to_string(),
            params: Value::Object(Default::default()),
        }
    }

    /// Resource identifier. An unresolved resource is keyed as the empty string.
    #[must_use]
    pub fn resource(mut self, identifier: impl Into<String>) -> Self {
        self.resource = identifier.into();
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    #[must_use]
    pub fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> CacheKey {
        CacheKey::from_parts(self.provider, self.resource, self.action, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_to_list_action() {
        let key = KeyBuilder::data("default").resource("posts").build();
        assert_eq!(key.action(), "list");
        assert_eq!(key.params(), &json!({}));
    }

    #[test]
    fn test_unresolved_resource_is_empty() {
        let key = KeyBuilder::data("default").build();
        assert_eq!(key.resource(), "");
    }

    #[test]
    fn test_each_segment_participates() {
        let base = KeyBuilder::data("default").resource("posts").params(json!({"a": 1}));
        let key = base.clone().build();

        assert_ne!(key, base.clone().action("many").build());
        assert_ne!(key, base.clone().resource("users").build());
        assert_ne!(key, KeyBuilder::data("other").resource("posts").params(json!({"a": 1})).build());
        assert_ne!(key, base.clone().params(json!({"a": 2})).build());
        assert_eq!(key, base.build());
    }
}
