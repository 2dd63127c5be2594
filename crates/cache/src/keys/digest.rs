//! Canonical encoding and digests for cache key parameters

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Rebuild `value` with every object's keys in sorted order.
///
/// Array order is preserved: filter and sort sequences are ordered by
/// meaning.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut canonical = Map::with_capacity(entries.len());
            for (key, nested) in entries {
                canonical.insert(key.clone(), canonicalize(nested));
            }
            Value::Object(canonical)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Compact JSON text of an already canonical value
pub fn canonical_string(value: &Value) -> String {
    value.to_string()
}

/// First 16 hex characters of the SHA-256 of `text`
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_are_sorted() {
        let value = json!({"z": {"b": 1, "a": [ {"y": 1, "x": 2} ]}, "a": null});
        assert_eq!(
            canonical_string(&canonicalize(&value)),
            r#"{"a":null,"z":{"a":[{"x":2,"y":1}],"b":1}}"#
        );
    }

    #[test]
    fn test_array_order_is_kept() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonical_string(&canonicalize(&value)), "[3,1,2]");
    }

    #[test]
    fn test_fingerprint_differs_per_input() {
        assert_ne!(fingerprint("a"), fingerprint("b"));
        assert_eq!(fingerprint("a"), fingerprint("a"));
    }
}
