//! Structured backend failures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Failure reported by a data provider's list operation.
///
/// Mirrors the shape backends conventionally answer with: a numeric status,
/// a message and optional per-field validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (status code: {status_code})")]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl HttpError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            errors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_deserializes_from_backend_shape() {
        let error: HttpError =
            serde_json::from_str(r#"{"statusCode":401,"message":"Unauthorized"}"#).unwrap();
        assert_eq!(error.status_code, 401);
        assert_eq!(error.message, "Unauthorized");
        assert!(error.errors.is_none());
    }

    #[test]
    fn test_http_error_keeps_field_errors() {
        let error: HttpError = serde_json::from_str(
            r#"{"statusCode":422,"message":"Invalid","errors":{"title":["required","too short"]}}"#,
        )
        .unwrap();
        let errors = error.errors.unwrap();
        assert_eq!(errors["title"], vec!["required", "too short"]);
    }
}
