//! Builder methods for creating errors with context

use super::http::HttpError;
use super::types::Error;

// Helper methods for creating errors with context
impl Error {
    /// Create an HTTP error from a status code and message
    #[must_use]
    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Error::Http(HttpError::new(status_code, message))
    }

    /// Create a resolution error
    #[must_use]
    pub fn resolution(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Resolution {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a provider-not-found error
    #[must_use]
    pub fn provider_not_found(name: impl Into<String>) -> Self {
        Error::ProviderNotFound { name: name.into() }
    }

    /// Create a cancellation error for the request identified by `key`
    #[must_use]
    pub fn cancelled(key: impl Into<String>) -> Self {
        Error::Cancelled { key: key.into() }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Error::Serialization {
            message: message.into(),
        }
    }

    /// Create a subscription error
    #[must_use]
    pub fn subscription(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Subscription {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_exposes_status_code() {
        let error = Error::http(401, "Unauthorized");
        assert_eq!(error.status_code(), Some(401));
        assert_eq!(error.message(), "Unauthorized");
        assert!(error.is_auth_failure());
        assert!(!error.is_cancelled());
    }

    #[test]
    fn test_non_http_errors_have_no_status() {
        let error = Error::resolution("resource", "no active route");
        assert_eq!(error.status_code(), None);
        assert_eq!(
            error.to_string(),
            "failed to resolve resource: no active route"
        );
    }

    #[test]
    fn test_cancelled_is_detected() {
        let error = Error::cancelled("[\"default\",\"posts\",\"list\",{}]");
        assert!(error.is_cancelled());
    }
}
