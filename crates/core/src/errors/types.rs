//! Core error type definitions

use super::http::HttpError;

/// Result type alias for listwise operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for listwise operations.
///
/// Every variant is cheap to clone: a single terminal error is handed to
/// every caller that joined the same in-flight request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Structured failure reported by a data provider
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A resource or provider could not be determined
    #[error("failed to resolve {subject}: {message}")]
    Resolution { subject: String, message: String },

    /// No data provider is registered under the requested name
    #[error("data provider '{name}' is not registered")]
    ProviderNotFound { name: String },

    /// The request was superseded or aborted before it settled
    #[error("request for {key} was cancelled")]
    Cancelled { key: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization/deserialization errors
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// A live subscription could not be established
    #[error("subscription to '{channel}' failed: {message}")]
    Subscription { channel: String, message: String },

    /// A fetcher panicked or its task was lost
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// HTTP status code carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http(http) => Some(http.status_code),
            _ => None,
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Error::Http(http) => http.message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the error only records that a request was aborted
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Whether the error is an authentication or authorization failure
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }
}
