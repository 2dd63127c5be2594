//! Auth-error interception contract

use async_trait::async_trait;
use listwise_core::Error;

/// Central handler for failures that may call for re-authentication.
///
/// Every backend error of a list query is forwarded here. The handler decides
/// on its own whether the error is an authorization failure; its outcome is
/// not consumed by the query.
#[async_trait]
pub trait AuthErrorHandler: Send + Sync {
    async fn on_error(&self, error: &Error);
}
