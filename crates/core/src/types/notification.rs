//! Parameters handed to the notification collaborator

use std::fmt;
use std::sync::Arc;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Progress,
}

/// Callback attached to undoable notifications
pub type CancelMutation = Arc<dyn Fn() + Send + Sync>;

/// What to show. Keys let the notification collaborator replace an earlier
/// notification instead of stacking a new one.
#[derive(Clone)]
pub struct OpenNotificationParams {
    pub key: Option<String>,
    pub message: String,
    pub description: Option<String>,
    pub kind: NotificationKind,
    pub undoable_timeout: Option<u32>,
    pub cancel_mutation: Option<CancelMutation>,
}

impl OpenNotificationParams {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            key: None,
            message: message.into(),
            description: None,
            kind,
            undoable_timeout: None,
            cancel_mutation: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_undo(mut self, timeout_secs: u32, cancel: CancelMutation) -> Self {
        self.undoable_timeout = Some(timeout_secs);
        self.cancel_mutation = Some(cancel);
        self
    }

    /// Fill the fields this notification leaves unset from `fallback`
    #[must_use]
    pub fn or_defaults(mut self, fallback: &OpenNotificationParams) -> Self {
        if self.key.is_none() {
            self.key.clone_from(&fallback.key);
        }
        if self.message.is_empty() {
            self.message.clone_from(&fallback.message);
        }
        if self.description.is_none() {
            self.description.clone_from(&fallback.description);
        }
        self
    }
}

impl fmt::Debug for OpenNotificationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenNotificationParams")
            .field("key", &self.key)
            .field("message", &self.message)
            .field("description", &self.description)
            .field("kind", &self.kind)
            .field("undoable_timeout", &self.undoable_timeout)
            .field("cancel_mutation", &self.cancel_mutation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_defaults_keeps_caller_fields() {
        let fallback = OpenNotificationParams::error("Error (status code: 500)")
            .with_key("posts-list-notification")
            .with_description("boom");
        let custom = OpenNotificationParams::error("Could not load posts").or_defaults(&fallback);

        assert_eq!(custom.message, "Could not load posts");
        assert_eq!(custom.key.as_deref(), Some("posts-list-notification"));
        assert_eq!(custom.description.as_deref(), Some("boom"));
    }

    #[test]
    fn test_or_defaults_fills_empty_message() {
        let fallback = OpenNotificationParams::error("Error (status code: 500)");
        let custom = OpenNotificationParams::error("").or_defaults(&fallback);
        assert_eq!(custom.message, "Error (status code: 500)");
    }
}
