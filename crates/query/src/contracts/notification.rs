//! Notification contract

use listwise_core::OpenNotificationParams;

/// Displays notifications to the user
pub trait NotificationProvider: Send + Sync {
    fn open(&self, params: OpenNotificationParams);

    fn close(&self, key: &str);
}
