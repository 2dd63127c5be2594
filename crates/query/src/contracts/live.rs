//! Live-event subscription contract and an in-process provider

use listwise_core::{
    CrudFilters, CrudSorting, Error, LiveEvent, LiveEventType, LiveMode, Meta, Pagination, Result,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Handle returned by a subscription, used to release it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Called for every event delivered to a subscription
pub type LiveCallback = Arc<dyn Fn(&LiveEvent) + Send + Sync>;

/// Query context attached to a subscription so the event source can scope events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionParams {
    /// Origin use-case marker
    #[serde(rename = "type")]
    pub subscription_type: String,
    pub resource: String,
    pub pagination: Pagination,
    pub filters: CrudFilters,
    pub sorters: CrudSorting,
    pub meta: Meta,
}

#[derive(Clone)]
pub struct SubscribeRequest {
    pub channel: String,
    pub types: Vec<LiveEventType>,
    pub params: SubscriptionParams,
    pub mode: LiveMode,
    pub callback: LiveCallback,
}

impl fmt::Debug for SubscribeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeRequest")
            .field("channel", &self.channel)
            .field("types", &self.types)
            .field("params", &self.params)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Real-time transport
pub trait LiveProvider: Send + Sync {
    fn subscribe(&self, request: SubscribeRequest) -> Result<SubscriptionId>;

    /// Releasing an unknown or already released subscription is a no-op
    fn unsubscribe(&self, id: &SubscriptionId);
}

struct Listener {
    id: SubscriptionId,
    channel: String,
    types: Vec<LiveEventType>,
    callback: LiveCallback,
}

/// Live provider delivering events published in the same process.
///
/// Listeners are snapshotted before delivery and the lock is never held
/// during callbacks, so a callback may subscribe or unsubscribe.
#[derive(Default)]
pub struct LocalLiveProvider {
    listeners: Mutex<Vec<Listener>>,
}

impl LocalLiveProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every subscription of its channel whose types match.
    /// Returns the number of callbacks invoked.
    pub fn publish(&self, event: &LiveEvent) -> usize {
        let snapshot: Vec<LiveCallback> = {
            let listeners = self.listeners.lock();
            listeners
                .iter()
                .filter(|listener| listener.channel == event.channel)
                .filter(|listener| {
                    listener
                        .types
                        .iter()
                        .any(|kind| kind.matches(&event.event_type))
                })
                .map(|listener| Arc::clone(&listener.callback))
                .collect()
        };
        for callback in &snapshot {
            callback(event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|listener| listener.channel == channel)
            .count()
    }
}

impl LiveProvider for LocalLiveProvider {
    fn subscribe(&self, request: SubscribeRequest) -> Result<SubscriptionId> {
        if request.channel.is_empty() {
            return Err(Error::subscription(
                request.channel,
                "channel name must not be empty",
            ));
        }
        let id = SubscriptionId::random();
        self.listeners.lock().push(Listener {
            id: id.clone(),
            channel: request.channel,
            types: request.types,
            callback: request.callback,
        });
        Ok(id)
    }

    fn unsubscribe(&self, id: &SubscriptionId) {
        self.listeners.lock().retain(|listener| &listener.id != id);
    }
}

impl fmt::Debug for LocalLiveProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLiveProvider")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(channel: &str, types: Vec<LiveEventType>, hits: Arc<AtomicUsize>) -> SubscribeRequest {
        SubscribeRequest {
            channel: channel.to_string(),
            types,
            params: SubscriptionParams {
                subscription_type: "list-query".into(),
                resource: "posts".into(),
                pagination: Pagination::default(),
                filters: Vec::new(),
                sorters: Vec::new(),
                meta: Meta::new(),
            },
            mode: LiveMode::Auto,
            callback: Arc::new(move |_event: &LiveEvent| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        }
    }

    #[test]
    fn test_publish_filters_by_channel_and_type() {
        let provider = LocalLiveProvider::new();
        let all = Arc::new(AtomicUsize::new(0));
        let deletes = Arc::new(AtomicUsize::new(0));
        provider
            .subscribe(request("resources/posts", vec![LiveEventType::All], all.clone()))
            .unwrap();
        provider
            .subscribe(request(
                "resources/posts",
                vec![LiveEventType::Deleted],
                deletes.clone(),
            ))
            .unwrap();

        let created = LiveEvent::new("resources/posts", LiveEventType::Created, serde_json::json!({}));
        assert_eq!(provider.publish(&created), 1);
        let deleted = LiveEvent::new("resources/posts", LiveEventType::Deleted, serde_json::json!({}));
        assert_eq!(provider.publish(&deleted), 2);
        let elsewhere = LiveEvent::new("resources/users", LiveEventType::Created, serde_json::json!({}));
        assert_eq!(provider.publish(&elsewhere), 0);

        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_releases_listener() {
        let provider = LocalLiveProvider::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = provider
            .subscribe(request("resources/posts", vec![LiveEventType::All], hits.clone()))
            .unwrap();
        assert_eq!(provider.subscriber_count("resources/posts"), 1);

        provider.unsubscribe(&id);
        provider.unsubscribe(&id);
        assert_eq!(provider.subscriber_count("resources/posts"), 0);

        let event = LiveEvent::new("resources/posts", LiveEventType::Updated, serde_json::json!({}));
        assert_eq!(provider.publish(&event), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_channel_is_rejected() {
        let provider = LocalLiveProvider::new();
        let err = provider
            .subscribe(request("", vec![LiveEventType::All], Arc::default()))
            .unwrap_err();
        assert!(matches!(err, Error::Subscription { .. }));
    }
}
