//! Binding a list query to live events of its resource

use crate::contracts::{
    LiveCallback, LiveProvider, SubscribeRequest, SubscriptionId, SubscriptionParams,
};
use crate::executor::CachedList;
use crate::params::NormalizedParams;
use listwise_cache::{KeyFilter, QueryCache};
use listwise_core::{
    constants::{LIST_SUBSCRIPTION_TYPE, RESOURCE_CHANNEL_PREFIX},
    LiveEvent, LiveEventType, LiveMode,
};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Channel carrying events of `resource`
pub fn resource_channel(resource: &str) -> String {
    format!("{RESOURCE_CHANNEL_PREFIX}{resource}")
}

/// Everything needed to (re)subscribe one query
pub(crate) struct LiveBinder {
    pub(crate) provider: Option<Arc<dyn LiveProvider>>,
    pub(crate) cache: Weak<QueryCache<CachedList>>,
    pub(crate) params: NormalizedParams,
    pub(crate) on_event: Option<LiveCallback>,
    /// Client-wide hook receiving every event of every bound query
    pub(crate) on_any_event: Option<LiveCallback>,
}

impl LiveBinder {
    /// Subscribe if a live mode is selected and a live provider is present
    pub(crate) fn bind(&self) -> Option<LiveBinding> {
        let mode = self.params.live_mode;
        if mode == LiveMode::Off {
            return None;
        }
        let Some(provider) = &self.provider else {
            debug!(resource = %self.params.identifier(), "live mode selected without a live provider");
            return None;
        };

        let channel = resource_channel(&self.params.resource_name);
        let request = SubscribeRequest {
            channel: channel.clone(),
            types: vec![LiveEventType::All],
            params: SubscriptionParams {
                subscription_type: LIST_SUBSCRIPTION_TYPE.to_string(),
                resource: self.params.resource_name.clone(),
                pagination: self.params.pagination,
                filters: self.params.filters.clone(),
                sorters: self.params.sorters.clone(),
                meta: self.params.meta.clone(),
            },
            mode,
            callback: self.callback(mode),
        };

        match provider.subscribe(request) {
            Ok(id) => {
                debug!(channel = %channel, subscription = %id, ?mode, "live subscription bound");
                Some(LiveBinding {
                    provider: Arc::clone(provider),
                    id,
                    channel,
                })
            }
            Err(e) => {
                warn!(channel = %channel, error = %e, "live subscription failed");
                None
            }
        }
    }

    fn callback(&self, mode: LiveMode) -> LiveCallback {
        let cache = self.cache.clone();
        let scope = KeyFilter::resource(&self.params.provider_name, self.params.identifier());
        let on_event = self.on_event.clone();
        let on_any_event = self.on_any_event.clone();

        Arc::new(move |event: &LiveEvent| {
            if mode == LiveMode::Auto {
                if let Some(cache) = cache.upgrade() {
                    let matched = cache.invalidate(&scope);
                    debug!(channel = %event.channel, event = %event.event_type, matched, "live event invalidated queries");
                }
            }
            if let Some(on_event) = &on_event {
                on_event(event);
            }
            if let Some(on_any_event) = &on_any_event {
                on_any_event(event);
            }
        })
    }
}

/// An active subscription, released on drop
pub(crate) struct LiveBinding {
    provider: Arc<dyn LiveProvider>,
    id: SubscriptionId,
    channel: String,
}

impl Drop for LiveBinding {
    fn drop(&mut self) {
        self.provider.unsubscribe(&self.id);
        debug!(channel = %self.channel, subscription = %self.id, "live subscription released");
    }
}
