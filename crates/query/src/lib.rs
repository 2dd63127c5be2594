//! Resource list queries for listwise
//!
//! A [`ListClient`] turns [`ListParams`] into a [`ListQuery`]: the parameters
//! are normalised against the registered resources and configuration, keyed
//! into the shared [`QueryCache`](listwise_cache::QueryCache), executed
//! through the selected [`DataProvider`], optionally bound to live events,
//! and observed so notifications, auth-error forwarding and overtime
//! tracking happen once per state transition.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use listwise_query::{ListClient, ListParams, DataProvider, StaticResourceResolver, ResourceItem};
//! # async fn run(provider: Arc<dyn DataProvider>) -> listwise_core::Result<()> {
//! let client = ListClient::builder()
//!     .data_provider(provider)
//!     .resources(Arc::new(StaticResourceResolver::new(vec![ResourceItem::new("posts")])))
//!     .build()?;
//!
//! let posts = client.list(ListParams::new().resource("posts"));
//! let page = posts.fetch().await?;
//! println!("{} of {:?}", page.data.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod contracts;
pub mod executor;
pub mod live;
pub mod outcome;
pub mod overtime;
pub mod params;
pub mod query;

pub use client::{ListClient, ListClientBuilder};
pub use config::{ConfigSource, ListConfig, ListConfigBuilder, ListConfigLoader, LoadedConfig, OvertimeConfig};
pub use contracts::{
    AuthErrorHandler, DataProvider, DataProviders, DefaultTranslator, ListRequest, LiveCallback,
    LiveProvider, LocalLiveProvider, NotificationProvider, ResourceItem, ResourceResolution,
    ResourceResolver, StaticResourceResolver, SubscribeRequest, SubscriptionId,
    SubscriptionParams, Translator,
};
pub use executor::CachedList;
pub use live::resource_channel;
pub use outcome::{NotificationContext, NotificationFn, NotificationSetting};
pub use overtime::{IntervalCallback, OvertimeOptions, ThresholdCallback};
pub use params::{ListParams, NormalizedParams, SelectFn, Unavailable};
pub use query::{ListQuery, ListQueryResult};
