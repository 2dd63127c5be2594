//! Interfaces of the collaborators a list query talks to
//!
//! Each collaborator is a trait object supplied to [`ListClient`](crate::ListClient).
//! Simple in-process implementations are provided where a host commonly
//! needs one without a real backend (static resources, local live events).

pub mod auth;
pub mod data;
pub mod i18n;
pub mod live;
pub mod notification;
pub mod resource;

pub use auth::AuthErrorHandler;
pub use data::{DataProvider, DataProviders, ListRequest};
pub use i18n::{DefaultTranslator, Translator};
pub use live::{LiveCallback, LiveProvider, LocalLiveProvider, SubscribeRequest, SubscriptionId, SubscriptionParams};
pub use notification::NotificationProvider;
pub use resource::{ResourceItem, ResourceResolution, ResourceResolver, StaticResourceResolver};
