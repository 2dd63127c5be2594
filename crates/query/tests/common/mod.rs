//! Hand-rolled collaborators shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use listwise_core::{Error, HttpError, ListResult, OpenNotificationParams, Result};
use listwise_query::{
    AuthErrorHandler, DataProvider, ListClient, ListClientBuilder, ListRequest,
    NotificationProvider, ResourceItem, StaticResourceResolver,
};
use parking_lot::Mutex;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// `count` records `{ "id": 0 }`, `{ "id": 1 }`, ...
pub fn records(count: u64) -> Vec<serde_json::Value> {
    (0..count).map(|id| json!({ "id": id })).collect()
}

/// Data provider answering from a programmable response, recording requests
pub struct RecordingProvider {
    response: Mutex<Result<ListResult>>,
    delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<ListRequest>>,
}

impl RecordingProvider {
    pub fn returning(data: Vec<serde_json::Value>, total: u64) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Ok(ListResult::new(data, Some(total)))),
            delay: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status_code: u16, message: &str) -> Arc<Self> {
        let provider = Self::returning(Vec::new(), 0);
        provider.respond(Err(Error::Http(HttpError::new(status_code, message))));
        provider
    }

    pub fn respond(&self, response: Result<ListResult>) {
        *self.response.lock() = response;
    }

    /// Every request takes `delay` before answering
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<ListRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DataProvider for RecordingProvider {
    async fn get_list(&self, request: ListRequest) -> Result<ListResult> {
        let signal = request.context.signal.clone();
        self.requests.lock().push(request);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::select! {
                _ = signal.aborted() => return Err(Error::cancelled("aborted by provider")),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        let response = self.response.lock().clone();
        response
    }
}

#[derive(Default)]
pub struct RecordingNotifications {
    opened: Mutex<Vec<OpenNotificationParams>>,
    closed: Mutex<Vec<String>>,
}

impl RecordingNotifications {
    pub fn opened(&self) -> Vec<OpenNotificationParams> {
        self.opened.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.opened.lock().iter().map(|params| params.message.clone()).collect()
    }
}

impl NotificationProvider for RecordingNotifications {
    fn open(&self, params: OpenNotificationParams) {
        self.opened.lock().push(params);
    }

    fn close(&self, key: &str) {
        self.closed.lock().push(key.to_string());
    }
}

#[derive(Default)]
pub struct RecordingAuth {
    errors: Mutex<Vec<Error>>,
}

impl RecordingAuth {
    pub fn errors(&self) -> Vec<Error> {
        self.errors.lock().clone()
    }
}

#[async_trait]
impl AuthErrorHandler for RecordingAuth {
    async fn on_error(&self, error: &Error) {
        self.errors.lock().push(error.clone());
    }
}

/// Resources used throughout the tests
pub fn resources() -> Arc<StaticResourceResolver> {
    Arc::new(StaticResourceResolver::new(vec![
        ResourceItem::new("posts"),
        ResourceItem::new("users"),
    ]))
}

/// A client over `provider` with the standard resources
pub fn client_builder(provider: &Arc<RecordingProvider>) -> ListClientBuilder {
    ListClient::builder()
        .data_provider(provider.clone())
        .resources(resources())
}

/// Poll `condition` until it holds, yielding to background tasks in between
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(condition(), "condition not met in time");
}

/// Run `future` to completion while giving spawned tasks a chance to run after it
pub async fn settle<T>(future: impl Future<Output = T>) -> T {
    let output = future.await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    output
}
