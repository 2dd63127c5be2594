//! Side effects of terminal query states: notifications and auth-error forwarding

use crate::contracts::{AuthErrorHandler, NotificationProvider, Translator};
use listwise_cache::QueryState;
use listwise_core::{
    constants::ERROR_NOTIFICATION_TRANSLATION_KEY, CrudFilters, CrudSorting, Error, ListResult,
    Meta, OpenNotificationParams, Pagination,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Request parameters handed to notification functions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContext {
    pub meta: Meta,
    pub filters: CrudFilters,
    pub sorters: CrudSorting,
    pub pagination: Pagination,
}

/// Computes a notification from an outcome, the request context and the
/// resource identifier. `None` suppresses the notification.
pub type NotificationFn<T> =
    Arc<dyn Fn(&T, &NotificationContext, &str) -> Option<OpenNotificationParams> + Send + Sync>;

/// How a caller configures the notification for one outcome
pub enum NotificationSetting<T> {
    Static(OpenNotificationParams),
    Disabled,
    Dynamic(NotificationFn<T>),
}

impl<T> NotificationSetting<T> {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&T, &NotificationContext, &str) -> Option<OpenNotificationParams>
            + Send
            + Sync
            + 'static,
    {
        NotificationSetting::Dynamic(Arc::new(f))
    }

    fn evaluate(
        &self,
        outcome: &T,
        context: &NotificationContext,
        identifier: &str,
    ) -> Option<OpenNotificationParams> {
        match self {
            NotificationSetting::Static(params) => Some(params.clone()),
            NotificationSetting::Disabled => None,
            NotificationSetting::Dynamic(f) => f(outcome, context, identifier),
        }
    }
}

impl<T> Clone for NotificationSetting<T> {
    fn clone(&self) -> Self {
        match self {
            NotificationSetting::Static(params) => NotificationSetting::Static(params.clone()),
            NotificationSetting::Disabled => NotificationSetting::Disabled,
            NotificationSetting::Dynamic(f) => NotificationSetting::Dynamic(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for NotificationSetting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationSetting::Static(params) => f.debug_tuple("Static").field(params).finish(),
            NotificationSetting::Disabled => f.write_str("Disabled"),
            NotificationSetting::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A terminal state reached since the previous observation
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Transition<V> {
    Success(V),
    Error(Error),
}

/// Turns a stream of state snapshots into terminal transitions, reporting
/// each committed success or error at most once. Outcomes committed before
/// the tracker was created are not reported.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransitionTracker {
    data_seen: u64,
    error_seen: u64,
}

impl TransitionTracker {
    pub(crate) fn new<V>(state: &QueryState<V>) -> Self {
        Self {
            data_seen: state.data_update_count,
            error_seen: state.error_update_count,
        }
    }

    pub(crate) fn observe<V: Clone>(&mut self, state: &QueryState<V>) -> Option<Transition<V>> {
        let data_advanced = state.data_update_count > self.data_seen;
        let error_advanced = state.error_update_count > self.error_seen;
        self.data_seen = state.data_update_count;
        self.error_seen = state.error_update_count;

        // Several commits may coalesce into one snapshot; the latest status wins.
        if error_advanced && state.is_error() {
            return state.error.clone().map(Transition::Error);
        }
        if data_advanced && state.is_success() {
            return state.data.clone().map(Transition::Success);
        }
        None
    }
}

/// Dispatches notifications and forwards errors for one list query
pub(crate) struct OutcomeReactor {
    pub(crate) identifier: String,
    pub(crate) context: NotificationContext,
    pub(crate) key_suffix: String,
    pub(crate) success: Option<NotificationSetting<ListResult>>,
    pub(crate) error: Option<NotificationSetting<Error>>,
    pub(crate) notifications: Option<Arc<dyn NotificationProvider>>,
    pub(crate) auth: Option<Arc<dyn AuthErrorHandler>>,
    pub(crate) translator: Arc<dyn Translator>,
}

impl OutcomeReactor {
    pub(crate) fn on_success(&self, result: &ListResult) {
        let Some(setting) = &self.success else {
            return;
        };
        match setting.evaluate(result, &self.context, &self.identifier) {
            Some(params) => self.dispatch(params),
            None => debug!(resource = %self.identifier, "success notification suppressed"),
        }
    }

    /// Forward `error` to the auth handler, then notify. The handler runs on
    /// its own task, so a slow or failing handler never holds back the
    /// notification.
    pub(crate) fn on_error(&self, error: &Error) {
        if let Some(auth) = &self.auth {
            let auth = Arc::clone(auth);
            let error = error.clone();
            tokio::spawn(async move {
                auth.on_error(&error).await;
            });
        }

        let params = match &self.error {
            None => Some(self.default_error_notification(error)),
            Some(setting) => setting
                .evaluate(error, &self.context, &self.identifier)
                .map(|params| params.or_defaults(&self.default_error_notification(error))),
        };
        match params {
            Some(params) => self.dispatch(params),
            None => debug!(resource = %self.identifier, "error notification suppressed"),
        }
    }

    fn notification_key(&self) -> String {
        format!("{}{}", self.identifier, self.key_suffix)
    }

    fn default_error_notification(&self, error: &Error) -> OpenNotificationParams {
        let status_code = error
            .status_code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let fallback = format!("Error (status code: {status_code})");
        let values = BTreeMap::from([("statusCode".to_string(), status_code)]);
        let message =
            self.translator
                .translate(ERROR_NOTIFICATION_TRANSLATION_KEY, &values, &fallback);

        OpenNotificationParams::error(message)
            .with_key(self.notification_key())
            .with_description(error.message())
    }

    fn dispatch(&self, params: OpenNotificationParams) {
        let Some(notifications) = &self.notifications else {
            debug!(resource = %self.identifier, "no notification provider, dropping notification");
            return;
        };
        debug!(
            resource = %self.identifier,
            key = params.key.as_deref().unwrap_or(""),
            kind = ?params.kind,
            "dispatching notification"
        );
        notifications.open(params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::DefaultTranslator;
    use async_trait::async_trait;
    use listwise_core::{HttpError, NotificationKind};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        opened: Mutex<Vec<OpenNotificationParams>>,
    }

    impl NotificationProvider for Recorder {
        fn open(&self, params: OpenNotificationParams) {
            self.opened.lock().push(params);
        }

        fn close(&self, _key: &str) {}
    }

    #[derive(Default)]
    struct CountingAuth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthErrorHandler for CountingAuth {
        async fn on_error(&self, _error: &Error) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Shouting;

    impl Translator for Shouting {
        fn translate(&self, key: &str, values: &BTreeMap<String, String>, _fallback: &str) -> String {
            format!("{key}:{}", values.get("statusCode").map(String::as_str).unwrap_or("-"))
        }
    }

    fn reactor(recorder: &Arc<Recorder>, auth: &Arc<CountingAuth>) -> OutcomeReactor {
        OutcomeReactor {
            identifier: "posts".into(),
            context: NotificationContext {
                meta: Meta::new(),
                filters: Vec::new(),
                sorters: Vec::new(),
                pagination: Pagination::default(),
            },
            key_suffix: "-list-notification".into(),
            success: None,
            error: None,
            notifications: Some(recorder.clone() as Arc<dyn NotificationProvider>),
            auth: Some(auth.clone() as Arc<dyn AuthErrorHandler>),
            translator: Arc::new(DefaultTranslator),
        }
    }

    fn unauthorized() -> Error {
        Error::Http(HttpError::new(401, "Unauthorized"))
    }

    #[tokio::test]
    async fn test_default_error_notification() {
        let recorder = Arc::new(Recorder::default());
        let auth = Arc::new(CountingAuth::default());
        reactor(&recorder, &auth).on_error(&unauthorized());

        let opened = recorder.opened.lock().clone();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].message, "Error (status code: 401)");
        assert_eq!(opened[0].description.as_deref(), Some("Unauthorized"));
        assert_eq!(opened[0].key.as_deref(), Some("posts-list-notification"));
        assert_eq!(opened[0].kind, NotificationKind::Error);

        tokio::task::yield_now().await;
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_error_notification_still_forwards_to_auth() {
        let recorder = Arc::new(Recorder::default());
        let auth = Arc::new(CountingAuth::default());
        let mut reactor = reactor(&recorder, &auth);
        reactor.error = Some(NotificationSetting::Disabled);
        reactor.on_error(&unauthorized());

        tokio::task::yield_now().await;
        assert!(recorder.opened.lock().is_empty());
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_static_error_notification_falls_back_to_defaults() {
        let recorder = Arc::new(Recorder::default());
        let auth = Arc::new(CountingAuth::default());
        let mut reactor = reactor(&recorder, &auth);
        reactor.error = Some(NotificationSetting::Static(OpenNotificationParams::error(
            "Could not load posts",
        )));
        reactor.on_error(&unauthorized());

        let opened = recorder.opened.lock().clone();
        assert_eq!(opened[0].message, "Could not load posts");
        assert_eq!(opened[0].key.as_deref(), Some("posts-list-notification"));
        assert_eq!(opened[0].description.as_deref(), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn test_translated_error_message() {
        let recorder = Arc::new(Recorder::default());
        let auth = Arc::new(CountingAuth::default());
        let mut reactor = reactor(&recorder, &auth);
        reactor.translator = Arc::new(Shouting);
        reactor.on_error(&unauthorized());

        assert_eq!(recorder.opened.lock()[0].message, "notifications.error:401");
    }

    #[test]
    fn test_success_notification_arguments() {
        let recorder = Arc::new(Recorder::default());
        let auth = Arc::new(CountingAuth::default());
        let mut reactor = reactor(&recorder, &auth);
        reactor.success = Some(NotificationSetting::dynamic(
            |result: &ListResult, context: &NotificationContext, identifier: &str| {
                Some(OpenNotificationParams::success(format!(
                    "{identifier}: {} of {:?} on page {}",
                    result.len(),
                    result.total,
                    context.pagination.current_page
                )))
            },
        ));
        reactor.on_success(&ListResult::new(vec![serde_json::json!({"id": 1})], Some(7)));

        assert_eq!(recorder.opened.lock()[0].message, "posts: 1 of Some(7) on page 1");
    }

    #[test]
    fn test_success_notification_suppressed_or_absent() {
        let recorder = Arc::new(Recorder::default());
        let auth = Arc::new(CountingAuth::default());
        let mut reactor = reactor(&recorder, &auth);
        reactor.on_success(&ListResult::empty());

        reactor.success = Some(NotificationSetting::dynamic(|_: &ListResult, _: &NotificationContext, _: &str| None));
        reactor.on_success(&ListResult::empty());

        assert!(recorder.opened.lock().is_empty());
    }

    #[test]
    fn test_tracker_reports_each_transition_once() {
        let mut state: QueryState<u8> = QueryState::default();
        let mut tracker = TransitionTracker::new(&state);
        assert_eq!(tracker.observe(&state), None);

        state.status = listwise_cache::QueryStatus::Success;
        state.data = Some(1);
        state.data_update_count = 1;
        assert_eq!(tracker.observe(&state), Some(Transition::Success(1)));
        assert_eq!(tracker.observe(&state), None);

        state.status = listwise_cache::QueryStatus::Error;
        state.error = Some(unauthorized());
        state.error_update_count = 1;
        assert_eq!(tracker.observe(&state), Some(Transition::Error(unauthorized())));
        assert_eq!(tracker.observe(&state), None);
    }

    #[test]
    fn test_tracker_ignores_earlier_outcomes() {
        let state = QueryState {
            status: listwise_cache::QueryStatus::Success,
            data: Some(3u8),
            data_update_count: 4,
            ..QueryState::default()
        };
        let mut tracker = TransitionTracker::new(&state);
        assert_eq!(tracker.observe(&state), None);
    }
}
