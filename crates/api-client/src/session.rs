//! Session expiry handling.
//!
//! A 401 clears the stored token, shows one "session expired" notification and
//! redirects to the login route after a fixed delay. This is a UX decision, not
//! a retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{info, warn};
use storefront_core::constants::{AUTH_TOKEN_KEY, LOGIN_ROUTE, SESSION_REDIRECT_DELAY_MS};
use storefront_core::notifications::{NotificationOutcome, NotificationSink};
use storefront_core::ErrorKind;
use tokio::task::JoinHandle;

use crate::token_store::TokenStore;
use crate::types::RequestOptions;

/// Moves the user to another route.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Navigator that only logs; used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        info!("Redirecting to {}", route);
    }
}

/// Navigator for tests - records every redirect.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    routes: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).push(route.to_string());
    }
}

/// Reacts to authentication failures.
pub struct SessionGuard {
    token_store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    redirect_delay: Duration,
    redirect_pending: Arc<AtomicBool>,
}

impl SessionGuard {
    pub fn new(token_store: Arc<dyn TokenStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            token_store,
            navigator,
            login_route: LOGIN_ROUTE.to_string(),
            redirect_delay: Duration::from_millis(SESSION_REDIRECT_DELAY_MS),
            redirect_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Handles a 401: clears the token, notifies, and schedules the redirect.
    ///
    /// The notification follows the call's `show_notifications` and `persist`
    /// options. Concurrent 401s each notify, but only the first schedules a
    /// redirect. Returns the redirect task when one was scheduled.
    pub fn handle_expired(
        &self,
        sink: &NotificationSink,
        options: &RequestOptions,
        context: &str,
    ) -> Option<JoinHandle<()>> {
        if let Err(e) = self.token_store.remove(AUTH_TOKEN_KEY) {
            warn!("Failed to clear auth token after 401: {}", e);
        }

        let mut outcome = NotificationOutcome::failure(
            &ErrorKind::Auth.classification(),
            ErrorKind::Auth.default_message(),
        )
        .with_context(context)
        .show_toast(options.show_notifications);
        if let Some(category) = options.persist {
            outcome = outcome.persist(category);
        }
        sink.notify(outcome);

        if self.redirect_pending.swap(true, Ordering::SeqCst) {
            return None;
        }

        let navigator = self.navigator.clone();
        let route = self.login_route.clone();
        let delay = self.redirect_delay;
        let pending = self.redirect_pending.clone();
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.redirect(&route);
            pending.store(false, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::InMemoryTokenStore;
    use storefront_core::notifications::{
        NotificationCategory, NotificationLogStore, RecordingObserver,
    };

    fn guard(navigator: RecordingNavigator) -> (SessionGuard, Arc<InMemoryTokenStore>) {
        let store = Arc::new(InMemoryTokenStore::with_token("expired-token"));
        let guard = SessionGuard::new(store.clone(), Arc::new(navigator));
        (guard, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_redirects_after_delay() {
        let navigator = RecordingNavigator::new();
        let (guard, store) = guard(navigator.clone());
        let recorder = RecordingObserver::new();
        let sink = NotificationSink::new().with_observer(Arc::new(recorder.clone()));

        let handle = guard
            .handle_expired(&sink, &RequestOptions::default(), "GET /account")
            .unwrap();
        assert_eq!(store.auth_token(), None);
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.outcomes()[0].title.as_deref(), Some("Session Expired"));

        tokio::time::sleep(Duration::from_millis(1_999)).await;
        assert!(navigator.routes().is_empty());

        handle.await.unwrap();
        assert_eq!(navigator.routes(), vec!["/login".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_expiry_redirects_once() {
        let navigator = RecordingNavigator::new();
        let (guard, _store) = guard(navigator.clone());
        let guard = guard.with_login_route("/signin");
        let sink = NotificationSink::new();

        let options = RequestOptions::default();
        let first = guard.handle_expired(&sink, &options, "GET /cart");
        let second = guard.handle_expired(&sink, &options, "GET /orders");
        assert!(first.is_some());
        assert!(second.is_none());

        first.unwrap().await.unwrap();
        assert_eq!(navigator.routes(), vec!["/signin".to_string()]);

        // A later expiry schedules a fresh redirect.
        assert!(guard
            .handle_expired(&sink, &options.quiet(), "GET /cart")
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_persisted_when_requested() {
        let (guard, _store) = guard(RecordingNavigator::new());
        let store = Arc::new(NotificationLogStore::new());
        let sink = NotificationSink::new().with_observer(store.clone());

        guard.handle_expired(&sink, &RequestOptions::default(), "GET /cart");
        assert!(store.is_empty());

        let options = RequestOptions::default().persist(NotificationCategory::Account);
        guard.handle_expired(&sink, &options, "GET /account");
        let records = store.all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Session Expired");
        assert_eq!(records[0].category, NotificationCategory::Account);
    }
}
