//! Typed storefront API client.
//!
//! Wraps a [`RequestExecutor`] and turns every terminal outcome into
//! notifications: failures go to the sink (and the session guard for 401s),
//! successes optionally show a toast.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storefront_core::constants::AUTH_TOKEN_KEY;
use storefront_core::notifications::{defaults, NotificationOutcome, NotificationSink};
use storefront_core::{ErrorKind, Severity};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiClientError, Result};
use crate::executor::RequestExecutor;
use crate::rate_limiter::RateLimiter;
use crate::session::{LogNavigator, Navigator, SessionGuard};
use crate::token_store::{InMemoryTokenStore, TokenStore};
use crate::transport::{default_transport, HttpTransport};
use crate::types::{ApiResponse, RequestOptions, RequestSpec};

/// Builder for [`StorefrontClient`]. Every component is optional except the base URL.
pub struct StorefrontClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn HttpTransport>>,
    token_store: Option<Arc<dyn TokenStore>>,
    sink: Option<NotificationSink>,
    navigator: Option<Arc<dyn Navigator>>,
    login_route: Option<String>,
    redirect_delay: Option<Duration>,
    rate_limiter: Option<Arc<RateLimiter>>,
    default_options: RequestOptions,
}

impl StorefrontClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_store(mut self, token_store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(token_store);
        self
    }

    /// Defaults to the process-wide sink.
    pub fn sink(mut self, sink: NotificationSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = Some(route.into());
        self
    }

    pub fn redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = Some(delay);
        self
    }

    pub fn rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Options used by the `get`/`post`/... helpers that take none.
    pub fn default_options(mut self, options: RequestOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn build(self) -> Result<StorefrontClient> {
        if self.base_url.trim().is_empty() {
            return Err(ApiClientError::invalid_request("Base URL is empty"));
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(InMemoryTokenStore::new()));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(LogNavigator));

        let mut session = SessionGuard::new(token_store.clone(), navigator);
        if let Some(route) = self.login_route {
            session = session.with_login_route(route);
        }
        if let Some(delay) = self.redirect_delay {
            session = session.with_redirect_delay(delay);
        }

        let mut executor = RequestExecutor::new(&self.base_url, transport, token_store.clone());
        if let Some(rate_limiter) = self.rate_limiter {
            executor = executor.with_rate_limiter(rate_limiter);
        }

        Ok(StorefrontClient {
            executor,
            token_store,
            sink: self.sink.unwrap_or_else(defaults::sink),
            session: Arc::new(session),
            default_options: self.default_options,
        })
    }
}

/// Client for the storefront JSON API.
///
/// Cheap to clone; clones share the transport, token store, sink and session state.
#[derive(Clone)]
pub struct StorefrontClient {
    executor: RequestExecutor,
    token_store: Arc<dyn TokenStore>,
    sink: NotificationSink,
    session: Arc<SessionGuard>,
    default_options: RequestOptions,
}

impl StorefrontClient {
    pub fn builder(base_url: impl Into<String>) -> StorefrontClientBuilder {
        StorefrontClientBuilder {
            base_url: base_url.into(),
            transport: None,
            token_store: None,
            sink: None,
            navigator: None,
            login_route: None,
            redirect_delay: None,
            rate_limiter: None,
            default_options: RequestOptions::default(),
        }
    }

    /// Client with the reqwest transport, an in-memory token store and the default sink.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn base_url(&self) -> &str {
        self.executor.base_url()
    }

    pub fn sink(&self) -> &NotificationSink {
        &self.sink
    }

    pub fn default_options(&self) -> RequestOptions {
        self.default_options.clone()
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.token_store.set(AUTH_TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.token_store.remove(AUTH_TOKEN_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token_store.auth_token().is_some()
    }

    /// Runs a call and reports its terminal outcome.
    ///
    /// Exactly one notification is emitted per terminal failure; none for
    /// cancellation. See [`RequestExecutor::execute`] for retry semantics.
    pub async fn request(
        &self,
        spec: &RequestSpec,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let result = self.executor.execute(spec, options, cancel).await;
        match &result {
            Ok(_) => self.report_success(options),
            Err(error) => self.report_failure(error, spec, options),
        }
        result
    }

    fn report_success(&self, options: &RequestOptions) {
        let Some(message) = &options.success_message else {
            return;
        };
        if !options.show_notifications && options.persist.is_none() {
            return;
        }
        let mut outcome = NotificationOutcome::success(message.clone())
            .show_toast(options.show_notifications);
        if let Some(category) = options.persist {
            outcome = outcome.persist(category);
        }
        self.sink.notify(outcome);
    }

    fn report_failure(&self, error: &ApiClientError, spec: &RequestSpec, options: &RequestOptions) {
        let context = format!("{} {}", spec.method, spec.path);
        match error {
            ApiClientError::Cancelled => {
                debug!("{} cancelled by caller", context);
            }
            ApiClientError::AuthRequired => {
                self.sink.notify(
                    NotificationOutcome::warning("Please sign in to continue.")
                        .with_title("Sign In Required")
                        .with_severity(Severity::Medium)
                        .with_context(context)
                        .show_toast(options.show_notifications),
                );
            }
            ApiClientError::Request(failure) if failure.kind() == ErrorKind::Auth => {
                self.session.handle_expired(&self.sink, options, &context);
            }
            ApiClientError::Request(failure) => {
                let mut outcome =
                    NotificationOutcome::failure(&failure.classification, failure.message.clone())
                        .with_context(context)
                        .show_toast(options.show_notifications);
                if let Some(category) = options.persist {
                    outcome = outcome.persist(category);
                }
                self.sink.notify(outcome);
            }
            other => {
                let mut outcome = NotificationOutcome::failure(
                    &ErrorKind::Unknown.classification(),
                    other.to_string(),
                )
                .with_context(context)
                .show_toast(options.show_notifications);
                if let Some(category) = options.persist {
                    outcome = outcome.persist(category);
                }
                self.sink.notify(outcome);
            }
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.request(&spec, options, cancel).await?.into_data()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with(path, &self.default_options, &CancellationToken::new())
            .await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.call(RequestSpec::get(path), options, cancel).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.post_with(path, body, &self.default_options, &CancellationToken::new())
            .await
    }

    pub async fn post_with<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.call(RequestSpec::post(path).json(body)?, options, cancel)
            .await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.put_with(path, body, &self.default_options, &CancellationToken::new())
            .await
    }

    pub async fn put_with<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.call(RequestSpec::put(path).json(body)?, options, cancel)
            .await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.patch_with(path, body, &self.default_options, &CancellationToken::new())
            .await
    }

    pub async fn patch_with<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.call(RequestSpec::patch(path).json(body)?, options, cancel)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.delete_with(path, &self.default_options, &CancellationToken::new())
            .await
    }

    pub async fn delete_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.call(RequestSpec::delete(path), options, cancel).await
    }
}
