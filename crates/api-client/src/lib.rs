//! Resilient HTTP client for the storefront JSON API.
//!
//! [`RequestExecutor`] runs one logical call as a sequence of attempts with
//! per-attempt timeouts, classified retries and cooperative cancellation.
//! [`StorefrontClient`] layers typed helpers, session expiry and notifications
//! on top.

pub mod client;
pub mod error;
pub mod executor;
pub mod rate_limiter;
pub mod session;
pub mod token_store;
pub mod transport;
pub mod types;

pub use client::{StorefrontClient, StorefrontClientBuilder};
pub use error::{ApiClientError, RequestFailure, Result};
pub use executor::RequestExecutor;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use session::{LogNavigator, Navigator, RecordingNavigator, SessionGuard};
pub use token_store::{FileTokenStore, InMemoryTokenStore, TokenStore};
pub use transport::{
    default_transport, HttpTransport, RecordedAttempt, ReqwestTransport, ScriptedTransport,
};
pub use types::{
    ApiResponse, HttpMethod, PageMeta, RawResponse, RequestAttempt, RequestOptions, RequestSpec,
};

pub use tokio_util::sync::CancellationToken;
