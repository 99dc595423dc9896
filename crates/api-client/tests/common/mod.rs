//! Shared helpers for HTTP integration tests.

pub mod mock_server;

use std::sync::Arc;
use std::time::Duration;

use storefront_api_client::{
    HttpTransport, InMemoryTokenStore, RequestExecutor, RequestOptions, ReqwestTransport,
};
use storefront_core::RetryConfig;

/// Executor against a live mock server through the reqwest transport.
pub fn executor(base_url: &str, token: Option<&str>) -> RequestExecutor {
    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::new().expect("reqwest client"));
    let token_store = match token {
        Some(token) => InMemoryTokenStore::with_token(token),
        None => InMemoryTokenStore::new(),
    };
    RequestExecutor::new(base_url, transport, Arc::new(token_store))
}

/// Options with millisecond backoff so retries finish quickly in real time.
pub fn fast_options(max_retries: u32) -> RequestOptions {
    RequestOptions::default()
        .timeout(Duration::from_secs(5))
        .retries(RetryConfig {
            max_retries,
            base_delay_ms: 10,
            max_delay_ms: 50,
            ..RetryConfig::default()
        }
        .without_jitter())
}
