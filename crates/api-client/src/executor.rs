//! Request executor: turns one logical call into sequential attempts.
//!
//! Each attempt runs under its own timeout and races the caller's cancellation
//! token. Failures are classified, the retry policy decides, and the executor
//! either sleeps and tries again or settles with the last classification.

use std::sync::Arc;

use log::{debug, warn};
use reqwest::Url;
use storefront_core::{classify, Failure, RetryPolicy};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiClientError, RequestFailure, Result};
use crate::rate_limiter::RateLimiter;
use crate::token_store::TokenStore;
use crate::transport::HttpTransport;
use crate::types::{ApiResponse, RequestAttempt, RequestOptions, RequestSpec};

/// Issues attempts against a base URL through an [`HttpTransport`].
///
/// Holds no per-call state; concurrent calls share only the optional rate limiter.
#[derive(Clone)]
pub struct RequestExecutor {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    token_store: Arc<dyn TokenStore>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl RequestExecutor {
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. "https://shop.example.com/api"
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            token_store,
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    fn url(&self, spec: &RequestSpec) -> Result<String> {
        let path = spec.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| ApiClientError::invalid_request(format!("Invalid URL: {}", e)))?;
        if !spec.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &spec.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    /// Standard headers plus the caller's; adds the bearer token when required.
    fn headers(
        &self,
        spec: &RequestSpec,
        options: &RequestOptions,
    ) -> Result<Vec<(String, String)>> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if options.require_auth {
            let token = self
                .token_store
                .auth_token()
                .ok_or(ApiClientError::AuthRequired)?;
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        headers.extend(spec.headers.iter().cloned());
        Ok(headers)
    }

    /// Runs one logical call to completion.
    ///
    /// Attempts are strictly sequential: attempt N+1 starts only after attempt N
    /// was classified and the policy chose to retry. At most
    /// `options.retries.max_retries + 1` attempts are made.
    ///
    /// Cancelling `cancel` aborts the in-flight attempt and skips pending
    /// retries, returning [`ApiClientError::Cancelled`]. Cancellation does not
    /// undo anything: an attempt that already reached the server may have been
    /// processed there.
    pub async fn execute(
        &self,
        spec: &RequestSpec,
        options: &RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let headers = self.headers(spec, options)?;
        let url = self.url(spec)?;
        let policy = RetryPolicy::new(options.retries.clone());
        let category = options
            .rate_limit_category
            .clone()
            .unwrap_or_else(|| spec.default_category());

        let mut attempt_index: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(ApiClientError::Cancelled);
            }

            if let Some(limiter) = &self.rate_limiter {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ApiClientError::Cancelled),
                    _ = limiter.acquire(&category) => {}
                }
            }

            let attempt = RequestAttempt {
                method: spec.method,
                url: url.clone(),
                headers: headers.clone(),
                body: spec.body.clone(),
                timeout: options.timeout,
                deadline: Instant::now() + options.timeout,
                attempt_index,
            };
            debug!(
                "{} {} (attempt {})",
                attempt.method,
                attempt.url,
                attempt_index + 1
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("{} {} cancelled in flight", attempt.method, attempt.url);
                    return Err(ApiClientError::Cancelled);
                }
                result = tokio::time::timeout_at(
                    attempt.deadline,
                    self.transport.send(&attempt),
                ) => {
                    result.unwrap_or(Err(Failure::Timeout))
                }
            };

            let failure = match outcome {
                Ok(response) if response.is_success() => match response.into_api_response() {
                    Ok(api_response) => return Ok(api_response),
                    Err(failure) => failure,
                },
                Ok(response) => Failure::response(response.status, response.body),
                Err(failure) => failure,
            };

            let classification = classify(&failure);
            let decision = policy.decide(attempt_index, &classification);
            if !decision.should_retry {
                let request_failure =
                    RequestFailure::from_failure(classification, &failure, attempt_index + 1);
                debug!(
                    "{} {} failed: {}",
                    spec.method, spec.path, request_failure
                );
                return Err(ApiClientError::Request(request_failure));
            }

            warn!(
                "{} {} attempt {} failed ({}); retrying in {:?}",
                spec.method,
                spec.path,
                attempt_index + 1,
                failure,
                decision.delay
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("{} {} cancelled during backoff", spec.method, spec.path);
                    return Err(ApiClientError::Cancelled);
                }
                _ = tokio::time::sleep(decision.delay) => {}
            }
            attempt_index += 1;
        }
    }
}
