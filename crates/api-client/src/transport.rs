//! HTTP transport seam.
//!
//! The executor only sees [`HttpTransport`]; [`ReqwestTransport`] is the real
//! implementation and [`ScriptedTransport`] replays canned outcomes in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use storefront_core::Failure;
use tokio::time::Instant;

use crate::error::Result;
use crate::types::{RawResponse, RequestAttempt};

/// Sends one attempt and reports its raw outcome.
///
/// A response with any status is `Ok`; only failures that produced no usable
/// response are `Err`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, attempt: &RequestAttempt) -> std::result::Result<RawResponse, Failure>;
}

// ─────────────────────────────────────────────────────────────────────────────
// reqwest
// ─────────────────────────────────────────────────────────────────────────────

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("storefront-api-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn headers(attempt: &RequestAttempt) -> std::result::Result<HeaderMap, Failure> {
        let mut headers = HeaderMap::new();
        for (name, value) in &attempt.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Failure::other(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Failure::other(format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, attempt: &RequestAttempt) -> std::result::Result<RawResponse, Failure> {
        let mut request = self
            .client
            .request(attempt.method.into(), &attempt.url)
            .headers(Self::headers(attempt)?)
            .timeout(attempt.timeout);
        if let Some(body) = &attempt.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;
        debug!("API response ({}) for {}: {}", status, attempt.url, text);

        let body = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Response body for {} is not JSON: {}", attempt.url, e);
                    None
                }
            }
        };

        Ok(RawResponse::new(status, body))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> Failure {
    if error.is_timeout() {
        Failure::Timeout
    } else if error.is_body() || error.is_decode() {
        Failure::other(format!("Failed to read response: {}", error))
    } else if error.is_builder() {
        Failure::other(format!("Failed to build request: {}", error))
    } else {
        Failure::network(error.to_string())
    }
}

/// Builds the default reqwest-backed transport.
pub fn default_transport() -> Result<Arc<dyn HttpTransport>> {
    Ok(Arc::new(ReqwestTransport::new()?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted
// ─────────────────────────────────────────────────────────────────────────────

/// An attempt seen by [`ScriptedTransport`], with the (tokio) time it arrived.
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    pub attempt: RequestAttempt,
    pub at: Instant,
}

/// Replays queued outcomes in order, then repeats the fallback.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<std::result::Result<RawResponse, Failure>>>>,
    fallback: std::result::Result<RawResponse, Failure>,
    latency: Duration,
    attempts: Arc<Mutex<Vec<RecordedAttempt>>>,
}

impl ScriptedTransport {
    /// Always answers with `status` and an empty body once the script is drained.
    pub fn new(fallback_status: u16) -> Self {
        Self::with_fallback(Ok(RawResponse::new(fallback_status, None)))
    }

    pub fn with_fallback(fallback: std::result::Result<RawResponse, Failure>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            latency: Duration::ZERO,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn then(self, outcome: std::result::Result<RawResponse, Failure>) -> Self {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(outcome);
        self
    }

    pub fn then_status(self, status: u16, body: Option<Value>) -> Self {
        self.then(Ok(RawResponse::new(status, body)))
    }

    /// Every send sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn attempts(&self) -> Vec<RecordedAttempt> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, attempt: &RequestAttempt) -> std::result::Result<RawResponse, Failure> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).push(RecordedAttempt {
            attempt: attempt.clone(),
            at: Instant::now(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
