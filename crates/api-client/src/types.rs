//! Request/response types for the storefront JSON API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use storefront_core::notifications::NotificationCategory;
use storefront_core::{Failure, RetryConfig};
use tokio::time::Instant;

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Request side
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// What the caller wants sent: one logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Path relative to the client's base URL, e.g. `/orders/42`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Rate-limit bucket derived from the first path segment (`/orders/42` -> `orders`).
    pub fn default_category(&self) -> String {
        self.path
            .trim_start_matches('/')
            .split(['/', '?'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("root")
            .to_string()
    }
}

/// Per-call behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOptions {
    /// Per-attempt timeout.
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    pub retries: RetryConfig,
    pub show_notifications: bool,
    pub require_auth: bool,
    /// Rate-limiter bucket; defaults to the first path segment.
    pub rate_limit_category: Option<String>,
    /// Keep the terminal outcome in the notification log under this category.
    pub persist: Option<NotificationCategory>,
    /// Toast shown on success. No success toast when unset.
    pub success_message: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            retries: RetryConfig::default(),
            show_notifications: true,
            require_auth: false,
            rate_limit_category: None,
            persist: None,
            success_message: None,
        }
    }
}

impl RequestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: RetryConfig) -> Self {
        self.retries = retries;
        self
    }

    pub fn no_retries(mut self) -> Self {
        self.retries = RetryConfig::none();
        self
    }

    pub fn require_auth(mut self) -> Self {
        self.require_auth = true;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.show_notifications = false;
        self
    }

    pub fn persist(mut self, category: NotificationCategory) -> Self {
        self.persist = Some(category);
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    pub fn rate_limit_category(mut self, category: impl Into<String>) -> Self {
        self.rate_limit_category = Some(category.into());
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// One physical network try. Immutable; discarded once its outcome is classified.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestAttempt {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub deadline: Instant,
    /// 0-based.
    pub attempt_index: u32,
}

impl RequestAttempt {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response side
// ─────────────────────────────────────────────────────────────────────────────

/// Status and parsed JSON body of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Interprets a 2xx response.
    ///
    /// Bodies shaped `{success, data, message?, meta?}` are unwrapped; an envelope
    /// with `success: false` becomes a failure. Any other JSON body is taken as
    /// the data itself.
    pub fn into_api_response(self) -> std::result::Result<ApiResponse, Failure> {
        let status = self.status;
        let Some(body) = self.body else {
            return Ok(ApiResponse {
                status,
                data: Value::Null,
                message: None,
                meta: None,
            });
        };

        if body.get("success").and_then(Value::as_bool).is_some() {
            let envelope: ApiEnvelope = serde_json::from_value(body.clone())
                .map_err(|e| Failure::other(format!("Malformed response envelope: {}", e)))?;
            if !envelope.success {
                return Err(Failure::response(status, Some(body)));
            }
            return Ok(ApiResponse {
                status,
                data: envelope.data.unwrap_or(Value::Null),
                message: envelope.message,
                meta: envelope.meta,
            });
        }

        Ok(ApiResponse {
            status,
            data: body,
            message: None,
            meta: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    meta: Option<Value>,
}

/// A successful logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
    pub message: Option<String>,
    pub meta: Option<Value>,
}

impl ApiResponse {
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.data)?)
    }

    pub fn meta<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.meta {
            Some(meta) => Ok(Some(serde_json::from_value(meta.clone())?)),
            None => Ok(None),
        }
    }
}

/// Pagination block commonly carried in `meta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(default)]
    pub total_pages: Option<u32>,
}
