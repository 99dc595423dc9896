//! Error taxonomy and classification for API request failures.
//!
//! Every failed attempt is described by a [`Failure`] and mapped by [`classify`]
//! into exactly one [`ErrorClassification`]. Downstream consumers (retry policy,
//! notification sink, session handling) match on [`ErrorKind`] instead of probing
//! raw responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Severity
// =============================================================================

/// Severity of a classified failure.
///
/// Ordered from lowest to highest: Low < Medium < High < Critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Returns the string representation of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Whether failures of this severity belong in the diagnostic error log.
    pub fn is_loggable(&self) -> bool {
        *self >= Severity::High
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// The fixed set of failure kinds a request can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Transport failure or offline client.
    Network,
    /// The attempt did not produce a response before its deadline.
    Timeout,
    /// HTTP 401.
    Auth,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// HTTP 4xx carrying field-level errors.
    Validation,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::Network,
        ErrorKind::Timeout,
        ErrorKind::Auth,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::RateLimited,
        ErrorKind::ServerError,
        ErrorKind::Validation,
        ErrorKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Auth => "AUTH",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }

    /// Short title used for toasts.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Connection Problem",
            ErrorKind::Timeout => "Request Timed Out",
            ErrorKind::Auth => "Session Expired",
            ErrorKind::Forbidden => "Access Denied",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::RateLimited => "Slow Down",
            ErrorKind::ServerError => "Server Error",
            ErrorKind::Validation => "Invalid Input",
            ErrorKind::Unknown => "Something Went Wrong",
        }
    }

    /// Human-readable message shown when the server supplied none.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error. Please check your connection.",
            ErrorKind::Timeout => "The request timed out. Please try again.",
            ErrorKind::Auth => "Your session has expired. Please log in again.",
            ErrorKind::Forbidden => "You do not have permission to perform this action.",
            ErrorKind::NotFound => "The requested resource was not found.",
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
            ErrorKind::ServerError => "Server error. Please try again later.",
            ErrorKind::Validation => "Please check the highlighted fields and try again.",
            ErrorKind::Unknown => "An unexpected error occurred.",
        }
    }

    /// The fixed severity and retryability of this kind.
    pub fn classification(self) -> ErrorClassification {
        let (severity, retryable) = match self {
            ErrorKind::Timeout => (Severity::Medium, true),
            ErrorKind::Network => (Severity::Medium, true),
            ErrorKind::Auth => (Severity::High, false),
            ErrorKind::Forbidden => (Severity::Medium, false),
            ErrorKind::NotFound => (Severity::Low, false),
            ErrorKind::RateLimited => (Severity::Medium, true),
            ErrorKind::ServerError => (Severity::High, true),
            ErrorKind::Validation => (Severity::Medium, false),
            ErrorKind::Unknown => (Severity::Medium, false),
        };
        ErrorClassification {
            kind: self,
            severity,
            retryable,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Result of classifying one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorClassification {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub retryable: bool,
}

impl std::fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.kind, self.severity)
    }
}

/// A single field-level validation error returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Raw outcome of a failed attempt, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The attempt's deadline or abort signal fired before a response arrived.
    Timeout,
    /// The request never produced a response (connect error, offline, reset).
    Network { message: String },
    /// The server answered with a non-success response.
    Response { status: u16, body: Option<Value> },
    /// Any other failure, e.g. an unreadable response body.
    Other { message: String },
}

impl Failure {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn response(status: u16, body: Option<Value>) -> Self {
        Self::Response { status, body }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// HTTP status, when the failure carried a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` field of the response envelope, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Failure::Response {
                body: Some(body), ..
            } => body.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Field errors carried by the response body.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Failure::Response {
                body: Some(body), ..
            } => field_errors(body),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Timeout => write!(f, "request timed out"),
            Failure::Network { message } => write!(f, "network failure: {}", message),
            Failure::Response { status, .. } => match self.server_message() {
                Some(message) => write!(f, "HTTP {}: {}", status, message),
                None => write!(f, "HTTP {}", status),
            },
            Failure::Other { message } => write!(f, "{}", message),
        }
    }
}

/// Classifies a failed attempt.
///
/// Total and pure: every input yields exactly one classification. Rules are
/// applied in priority order: timeout, network, then status-specific kinds,
/// then field-level validation for the rest of the 4xx range.
pub fn classify(failure: &Failure) -> ErrorClassification {
    let kind = match failure {
        Failure::Timeout => ErrorKind::Timeout,
        Failure::Network { .. } => ErrorKind::Network,
        Failure::Response { status, body } => classify_status(*status, body.as_ref()),
        Failure::Other { .. } => ErrorKind::Unknown,
    };
    kind.classification()
}

fn classify_status(status: u16, body: Option<&Value>) -> ErrorKind {
    match status {
        401 => ErrorKind::Auth,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        429 => ErrorKind::RateLimited,
        500..=599 => ErrorKind::ServerError,
        400..=499 if body.is_some_and(|b| !field_errors(b).is_empty()) => ErrorKind::Validation,
        _ => ErrorKind::Unknown,
    }
}

/// Extracts field-level errors from an error envelope's `errors` member.
///
/// Accepts a list of `{field, message}` objects (`path` is accepted for `field`)
/// or a map of `field -> message` / `field -> [message, ...]`.
pub fn field_errors(body: &Value) -> Vec<FieldError> {
    let Some(errors) = body.get("errors") else {
        return Vec::new();
    };

    match errors {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let field = item
                    .get("field")
                    .or_else(|| item.get("path"))
                    .and_then(Value::as_str)?;
                let message = item
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Invalid value");
                Some(FieldError {
                    field: field.to_string(),
                    message: message.to_string(),
                })
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, value)| {
                let messages: Vec<String> = match value {
                    Value::String(s) => vec![s.clone()],
                    Value::Array(list) => list
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    _ => Vec::new(),
                };
                messages.into_iter().map(move |message| FieldError {
                    field: field.clone(),
                    message,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Notification errors
// =============================================================================

/// Errors raised by notification observers.
///
/// These never reach callers of the request pipeline; the sink logs and drops them.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(code: u16) -> ErrorClassification {
        classify(&Failure::response(code, None))
    }

    #[test]
    fn test_timeout_is_retryable_medium() {
        let c = classify(&Failure::Timeout);
        assert_eq!(c.kind, ErrorKind::Timeout);
        assert_eq!(c.severity, Severity::Medium);
        assert!(c.retryable);
    }

    #[test]
    fn test_network_is_retryable_medium() {
        let c = classify(&Failure::network("connection refused"));
        assert_eq!(c.kind, ErrorKind::Network);
        assert_eq!(c.severity, Severity::Medium);
        assert!(c.retryable);
    }

    #[test]
    fn test_status_specific_kinds() {
        assert_eq!(status(401), ErrorKind::Auth.classification());
        assert_eq!(status(401).severity, Severity::High);
        assert!(!status(401).retryable);

        assert_eq!(status(403).kind, ErrorKind::Forbidden);
        assert_eq!(status(404).kind, ErrorKind::NotFound);
        assert_eq!(status(404).severity, Severity::Low);

        let rate_limited = status(429);
        assert_eq!(rate_limited.kind, ErrorKind::RateLimited);
        assert!(rate_limited.retryable);
    }

    #[test]
    fn test_server_errors_cover_whole_5xx_range() {
        for code in [500, 502, 503, 504, 599] {
            let c = status(code);
            assert_eq!(c.kind, ErrorKind::ServerError, "status {}", code);
            assert_eq!(c.severity, Severity::High);
            assert!(c.retryable);
        }
    }

    #[test]
    fn test_4xx_with_field_errors_is_validation() {
        let body = json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{ "field": "email", "message": "Email is invalid" }]
        });
        let c = classify(&Failure::response(422, Some(body)));
        assert_eq!(c.kind, ErrorKind::Validation);
        assert!(!c.retryable);
    }

    #[test]
    fn test_4xx_without_field_errors_is_unknown() {
        let body = json!({ "success": false, "message": "Bad request", "errors": [] });
        assert_eq!(
            classify(&Failure::response(400, Some(body))).kind,
            ErrorKind::Unknown
        );
        assert_eq!(status(409).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_specific_status_takes_priority_over_field_errors() {
        // A 401 with field errors is still an auth failure.
        let body = json!({ "errors": [{ "field": "password", "message": "wrong" }] });
        assert_eq!(
            classify(&Failure::response(401, Some(body))).kind,
            ErrorKind::Auth
        );
    }

    #[test]
    fn test_out_of_range_status_and_other_are_unknown() {
        assert_eq!(status(200).kind, ErrorKind::Unknown);
        assert_eq!(status(302).kind, ErrorKind::Unknown);
        assert_eq!(status(600).kind, ErrorKind::Unknown);
        assert_eq!(
            classify(&Failure::other("malformed body")).kind,
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_field_errors_from_map() {
        let body = json!({
            "errors": {
                "email": "Email is required",
                "password": ["Too short", "Needs a digit"]
            }
        });
        let errors = field_errors(&body);
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| e.field == "password" && e.message == "Needs a digit"));
    }

    #[test]
    fn test_field_errors_accepts_path_key() {
        let body = json!({
            "errors": [{ "path": "address.zip", "message": "Invalid" }, { "nope": 1 }]
        });
        let errors = field_errors(&body);
        assert_eq!(
            errors,
            vec![FieldError {
                field: "address.zip".to_string(),
                message: "Invalid".to_string()
            }]
        );
    }

    #[test]
    fn test_failure_display_uses_server_message() {
        let failure = Failure::response(503, Some(json!({ "message": "Maintenance" })));
        assert_eq!(failure.to_string(), "HTTP 503: Maintenance");
        assert_eq!(Failure::response(404, None).to_string(), "HTTP 404");
        assert_eq!(failure.status(), Some(503));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert!(Severity::High.is_loggable());
        assert!(!Severity::Medium.is_loggable());
    }

    #[test]
    fn test_classification_serializes_camel_case() {
        let value = serde_json::to_value(ErrorKind::RateLimited.classification()).unwrap();
        assert_eq!(
            value,
            json!({ "kind": "rateLimited", "severity": "medium", "retryable": true })
        );
    }
}
