//! Error types for the API client crate.

use storefront_core::{ErrorClassification, ErrorKind, Failure, FieldError};
use thiserror::Error;

/// Result type alias for API client operations.
pub type Result<T> = std::result::Result<T, ApiClientError>;

/// Terminal failure of a logical call after retries were exhausted or skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFailure {
    pub classification: ErrorClassification,
    /// HTTP status of the last attempt, if it produced a response.
    pub status: Option<u16>,
    /// Human-readable message: the server's, or the kind's default.
    pub message: String,
    pub field_errors: Vec<FieldError>,
    /// Number of attempts made, including the first.
    pub attempts: u32,
}

impl RequestFailure {
    pub fn from_failure(
        classification: ErrorClassification,
        failure: &Failure,
        attempts: u32,
    ) -> Self {
        let message = failure
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| classification.kind.default_message().to_string());
        Self {
            classification,
            status: failure.status(),
            message,
            field_errors: failure.field_errors(),
            attempts,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.classification.kind
    }
}

impl std::fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} after {} attempt(s): {}",
            self.classification, self.attempts, self.message
        )
    }
}

/// Errors that can occur during API client operations.
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// The call requires a bearer token and none is stored. Never sent to the server.
    #[error("Authentication required")]
    AuthRequired,

    /// The caller cancelled the logical call.
    #[error("Request cancelled")]
    Cancelled,

    /// The call failed with a classified error.
    #[error("Request failed: {0}")]
    Request(RequestFailure),

    /// Invalid request (bad URL, header value, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token storage error
    #[error("Token store error: {0}")]
    TokenStore(String),
}

impl ApiClientError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn token_store(message: impl Into<String>) -> Self {
        Self::TokenStore(message.into())
    }

    /// Classification of the failure, if the call reached classification.
    pub fn classification(&self) -> Option<ErrorClassification> {
        match self {
            Self::Request(failure) => Some(failure.classification),
            Self::AuthRequired => Some(ErrorKind::Auth.classification()),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.classification().map(|c| c.kind)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn as_request_failure(&self) -> Option<&RequestFailure> {
        match self {
            Self::Request(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_failure_prefers_server_message() {
        let failure = Failure::response(
            422,
            Some(json!({
                "success": false,
                "message": "Address is incomplete",
                "errors": [{ "field": "zip", "message": "Required" }]
            })),
        );
        let classification = storefront_core::classify(&failure);
        let request_failure = RequestFailure::from_failure(classification, &failure, 1);

        assert_eq!(request_failure.kind(), ErrorKind::Validation);
        assert_eq!(request_failure.status, Some(422));
        assert_eq!(request_failure.message, "Address is incomplete");
        assert_eq!(request_failure.field_errors.len(), 1);
    }

    #[test]
    fn test_request_failure_falls_back_to_default_message() {
        let classification = ErrorKind::Timeout.classification();
        let request_failure = RequestFailure::from_failure(classification, &Failure::Timeout, 4);
        assert_eq!(request_failure.status, None);
        assert_eq!(
            request_failure.message,
            ErrorKind::Timeout.default_message()
        );
        assert_eq!(
            request_failure.to_string(),
            "TIMEOUT (medium) after 4 attempt(s): The request timed out. Please try again."
        );
    }

    #[test]
    fn test_auth_required_classifies_as_auth() {
        let error = ApiClientError::AuthRequired;
        assert_eq!(error.kind(), Some(ErrorKind::Auth));
        assert!(!error.is_cancelled());
        assert!(ApiClientError::Cancelled.is_cancelled());
        assert_eq!(ApiClientError::Cancelled.classification(), None);
    }
}
