//! Storefront Core - failure classification, retry policy and notifications.
//!
//! This crate holds the transport-agnostic half of the request pipeline. It has
//! no network code; the `api-client` crate drives it.

pub mod constants;
pub mod errors;
pub mod notifications;
pub mod retry;

pub use errors::{classify, ErrorClassification, ErrorKind, Failure, FieldError, Severity};
pub use retry::{RetryConfig, RetryDecision, RetryPolicy};
