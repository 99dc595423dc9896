//! Retry policy: exponential backoff with additive jitter.
//!
//! The policy is stateless. The request executor owns attempt counting and asks
//! [`RetryPolicy::decide`] after every classified failure.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_JITTER_MS,
    DEFAULT_MAX_RETRIES,
};
use crate::errors::ErrorClassification;

/// Backoff configuration for one logical call.
///
/// `max_retries` counts retries, so a call makes at most `max_retries + 1` attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    /// Upper bound of the uniform jitter added to every delay.
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_jitter_ms: DEFAULT_MAX_JITTER_MS,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.max_jitter_ms = 0;
        self
    }
}

/// Outcome of consulting the policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
}

impl RetryDecision {
    pub fn stop() -> Self {
        Self {
            should_retry: false,
            delay: Duration::ZERO,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay.as_millis() as u64
    }
}

/// Exponential backoff policy over a [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Decides whether the attempt at `attempt_index` (0-based) should be retried.
    pub fn decide(
        &self,
        attempt_index: u32,
        classification: &ErrorClassification,
    ) -> RetryDecision {
        self.decide_with_rng(attempt_index, classification, &mut rand::thread_rng())
    }

    /// Same as [`decide`](Self::decide) with a caller-supplied random source.
    pub fn decide_with_rng<R: Rng + ?Sized>(
        &self,
        attempt_index: u32,
        classification: &ErrorClassification,
        rng: &mut R,
    ) -> RetryDecision {
        let should_retry = classification.retryable && attempt_index < self.config.max_retries;
        if !should_retry {
            return RetryDecision::stop();
        }

        let jitter = if self.config.max_jitter_ms > 0 {
            rng.gen_range(0..=self.config.max_jitter_ms)
        } else {
            0
        };

        RetryDecision {
            should_retry,
            delay: self.backoff(attempt_index) + Duration::from_millis(jitter),
        }
    }

    /// The un-jittered delay for `attempt_index`: `min(base * factor^attempt, max)`.
    ///
    /// Non-decreasing in `attempt_index` for any factor >= 1.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let factor = self.config.backoff_factor.max(1.0);
        let exponent = attempt_index.min(i32::MAX as u32) as i32;
        let raw = self.config.base_delay_ms as f64 * factor.powi(exponent);
        let capped = raw.min(self.config.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }
}
