//! Per-category token bucket rate limiter.
//!
//! Optional politeness layer in front of the executor. Each endpoint category
//! (for example `orders` or `products`) gets its own bucket; categories never
//! share tokens. Not required for correctness.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bucket capacity (allows bursting).
const DEFAULT_BURST_CAPACITY: f64 = 10.0;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.capacity();
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            rate: config.requests_per_minute as f64 / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Takes a token, or reports how long until one is available.
    fn take(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }
        if self.rate <= 0.0 {
            return Err(Duration::from_secs(60));
        }
        Err(Duration::from_secs_f64((1.0 - self.tokens) / self.rate))
    }
}

/// Limits for one category.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: f64,
}

impl RateLimitConfig {
    /// Bucket capacity, never below one token so a request can always proceed.
    fn capacity(&self) -> f64 {
        if self.burst_capacity.is_nan() {
            return 1.0;
        }
        self.burst_capacity.max(1.0)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BURST_CAPACITY,
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    buckets: HashMap<String, TokenBucket>,
    overrides: HashMap<String, RateLimitConfig>,
}

impl LimiterState {
    fn bucket(&mut self, category: &str, default: &RateLimitConfig) -> &mut TokenBucket {
        let overrides = &self.overrides;
        self.buckets
            .entry(category.to_string())
            .or_insert_with(|| TokenBucket::new(overrides.get(category).unwrap_or(default)))
    }
}

/// Thread-safe limiter holding one bucket per category, created on demand.
#[derive(Debug, Default)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    default_config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limiter whose unconfigured categories use `config`.
    pub fn with_default(config: RateLimitConfig) -> Self {
        Self {
            state: Mutex::new(LimiterState::default()),
            default_config: config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Sets limits for one category and resets its bucket.
    pub fn configure(&self, category: &str, config: RateLimitConfig) {
        let mut state = self.lock();
        state.overrides.insert(category.to_string(), config);
        state.buckets.remove(category);
    }

    /// Waits until a token for `category` is available.
    ///
    /// Only this caller's task sleeps; the lock is never held across the wait.
    pub async fn acquire(&self, category: &str) {
        loop {
            let wait = {
                let mut state = self.lock();
                match state.bucket(category, &self.default_config).take() {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            debug!("Rate limiter: waiting {:?} for '{}'", wait, category);
            tokio::time::sleep(wait).await;
        }
    }

    /// Takes a token without waiting. Returns false when limited.
    pub fn try_acquire(&self, category: &str) -> bool {
        self.lock()
            .bucket(category, &self.default_config)
            .take()
            .is_ok()
    }

    pub fn remaining_tokens(&self, category: &str) -> f64 {
        let mut state = self.lock();
        match state.buckets.get_mut(category) {
            Some(bucket) => {
                bucket.refill();
                bucket.tokens
            }
            None => state
                .overrides
                .get(category)
                .unwrap_or(&self.default_config)
                .capacity(),
        }
    }

    pub fn reset(&self, category: &str) {
        self.lock().buckets.remove(category);
    }
}
