/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Upper bound for the exponential component of a retry delay
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Growth factor between consecutive retry delays
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Upper bound for the random jitter added to every retry delay
pub const DEFAULT_MAX_JITTER_MS: u64 = 1_000;

/// Per-attempt request timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// How long a toast stays visible
pub const TOAST_DURATION_MS: u64 = 5_000;

/// Maximum entries kept in the diagnostic error log
pub const ERROR_LOG_CAPACITY: usize = 100;

/// Delay between the session-expired notice and the login redirect
pub const SESSION_REDIRECT_DELAY_MS: u64 = 2_000;

/// Storage key for the bearer token
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Route the client navigates to after a session expires
pub const LOGIN_ROUTE: &str = "/login";
