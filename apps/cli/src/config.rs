use std::path::PathBuf;
use std::time::Duration;

use storefront_core::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_MS,
    LOGIN_ROUTE,
};
use storefront_core::RetryConfig;

const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Runtime configuration read from `STOREFRONT_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub retries: RetryConfig,
    /// Token file; tokens live in memory only when unset.
    pub token_file: Option<PathBuf>,
    pub login_route: String,
}

impl Config {
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_ms = env_parse("STOREFRONT_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS);
        let retries = RetryConfig {
            max_retries: env_parse("STOREFRONT_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            base_delay_ms: env_parse("STOREFRONT_BASE_DELAY_MS", DEFAULT_BASE_DELAY_MS),
            max_delay_ms: env_parse("STOREFRONT_MAX_DELAY_MS", DEFAULT_MAX_DELAY_MS),
            ..RetryConfig::default()
        };
        let token_file = std::env::var("STOREFRONT_TOKEN_FILE")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let login_route =
            std::env::var("STOREFRONT_LOGIN_ROUTE").unwrap_or_else(|_| LOGIN_ROUTE.to_string());

        Self {
            api_url,
            timeout: Duration::from_millis(timeout_ms),
            retries,
            token_file,
            login_route,
        }
    }
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
