//! Application configuration.
//!
//! One explicit [`Config`] struct, built from the environment at startup and
//! passed by reference into every component that needs it. There is no
//! ambient global configuration anywhere in the crate.

use std::time::Duration;
use thiserror::Error;

use crate::ingest::StalenessConfig;
use crate::store::{RetryConfig, StoreSettings};

/// A configuration value could not be interpreted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that does not parse.
    #[error("invalid value for {var}: {value:?} ({detail})")]
    InvalidValue {
        var: &'static str,
        value: String,
        detail: String,
    },
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:6565").
    pub bind_addr: String,

    /// Base URL used when composing hypermedia links
    /// (e.g., "http://localhost:6565").
    pub public_base_url: String,

    /// Connection settings for the external event store.
    pub store: StoreSettings,

    /// Retry tuning for store appends.
    pub retry: RetryConfig,

    /// Staleness tolerance for read-after-write projection lookups.
    pub staleness: StalenessConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `BIND_ADDR` (default "0.0.0.0:6565")
    /// - `PUBLIC_BASE_URL` (default "http://localhost:6565")
    /// - `EVENT_STORE_URL` (default "http://localhost:2113")
    /// - `EVENT_STORE_USER` (default "admin")
    /// - `EVENT_STORE_PASSWORD` (default "changeit")
    /// - `STORE_TIMEOUT_MS` (default 5000)
    /// - `STORE_RETRY_MAX` (default 3)
    /// - `STORE_RETRY_INITIAL_DELAY_MS` (default 250)
    /// - `STALENESS_WINDOW_MS` (default 1500)
    /// - `STALENESS_POLL_INTERVAL_MS` (default 150)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:6565");
        let public_base_url = env_or("PUBLIC_BASE_URL", "http://localhost:6565");

        let store = StoreSettings {
            base_url: env_or("EVENT_STORE_URL", "http://localhost:2113"),
            username: env_or("EVENT_STORE_USER", "admin"),
            password: env_or("EVENT_STORE_PASSWORD", "changeit"),
            request_timeout: Duration::from_millis(env_millis("STORE_TIMEOUT_MS", 5000)?),
        };

        let retry = RetryConfig {
            max_retries: env_u32("STORE_RETRY_MAX", 3)?,
            initial_delay: Duration::from_millis(env_millis(
                "STORE_RETRY_INITIAL_DELAY_MS",
                250,
            )?),
            ..RetryConfig::DEFAULT
        };

        let staleness = StalenessConfig {
            window: Duration::from_millis(env_millis("STALENESS_WINDOW_MS", 1500)?),
            poll_interval: Duration::from_millis(env_millis("STALENESS_POLL_INTERVAL_MS", 150)?),
        };

        tracing::info!(
            bind_addr = %bind_addr,
            store_url = %store.base_url,
            store_timeout_ms = store.request_timeout.as_millis() as u64,
            retry_max = retry.max_retries,
            staleness_window_ms = staleness.window.as_millis() as u64,
            "configuration loaded"
        );

        Ok(Config {
            bind_addr,
            public_base_url,
            store,
            retry,
            staleness,
        })
    }
}

fn env_or(var: &'static str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn env_millis(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => value.parse().map_err(|e| ConfigError::InvalidValue {
            var,
            value,
            detail: format!("expected milliseconds as an integer: {e}"),
        }),
    }
}

fn env_u32(var: &'static str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => value.parse().map_err(|e| ConfigError::InvalidValue {
            var,
            value,
            detail: format!("expected an integer: {e}"),
        }),
    }
}
