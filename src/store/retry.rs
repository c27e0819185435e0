//! Exponential backoff retry logic for event store calls.
//!
//! Retry only applies to transient store errors; fatal errors are returned
//! immediately. The orchestrator owns the retry decision — the store clients
//! themselves never retry.

use std::future::Future;
use std::time::Duration;

use super::error::{StoreError, StoreErrorKind};

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Initial delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential growth).
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (typically 2.0).
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Default retry configuration for store calls on the request path.
    ///
    /// - 3 retries with 250ms, 500ms, 1s delays
    /// - Total max wait: 1.75 seconds, small enough to stay inside an
    ///   inbound webhook's own delivery timeout
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_millis(250),
        max_delay: Duration::from_secs(2),
        backoff_multiplier: 2.0,
    };

    /// Creates a new retry configuration.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Computes the delay for the given retry attempt (0-indexed).
    ///
    /// The delay grows exponentially: `initial_delay * backoff_multiplier^attempt`,
    /// capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    /// Returns an iterator over all retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    /// Computes the total maximum wait time for all retries.
    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T> {
    /// The operation succeeded.
    Success(T),

    /// A transient error persisted through all retries.
    ExhaustedRetries {
        /// The last error encountered.
        last_error: StoreError,
        /// Number of attempts made (including the initial attempt).
        attempts: u32,
    },

    /// A fatal error occurred (not retriable).
    FatalError(StoreError),
}

impl<T> RetryResult<T> {
    /// Converts to a Result, treating exhausted retries and fatal errors as Err.
    pub fn into_result(self) -> Result<T, StoreError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::FatalError(e) => Err(e),
        }
    }

    /// Returns true if the result is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }
}

/// Executes an async store operation with retry logic.
///
/// The operation is retried according to the configuration when it returns a
/// transient error. Fatal errors are returned immediately.
pub async fn retry_with_backoff<T, F, Fut>(config: RetryConfig, mut operation: F) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = config.max_retries + 1; // Include initial attempt
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => {
                attempt += 1;

                match e.kind {
                    StoreErrorKind::Fatal => return RetryResult::FatalError(e),
                    StoreErrorKind::Transient => {
                        if attempt >= max_attempts {
                            return RetryResult::ExhaustedRetries {
                                last_error: e,
                                attempts: attempt,
                            };
                        }

                        let delay = config.delay_for_attempt(attempt - 1);
                        tracing::debug!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "transient store error, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
