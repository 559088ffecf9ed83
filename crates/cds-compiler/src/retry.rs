//! Backoff for explorer requests.
//!
//! Only the ABI explorer client retries. The compiler core and the
//! enrichment pass never do: a failed completion aborts the request.
//!
//! # Example
//!
//! ```rust,ignore
//! use cds_compiler::retry::RetryConfig;
//! use std::time::Duration;
//!
//! let retry = RetryConfig::default()
//!     .with_max_retries(5)
//!     .with_initial_delay(Duration::from_millis(250));
//!
//! let explorer = ExplorerConfig::from_env().with_retry(retry);
//! ```

use crate::error::{CdsError, CdsResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Upper bound on a server-provided `Retry-After`, in seconds.
const MAX_RETRY_AFTER_SECS: u64 = 300;

/// Share of the computed delay that jitter may add or remove.
const JITTER_FACTOR: f64 = 0.5;

/// How often, and how patiently, a failed explorer request is repeated.
///
/// Delays double from `initial_delay` up to `max_delay`. Only errors for
/// which [`CdsError::is_retryable`] holds are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// A config for explorers with tight free-tier rate limits.
    ///
    /// Etherscan-style APIs allow a handful of calls per second without a
    /// paid key, so the first retry waits a full second.
    pub fn conservative() -> Self {
        Self {
            max_retries: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }

    /// Sets the number of retries after the first attempt.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the ceiling on any single backoff delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Makes delays exact.
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let doubled = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(retry - 1));
        let delay = doubled.min(self.max_delay);
        if !self.jitter {
            return delay;
        }
        // Uniform in [1 - JITTER_FACTOR, 1 + JITTER_FACTOR].
        let scale = 1.0 + JITTER_FACTOR * (rand::random::<f64>() * 2.0 - 1.0);
        delay.mul_f64(scale)
    }

    fn delay_after(&self, error: &CdsError, retry: u32) -> Duration {
        match error {
            CdsError::RateLimited {
                retry_after_secs: Some(secs),
            } => Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS)),
            _ => self.backoff(retry),
        }
    }
}

/// Runs explorer requests under a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Creates an executor.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `request` until it succeeds, fails with a non-retryable error,
    /// or the retries are used up.
    ///
    /// A [`CdsError::RateLimited`] carrying a `Retry-After` waits that long
    /// (at most five minutes) instead of the backoff delay.
    ///
    /// # Errors
    ///
    /// Returns the last error seen.
    pub async fn execute<F, Fut, T>(&self, request: F) -> CdsResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CdsResult<T>>,
    {
        let mut retry = 0;
        loop {
            let error = match request().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if retry == self.config.max_retries || !error.is_retryable() {
                return Err(error);
            }
            retry += 1;

            let delay = self.config.delay_after(&error, retry);
            warn!(
                retry,
                max_retries = self.config.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error.sanitized_message(),
                "retrying explorer request"
            );
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
    }
}
