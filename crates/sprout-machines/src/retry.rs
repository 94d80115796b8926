//! Retry with exponential backoff for mutating remote calls.
//!
//! [`RetryPolicy`] is a plain value: it holds no counters or timers of its
//! own, so one policy can drive any number of concurrent operations. Each
//! call to [`RetryPolicy::execute`] runs its attempts strictly one after
//! another and keeps its attempt index on the stack.

use crate::error::Retryable;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for the backoff schedule.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Exponential backoff policy without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed (values below 1 are treated as 1).
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles for each later one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit limits.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Backoff to sleep after the attempt with 0-based index `attempt` fails.
    ///
    /// `base_delay * 2^attempt`, saturating instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// Non-retryable errors are returned immediately. When the last attempt
    /// fails, its error is returned unchanged.
    pub async fn execute<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            let err = match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(operation, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                tracing::debug!(operation, attempt = attempt + 1, error = %err, "Non-retryable failure");
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                tracing::debug!(operation, attempts = max_attempts, error = %err, "Retry budget exhausted");
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                operation,
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
