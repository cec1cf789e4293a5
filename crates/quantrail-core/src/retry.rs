//! Retry with exponential backoff and jitter.
//!
//! Only errors the taxonomy marks retryable are attempted again; anything
//! else, including unrecognized failures, surfaces immediately so programming
//! errors are never masked as transient faults. Exhausting attempts returns
//! the last underlying error unchanged.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::ApiError;

/// Fraction of the computed delay used as the jitter band (±20%).
const JITTER_RATIO: f64 = 0.2;

/// Attempt loop wrapping arbitrary async work.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: config.initial_delay,
            max_delay: config.max_delay,
            multiplier: config.multiplier,
        }
    }

    /// Backoff delay for a 0-based attempt index:
    /// `min(initial × multiplier^attempt, max)`, then a uniformly random
    /// offset of up to ±20%, floored at zero.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scale = self.multiplier.powi(attempt as i32);
        let seconds = self.initial_delay.as_secs_f64() * scale;
        let capped = Duration::from_secs_f64(seconds.min(self.max_delay.as_secs_f64()));

        let jitter_ms = (capped.as_millis() as f64 * JITTER_RATIO) as u64;
        if jitter_ms == 0 {
            return capped;
        }
        let offset = fastrand::u64(0..=jitter_ms * 2) as i64 - jitter_ms as i64;
        let total_ms = capped.as_millis() as i64 + offset;
        Duration::from_millis(total_ms.max(0) as u64)
    }

    /// Run `task` up to `max_retries + 1` times.
    ///
    /// A retryable failure sleeps for the computed backoff, or for the
    /// server-specified wait when the error carries one, then reattempts.
    ///
    /// # Errors
    ///
    /// The first non-retryable error, or the last error once attempts are
    /// exhausted, is returned unchanged.
    pub async fn execute<T, F, Fut>(&self, mut task: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let max_attempts = self.max_retries + 1;
        let mut attempt: u32 = 0;
        loop {
            match task().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.retryable() || attempt + 1 >= max_attempts {
                        return Err(err);
                    }
                    let delay = err
                        .retry_after()
                        .unwrap_or_else(|| self.delay_for_attempt(attempt));
                    tracing::debug!(
                        attempt,
                        kind = err.kind().as_str(),
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
