//! Client configuration and its closed-range validation.
//!
//! All bounds are checked once at client construction; a validated
//! configuration is immutable for the lifetime of the client instance.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Smallest accepted request timeout.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1_000);
/// Largest accepted request timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_millis(300_000);
/// Hard ceiling on configured retries.
pub const MAX_RETRIES_LIMIT: u32 = 10;
/// Hard ceiling on simultaneous in-flight requests.
pub const MAX_CONCURRENT_LIMIT: usize = 50;

/// Retry bounds for the exponential-backoff policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the first attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Concurrency bounds for the request limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub max_concurrent: usize,
    /// Minimum spacing between dispatch starts.
    pub min_spacing: Duration,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            min_spacing: Duration::ZERO,
        }
    }
}

/// Cache bounds for the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub default_ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(300),
            capacity: 256,
        }
    }
}

/// Full client configuration, validated once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub token: String,
    /// Per-request timeout enforced at the transport boundary.
    pub timeout: Option<Duration>,
    pub retry: RetryConfig,
    pub concurrency: ConcurrencyConfig,
    pub cache: CacheConfig,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            timeout: None,
            retry: RetryConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrencyConfig) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Check every bound against its closed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered; no partial state is
    /// created and no network interaction occurs.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token.trim().is_empty() {
            return Err(ValidationError::EmptyToken);
        }

        if let Some(timeout) = self.timeout {
            if timeout < MIN_TIMEOUT || timeout > MAX_TIMEOUT {
                return Err(ValidationError::TimeoutOutOfRange {
                    actual_ms: timeout.as_millis() as u64,
                    min_ms: MIN_TIMEOUT.as_millis() as u64,
                    max_ms: MAX_TIMEOUT.as_millis() as u64,
                });
            }
        }

        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(ValidationError::TooManyRetries {
                actual: self.retry.max_retries,
                max: MAX_RETRIES_LIMIT,
            });
        }
        if self.retry.multiplier < 1.0 {
            return Err(ValidationError::MultiplierTooSmall {
                actual: self.retry.multiplier,
            });
        }

        if self.concurrency.max_concurrent == 0
            || self.concurrency.max_concurrent > MAX_CONCURRENT_LIMIT
        {
            return Err(ValidationError::ConcurrencyOutOfRange {
                actual: self.concurrency.max_concurrent,
                max: MAX_CONCURRENT_LIMIT,
            });
        }

        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(ValidationError::ZeroCacheCapacity);
        }

        Ok(())
    }
}
