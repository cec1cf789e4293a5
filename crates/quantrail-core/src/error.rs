//! Error taxonomy for the query pipeline.
//!
//! Two layers: [`ValidationError`] for synchronous configuration and request
//! checks that abort before any network interaction, and [`ApiError`] for
//! classified transport failures that the retry policy inspects.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

/// Classification of a failed API call.
///
/// Network, rate-limit, server, and timeout failures are transient and may be
/// retried; validation and auth failures are permanent, and anything that does
/// not match the recognized taxonomy is treated as a programming error rather
/// than a transient fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Auth,
    RateLimit,
    Server,
    Timeout,
    Unknown,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Server => "server",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }

    /// Default retryability for this kind of failure.
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::RateLimit | Self::Server | Self::Timeout
        )
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error surfaced by the transport boundary and the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    retryable: bool,
    retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
            retry_after: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Attach a server-specified minimum wait before the next attempt.
    ///
    /// The retry policy uses this verbatim in place of its computed backoff.
    pub fn with_retry_after(mut self, wait: Duration) -> Self {
        self.retry_after = Some(wait);
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Validation => "api.validation",
            ErrorKind::Network => "api.network",
            ErrorKind::Auth => "api.auth",
            ErrorKind::RateLimit => "api.rate_limited",
            ErrorKind::Server => "api.server",
            ErrorKind::Timeout => "api.timeout",
            ErrorKind::Unknown => "api.unknown",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Validation errors raised before any request is dispatched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("api token cannot be empty")]
    EmptyToken,
    #[error("timeout {actual_ms}ms is outside the allowed range [{min_ms}ms, {max_ms}ms]")]
    TimeoutOutOfRange {
        actual_ms: u64,
        min_ms: u64,
        max_ms: u64,
    },
    #[error("max_retries {actual} exceeds the maximum of {max}")]
    TooManyRetries { actual: u32, max: u32 },
    #[error("backoff multiplier must be >= 1, got {actual}")]
    MultiplierTooSmall { actual: f64 },
    #[error("max_concurrent {actual} is outside the allowed range [1, {max}]")]
    ConcurrencyOutOfRange { actual: usize, max: usize },
    #[error("cache capacity must be greater than zero")]
    ZeroCacheCapacity,

    #[error("operation name cannot be empty")]
    EmptyOperation,
    #[error("parameter '{field}' is not a valid date: '{value}' (expected YYYYMMDD or YYYY-MM-DD)")]
    InvalidDate { field: String, value: String },
    #[error("start date '{start}' is after end date '{end}'")]
    DateRangeInverted { start: String, end: String },
}
