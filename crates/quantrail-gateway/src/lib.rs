//! Admission throttle for the tool-invocation gateway.
//!
//! This is the second, independent entry point guarded by the sliding-window
//! rate limiter: before a tool call is handled, the gateway asks the limiter
//! for an admission. A denial is returned as a structured value whose display
//! message tells the caller the configured limit, the window size, and how
//! long to wait, instead of a raw boolean.
//!
//! The gate is an explicitly constructed, explicitly owned instance; the
//! embedding process decides where the shared instance lives, and tests
//! construct isolated ones.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use quantrail_core::ratelimit::SlidingWindowLimiter;
use tokio::time::Instant;

/// A denied admission, carrying everything needed for a useful message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDenied {
    pub limit: usize,
    pub window: Duration,
    pub retry_after: Duration,
}

impl AdmissionDenied {
    /// Wait time in whole seconds, rounded up so callers never retry early.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.as_secs_f64().ceil() as u64
    }
}

impl Display for AdmissionDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rate limit of {} requests per {}s reached; retry in {}s",
            self.limit,
            self.window.as_secs(),
            self.retry_after_secs()
        )
    }
}

impl std::error::Error for AdmissionDenied {}

/// Sliding-window admission gate for incoming tool calls.
#[derive(Debug)]
pub struct AdmissionGate {
    limiter: SlidingWindowLimiter,
}

impl AdmissionGate {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            limiter: SlidingWindowLimiter::new(max_requests, window),
        }
    }

    /// Admit one call, or explain the denial.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionDenied`] when the window is full; the denial itself
    /// is not recorded against the quota.
    pub fn admit(&self) -> Result<(), AdmissionDenied> {
        if self.limiter.try_acquire() {
            return Ok(());
        }

        let retry_after = self
            .limiter
            .next_reset()
            .map(|reset| reset.saturating_duration_since(Instant::now()))
            .unwrap_or_default();
        let denied = AdmissionDenied {
            limit: self.limiter.max_requests(),
            window: self.limiter.window(),
            retry_after,
        };
        tracing::warn!(
            limit = denied.limit,
            window_secs = denied.window.as_secs(),
            retry_after_secs = denied.retry_after_secs(),
            "tool call denied by admission gate"
        );
        Err(denied)
    }

    /// Admissions still available in the current window.
    pub fn remaining_quota(&self) -> usize {
        self.limiter.remaining_quota()
    }

    /// Forget all recorded admissions.
    pub fn reset(&self) {
        self.limiter.reset();
    }
}
