//! Sliding-window rate limiter.
//!
//! Pure accounting: each granted admission records a timestamp, every check
//! first prunes timestamps that have aged out of the window, and a full
//! window denies without recording anything. No blocking or waiting happens
//! here; callers decide what a denial means.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct WindowState {
    admissions: VecDeque<Instant>,
}

/// Counts admissions over a rolling time window.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    state: Mutex<WindowState>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            state: Mutex::new(WindowState {
                admissions: VecDeque::new(),
            }),
            max_requests,
            window,
        }
    }

    pub const fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Grant an admission if the window has room, recording it; deny
    /// without recording otherwise.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut state = self.lock_state();
        self.prune(&mut state, now);

        if state.admissions.len() >= self.max_requests {
            return false;
        }
        state.admissions.push_back(now);
        true
    }

    /// Admissions still available in the current window.
    pub fn remaining_quota(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock_state();
        self.prune(&mut state, now);
        self.max_requests.saturating_sub(state.admissions.len())
    }

    /// Instant at which the oldest counted admission ages out, or `None`
    /// when the window is empty.
    pub fn next_reset(&self) -> Option<Instant> {
        let now = Instant::now();
        let mut state = self.lock_state();
        self.prune(&mut state, now);
        state.admissions.front().map(|oldest| *oldest + self.window)
    }

    /// Forget every recorded admission.
    pub fn reset(&self) {
        self.lock_state().admissions.clear();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, WindowState> {
        self.state
            .lock()
            .expect("rate limiter state lock is not poisoned")
    }

    /// Drop admissions whose age has reached the window size. An admission
    /// exactly one window old no longer counts.
    fn prune(&self, state: &mut WindowState, now: Instant) {
        while let Some(oldest) = state.admissions.front() {
            if *oldest + self.window <= now {
                state.admissions.pop_front();
            } else {
                break;
            }
        }
    }
}
