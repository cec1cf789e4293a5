//! Concurrency limiter with paced FIFO dispatch.
//!
//! Callers hand [`RequestLimiter::execute`] an arbitrary future. The limiter
//! queues it, and a drain step (run on every enqueue and every completion)
//! dispatches queue heads while two conditions hold: the in-flight count is
//! below the configured maximum, and the configured minimum spacing has
//! elapsed since the last dispatch. When spacing has not elapsed the drain is
//! deferred by the remaining delay instead of dispatching early.
//!
//! Dispatch starts are FIFO by enqueue order; completion order is whatever
//! the underlying work produces. The queue is unbounded: back-pressure is the
//! calling side's concern in a client library.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::config::ConcurrencyConfig;

#[derive(Debug)]
struct LimiterState {
    waiters: VecDeque<oneshot::Sender<()>>,
    in_flight: usize,
    last_dispatch: Option<Instant>,
    wakeup_scheduled: bool,
}

#[derive(Debug)]
struct LimiterInner {
    state: Mutex<LimiterState>,
    max_in_flight: usize,
    min_spacing: Duration,
}

/// FIFO dispatch queue bounding simultaneous work and pacing dispatch starts.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    inner: Arc<LimiterInner>,
}

impl RequestLimiter {
    pub fn new(max_in_flight: usize, min_spacing: Duration) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                state: Mutex::new(LimiterState {
                    waiters: VecDeque::new(),
                    in_flight: 0,
                    last_dispatch: None,
                    wakeup_scheduled: false,
                }),
                max_in_flight: max_in_flight.max(1),
                min_spacing,
            }),
        }
    }

    pub fn from_config(config: &ConcurrencyConfig) -> Self {
        Self::new(config.max_concurrent, config.min_spacing)
    }

    /// Run `task` once a slot and the pacing interval are free.
    ///
    /// The task's output is handed back to the caller unchanged; failures are
    /// not retried here. Dropping the returned future before dispatch removes
    /// the caller from the queue without consuming a slot.
    pub async fn execute<T, F>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock_state();
            state.waiters.push_back(tx);
            self.drain(&mut state);
        }

        // Err only if the limiter vanished mid-wait; proceed rather than hang.
        let _ = rx.await;

        let _slot = InFlightSlot {
            limiter: self.clone(),
        };
        task.await
    }

    /// Pending tasks not yet dispatched.
    pub fn queued_len(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Tasks currently executing.
    pub fn in_flight(&self) -> usize {
        self.lock_state().in_flight
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LimiterState> {
        self.inner
            .state
            .lock()
            .expect("limiter state lock is not poisoned")
    }

    /// Dispatch queue heads while a slot is free and spacing has elapsed.
    fn drain(&self, state: &mut LimiterState) {
        loop {
            if state.in_flight >= self.inner.max_in_flight || state.waiters.is_empty() {
                return;
            }

            if let Some(last) = state.last_dispatch {
                let elapsed = last.elapsed();
                if elapsed < self.inner.min_spacing {
                    self.schedule_wakeup(state, self.inner.min_spacing - elapsed);
                    return;
                }
            }

            let waiter = state.waiters.pop_front().expect("queue checked non-empty");
            if waiter.send(()).is_ok() {
                state.in_flight += 1;
                state.last_dispatch = Some(Instant::now());
                tracing::trace!(
                    in_flight = state.in_flight,
                    queued = state.waiters.len(),
                    "dispatched queued task"
                );
            }
            // A waiter whose receiver was dropped abandoned the queue; it
            // consumes neither a slot nor the pacing interval.
        }
    }

    /// Re-run the drain after `delay`. At most one wakeup is pending at a time.
    fn schedule_wakeup(&self, state: &mut LimiterState, delay: Duration) {
        if state.wakeup_scheduled {
            return;
        }
        state.wakeup_scheduled = true;

        let limiter = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = limiter.lock_state();
            state.wakeup_scheduled = false;
            limiter.drain(&mut state);
        });
    }
}

/// Releases an in-flight slot on drop, so completion and panic paths both
/// pull the next queued task through.
struct InFlightSlot {
    limiter: RequestLimiter,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        let mut state = self.limiter.lock_state();
        state.in_flight = state.in_flight.saturating_sub(1);
        self.limiter.drain(&mut state);
    }
}
