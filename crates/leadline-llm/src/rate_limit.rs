//! Sliding-window rate limiter for outbound model calls.
//!
//! One limiter is shared by every backend and every session. The window is a
//! queue of call timestamps behind a single mutex, so pruning, the ceiling
//! check and the append happen atomically in [`RateLimiter::try_acquire`].

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use leadline_core::config::RateLimitConfig;

#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls.min(1024))),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_calls, Duration::from_secs(config.window_secs))
    }

    /// Whether another call would be admitted right now.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Record a call made right now.
    pub fn record(&self) {
        self.record_at(Instant::now());
    }

    /// Check and record in one step. Returns false when the ceiling is reached.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn allow_at(&self, now: Instant) -> bool {
        let mut calls = self.lock();
        self.prune(&mut calls, now);
        calls.len() < self.max_calls
    }

    pub fn record_at(&self, now: Instant) {
        self.lock().push_back(now);
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut calls = self.lock();
        self.prune(&mut calls, now);
        if calls.len() < self.max_calls {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    fn prune(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = calls.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// A poisoned lock only means another thread panicked mid-update; the
    /// queue itself is still a valid list of instants.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
