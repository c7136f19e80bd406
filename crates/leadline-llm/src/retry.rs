//! Backoff schedule for model endpoint retries.

use std::time::Duration;

use leadline_core::config::LlmConfig;

/// Retry schedule for model calls.
///
/// Only gateway-style statuses (502, 503, 504) are retried. Delays double
/// from `base_delay`: with the defaults a call is tried three times with
/// 0.5s and 1s pauses in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
        )
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Whether another attempt may follow attempt number `attempt` (zero-based).
    pub fn should_retry(&self, attempt: u32, status: u16) -> bool {
        attempt + 1 < self.max_attempts && is_retryable_status(status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 502..=504)
}
