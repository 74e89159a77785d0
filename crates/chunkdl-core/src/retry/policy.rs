use std::time::Duration;

use crate::error::FailureKind;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
    /// How many integrity failures are retried before the chunk is given up.
    pub integrity_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            integrity_retries: 1,
        }
    }
}

impl RetryPolicy {
    /// Decide whether to retry after a failure.
    ///
    /// `attempt` is 1-based (1 = first attempt). `integrity_failures` counts
    /// integrity failures so far, including this one.
    pub fn decide(&self, attempt: u32, kind: FailureKind, integrity_failures: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            FailureKind::Permanent | FailureKind::Io | FailureKind::Cancelled => {
                RetryDecision::NoRetry
            }
            FailureKind::Integrity if integrity_failures > self.integrity_retries => {
                RetryDecision::NoRetry
            }
            FailureKind::Transient | FailureKind::Integrity => {
                // base * 2^(attempt-1), capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}
