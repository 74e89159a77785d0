//! Retry loop: run a closure until success or the policy says stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::classify::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::{ChunkError, ChunkFailure, FailureKind};

const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Runs `f` until it succeeds or the retry policy says to stop, sleeping for
/// the backoff delay between attempts. `f` receives the 1-based attempt number.
///
/// When `cancel` is set the loop stops before the next attempt and reports
/// the chunk as cancelled.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    cancel: Option<&AtomicBool>,
    mut f: F,
) -> Result<T, ChunkFailure>
where
    F: FnMut(u32) -> Result<T, ChunkError>,
{
    let is_cancelled = || cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false);
    let mut attempt = 1u32;
    let mut integrity_failures = 0u32;
    loop {
        let error = match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let kind = classify(&error);
        if kind == FailureKind::Integrity {
            integrity_failures += 1;
        }
        match policy.decide(attempt, kind, integrity_failures) {
            RetryDecision::NoRetry => {
                return Err(ChunkFailure { kind, attempts: attempt, error });
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(attempt, ?delay, "{}: {}, retrying", kind, error);
                let deadline = Instant::now() + delay;
                while Instant::now() < deadline {
                    if is_cancelled() {
                        break;
                    }
                    let left = deadline.saturating_duration_since(Instant::now());
                    std::thread::sleep(left.min(CANCEL_POLL));
                }
                if is_cancelled() {
                    return Err(ChunkFailure {
                        kind: FailureKind::Cancelled,
                        attempts: attempt,
                        error: ChunkError::Cancelled,
                    });
                }
                attempt += 1;
            }
        }
    }
}
