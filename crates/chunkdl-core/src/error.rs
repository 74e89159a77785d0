//! Per-chunk error types and the failure taxonomy used by the scheduler.

use std::fmt;

/// Error from fetching or writing a single chunk. Classified into a
/// [`FailureKind`] by [`crate::retry::classify`] before deciding retries.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// libcurl reported a transfer failure (timeout, connection, DNS, TLS...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Non-2xx response status.
    #[error("HTTP {0}")]
    Http(u32),
    /// 2xx response that is not `206 Partial Content`: the server ignored the range.
    #[error("server ignored range request (HTTP {0})")]
    RangeIgnored(u32),
    /// `Content-Range` names a different span than the one requested.
    #[error("content range mismatch: requested {requested}, got {received}")]
    ContentRangeMismatch { requested: String, received: String },
    /// Body length differs from the requested span.
    #[error("length mismatch: expected {expected} bytes, got {received}")]
    LengthMismatch { expected: u64, received: u64 },
    /// Local write failed (disk full, permission denied...).
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    /// Transfer stopped because the run was cancelled (fail-fast).
    #[error("cancelled")]
    Cancelled,
    /// The worker holding the chunk exited (panic or spawn failure) before reporting.
    #[error("worker exited before finishing the chunk")]
    WorkerLost,
}

/// Failure taxonomy for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network-level failure; retried.
    Transient,
    /// Server refused the request for good (404, 410, 416...); not retried.
    Permanent,
    /// Byte count or range mismatch; retried once.
    Integrity,
    /// Local disk failure; not retried.
    Io,
    /// Chunk never finished because the run was cancelled.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Transient => "transient fetch error",
            FailureKind::Permanent => "permanent fetch error",
            FailureKind::Integrity => "integrity error",
            FailureKind::Io => "I/O error",
            FailureKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Terminal failure recorded against a chunk once retries are exhausted.
#[derive(Debug)]
pub struct ChunkFailure {
    pub kind: FailureKind,
    /// Attempts made, including the first (0 if never dispatched).
    pub attempts: u32,
    pub error: ChunkError,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.error)?;
        if self.attempts > 0 {
            let plural = if self.attempts == 1 { "" } else { "s" };
            write!(f, " after {} attempt{}", self.attempts, plural)?;
        }
        Ok(())
    }
}
