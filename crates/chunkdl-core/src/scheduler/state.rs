//! Run-wide shared state: byte counters, cancellation, and per-chunk bookkeeping.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{ChunkError, ChunkFailure, FailureKind};
use crate::planner::ChunkRange;
use crate::progress::ProgressSink;

/// Counters shared by every worker of one run.
///
/// `bytes_completed` only grows (bytes of chunks written to disk).
/// `bytes_in_flight` holds bytes received by attempts still running and is
/// given back when an attempt fails.
pub struct RunCounters {
    total_bytes: u64,
    bytes_completed: AtomicU64,
    bytes_in_flight: AtomicU64,
    cancel: AtomicBool,
    sink: Arc<dyn ProgressSink>,
}

impl RunCounters {
    pub fn new(total_bytes: u64, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            total_bytes,
            bytes_completed: AtomicU64::new(0),
            bytes_in_flight: AtomicU64::new(0),
            cancel: AtomicBool::new(false),
            sink,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_completed(&self) -> u64 {
        self.bytes_completed.load(Ordering::Acquire)
    }

    /// Bytes received so far, including attempts still running.
    pub fn bytes_so_far(&self) -> u64 {
        let done = self.bytes_completed.load(Ordering::Acquire);
        let in_flight = self.bytes_in_flight.load(Ordering::Acquire);
        (done + in_flight).min(self.total_bytes)
    }

    /// Record `delta` newly received bytes of `range` (`so_far` for the current attempt).
    pub fn on_received(&self, range: &ChunkRange, delta: u64, so_far: u64) {
        self.bytes_in_flight.fetch_add(delta, Ordering::AcqRel);
        self.sink.on_chunk_progress(range.index, so_far, range.len());
        self.sink
            .on_overall_progress(self.bytes_so_far(), self.total_bytes);
    }

    /// Drop the in-flight bytes of an attempt that did not complete.
    pub fn discard(&self, range: &ChunkRange, attempt_bytes: u64) {
        if attempt_bytes == 0 {
            return;
        }
        self.bytes_in_flight.fetch_sub(attempt_bytes, Ordering::AcqRel);
        self.sink.on_chunk_progress(range.index, 0, range.len());
    }

    /// Move a written chunk from in-flight to completed.
    pub fn complete(&self, range: &ChunkRange, attempt_bytes: u64) {
        self.bytes_completed.fetch_add(range.len(), Ordering::AcqRel);
        self.bytes_in_flight.fetch_sub(attempt_bytes, Ordering::AcqRel);
        self.sink.on_chunk_progress(range.index, range.len(), range.len());
        self.sink
            .on_overall_progress(self.bytes_so_far(), self.total_bytes);
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Token polled by in-flight transfers and backoff sleeps.
    pub fn cancel_token(&self) -> &AtomicBool {
        &self.cancel
    }
}

/// Coordinator-side bookkeeping: which chunks are unresolved and which failed.
pub struct RunState {
    pub counters: Arc<RunCounters>,
    outstanding: BTreeSet<ChunkRange>,
    failures: BTreeMap<ChunkRange, ChunkFailure>,
}

impl RunState {
    pub fn new(ranges: &[ChunkRange], sink: Arc<dyn ProgressSink>) -> Self {
        let total = ranges.iter().map(ChunkRange::len).sum();
        Self {
            counters: Arc::new(RunCounters::new(total, sink)),
            outstanding: ranges.iter().copied().collect(),
            failures: BTreeMap::new(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn record_success(&mut self, range: ChunkRange) {
        self.outstanding.remove(&range);
    }

    pub fn record_failure(&mut self, range: ChunkRange, failure: ChunkFailure) {
        self.outstanding.remove(&range);
        self.failures.insert(range, failure);
    }

    /// Resolve every chunk nobody reported on: cancelled if the run was
    /// cancelled, otherwise lost with its worker.
    pub fn resolve_leftovers(&mut self) {
        let cancelled = self.counters.is_cancelled();
        for range in std::mem::take(&mut self.outstanding) {
            let (kind, error) = if cancelled {
                (FailureKind::Cancelled, ChunkError::Cancelled)
            } else {
                (FailureKind::Permanent, ChunkError::WorkerLost)
            };
            self.failures.insert(
                range,
                ChunkFailure {
                    kind,
                    attempts: 0,
                    error,
                },
            );
        }
    }

    pub fn into_failures(self) -> BTreeMap<ChunkRange, ChunkFailure> {
        self.failures
    }
}
