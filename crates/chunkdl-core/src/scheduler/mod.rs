//! Bounded worker pool for chunk downloads.
//!
//! Ranges are queued in index order; at most `concurrency` worker threads
//! pull from the queue, fetch, and write each chunk at its own offset.
//! Results come back over a channel to the calling thread, which records
//! successes and failures. One chunk failing never stops its siblings unless
//! `fail_fast` is set, in which case the first unrecoverable failure cancels
//! every in-flight transfer.

mod state;
mod worker;

use std::collections::{BTreeMap, VecDeque};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::assembler::Assembler;
use crate::error::{ChunkFailure, FailureKind};
use crate::fetcher::FetchOptions;
use crate::planner::ChunkRange;
use crate::progress::ProgressSink;
use crate::retry::RetryPolicy;

pub use state::{RunCounters, RunState};

/// How a run is executed.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Maximum concurrently running fetches (at least 1).
    pub concurrency: usize,
    pub fail_fast: bool,
    pub retry: RetryPolicy,
    pub fetch: FetchOptions,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get().max(1),
            fail_fast: false,
            retry: RetryPolicy::default(),
            fetch: FetchOptions::default(),
        }
    }
}

/// Outcome of one run over a set of ranges.
#[derive(Debug)]
pub struct RunSummary {
    pub total_bytes: u64,
    /// Bytes of chunks successfully written.
    pub bytes_completed: u64,
    /// Unresolved chunks, in index order.
    pub failures: BTreeMap<ChunkRange, ChunkFailure>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Download every range of `url` into `assembler` with a bounded worker pool.
///
/// Returns once each range has either been written or has a failure recorded.
pub fn run(
    url: &str,
    ranges: &[ChunkRange],
    assembler: &Assembler,
    opts: &SchedulerOptions,
    sink: Arc<dyn ProgressSink>,
) -> RunSummary {
    let mut state = RunState::new(ranges, sink);
    let counters = Arc::clone(&state.counters);

    if ranges.is_empty() {
        return RunSummary {
            total_bytes: 0,
            bytes_completed: 0,
            failures: BTreeMap::new(),
        };
    }

    let work: worker::WorkQueue = Arc::new(Mutex::new(ranges.iter().copied().collect::<VecDeque<_>>()));
    let (tx, rx) = mpsc::channel::<worker::Outcome>();
    let num_workers = opts.concurrency.max(1).min(ranges.len());
    let ctx = worker::WorkerContext {
        url: url.to_string(),
        assembler: assembler.clone(),
        retry: opts.retry,
        fetch: opts.fetch,
        counters: Arc::clone(&counters),
    };

    tracing::info!(
        chunks = ranges.len(),
        workers = num_workers,
        total_bytes = counters.total_bytes(),
        fail_fast = opts.fail_fast,
        "starting chunk download"
    );

    let mut handles = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        let ctx = ctx.clone();
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("chunkdl-worker-{}", i))
            .spawn(move || worker::run_worker(ctx, work, tx));
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => tracing::warn!("failed to spawn worker {}: {}", i, e),
        }
    }
    drop(tx);

    for (range, outcome) in rx {
        match outcome {
            Ok(()) => {
                tracing::debug!("completed {}", range);
                state.record_success(range);
            }
            Err(failure) => {
                if failure.kind == FailureKind::Cancelled {
                    tracing::debug!("{} cancelled", range);
                } else {
                    tracing::warn!("{} failed: {}", range, failure);
                    if opts.fail_fast && !counters.is_cancelled() {
                        tracing::info!("fail-fast: cancelling remaining chunks");
                        counters.cancel();
                    }
                }
                state.record_failure(range, failure);
            }
        }
    }

    for h in handles {
        if h.join().is_err() {
            tracing::warn!("worker thread panicked");
        }
    }
    state.resolve_leftovers();

    let summary = RunSummary {
        total_bytes: counters.total_bytes(),
        bytes_completed: counters.bytes_completed(),
        failures: state.into_failures(),
    };
    tracing::info!(
        bytes_completed = summary.bytes_completed,
        failed = summary.failures.len(),
        "chunk download finished"
    );
    summary
}
