//! Worker loop: pull the next range, fetch it with retries, write it in place.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};

use super::state::RunCounters;
use crate::assembler::Assembler;
use crate::error::{ChunkError, ChunkFailure, FailureKind};
use crate::fetcher::{ChunkFetcher, FetchOptions};
use crate::planner::ChunkRange;
use crate::retry::{run_with_retry, RetryPolicy};

pub(super) type WorkQueue = Arc<Mutex<VecDeque<ChunkRange>>>;
pub(super) type Outcome = (ChunkRange, Result<(), ChunkFailure>);

/// Everything a worker thread needs; cloned once per worker.
#[derive(Clone)]
pub(super) struct WorkerContext {
    pub url: String,
    pub assembler: Assembler,
    pub retry: RetryPolicy,
    pub fetch: FetchOptions,
    pub counters: Arc<RunCounters>,
}

/// Runs until the queue is empty, the run is cancelled, or the coordinator
/// stops listening. One fetcher (one connection) is reused for every chunk.
pub(super) fn run_worker(ctx: WorkerContext, work: WorkQueue, tx: mpsc::Sender<Outcome>) {
    let mut fetcher = ChunkFetcher::new(&ctx.fetch);
    if let Err(ref e) = fetcher {
        tracing::warn!("worker could not create HTTP handle: {}", e);
    }

    loop {
        if ctx.counters.is_cancelled() {
            break;
        }
        let range = match work.lock().unwrap_or_else(PoisonError::into_inner).pop_front() {
            Some(r) => r,
            None => break,
        };
        tracing::debug!("dispatch {}", range);
        let outcome = match fetcher.as_mut() {
            Ok(f) => fetch_and_write(&ctx, f, range),
            Err(e) => Err(ChunkFailure {
                kind: FailureKind::Permanent,
                attempts: 0,
                error: ChunkError::Curl(e.clone()),
            }),
        };
        if tx.send((range, outcome)).is_err() {
            break;
        }
    }
}

/// Fetch one chunk (retrying per policy) and write it at its offset.
fn fetch_and_write(
    ctx: &WorkerContext,
    fetcher: &mut ChunkFetcher,
    range: ChunkRange,
) -> Result<(), ChunkFailure> {
    let counters = &ctx.counters;
    let attempt_bytes = Cell::new(0u64);

    let result = run_with_retry(&ctx.retry, Some(counters.cancel_token()), |attempt| {
        counters.discard(&range, attempt_bytes.replace(0));
        if attempt > 1 {
            tracing::debug!(attempt, "refetch {}", range);
        }
        let mut on_bytes = |so_far: u64| {
            let delta = so_far - attempt_bytes.replace(so_far);
            counters.on_received(&range, delta, so_far);
        };
        let result = fetcher.fetch(&ctx.url, range, Some(counters.cancel_token()), &mut on_bytes)?;
        ctx.assembler.write(&result)?;
        Ok(())
    });

    match result {
        Ok(()) => {
            counters.complete(&range, attempt_bytes.get());
            Ok(())
        }
        Err(failure) => {
            counters.discard(&range, attempt_bytes.get());
            Err(failure)
        }
    }
}
