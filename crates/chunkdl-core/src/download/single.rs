//! Single-stream fallback for servers without byte-range support.

use anyhow::Result;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::{create_output, finish, DownloadReport, DownloadRequest};
use crate::config::DlConfig;
use crate::fetcher::{download_single, FetchOptions};
use crate::planner::ChunkRange;
use crate::progress::ProgressSink;
use crate::retry::run_with_retry;

/// Download the whole resource with one unranged GET (retried from the
/// start on transient errors), reported as chunk 0.
pub(super) fn run_single_stream(
    req: &DownloadRequest,
    output_path: &Path,
    expected_len: Option<u64>,
    cfg: &DlConfig,
    fetch: &FetchOptions,
    sink: Arc<dyn ProgressSink>,
) -> Result<DownloadReport> {
    let assembler = create_output(output_path, expected_len)?;
    let policy = cfg.retry.policy();
    let last_seen = Cell::new(0u64);

    let result = run_with_retry(&policy, None, |attempt| {
        if attempt > 1 {
            tracing::debug!(attempt, "restarting single-stream download");
        }
        let mut on_bytes = |so_far: u64| {
            last_seen.set(so_far);
            let total = expected_len.unwrap_or(so_far);
            sink.on_chunk_progress(0, so_far, total);
            sink.on_overall_progress(so_far, total);
        };
        download_single(&req.url, &assembler, expected_len, fetch, None, &mut on_bytes)
    });

    let mut failures = BTreeMap::new();
    let (bytes_written, total_size) = match result {
        Ok(written) => {
            // Drop any tail left by an earlier, longer attempt.
            assembler.set_len(written)?;
            (written, written)
        }
        Err(failure) => {
            tracing::warn!("single-stream download failed: {}", failure);
            let total = expected_len.unwrap_or_else(|| last_seen.get());
            let range = ChunkRange {
                index: 0,
                start: 0,
                end: total.saturating_sub(1),
            };
            failures.insert(range, failure);
            (0, total)
        }
    };

    let report = DownloadReport {
        output_path: assembler.temp_path().to_path_buf(),
        total_size,
        chunk_count: 1,
        single_stream: true,
        bytes_written,
        failures,
    };
    finish(req, assembler, output_path, report)
}
