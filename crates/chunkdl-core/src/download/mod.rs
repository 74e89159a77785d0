//! End-to-end download pipeline.
//!
//! probe → plan → preallocate `<output>.part` → scheduler → sync → verify →
//! rename. Servers without byte-range support are downloaded with one
//! unsplit request instead. On chunk failures the `.part` file is kept and
//! the failed ranges are reported.

mod request;
mod single;

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assembler::{temp_path, Assembler, AssemblerBuilder};
use crate::checksum;
use crate::config::DlConfig;
use crate::error::ChunkFailure;
use crate::fetcher::FetchOptions;
use crate::planner::{self, ChunkRange};
use crate::probe;
use crate::progress::ProgressSink;
use crate::scheduler::{self, SchedulerOptions};

pub use request::{DownloadRequest, DownloadTarget};

/// Terminal state of a run.
#[derive(Debug)]
pub struct DownloadReport {
    /// Final file on success; the partially written `.part` file otherwise.
    pub output_path: PathBuf,
    pub total_size: u64,
    pub chunk_count: usize,
    /// True when the server could not serve ranges and one GET was used.
    pub single_stream: bool,
    pub bytes_written: u64,
    /// Unresolved chunks, in index order.
    pub failures: BTreeMap<ChunkRange, ChunkFailure>,
}

impl DownloadReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run one download from start to finish.
///
/// `Err` means the run could not start or finish its file handling (probe
/// failed, destination exists, rename failed, checksum mismatch). Chunk
/// failures are not errors: they are listed in the returned report.
pub fn run_download(
    req: &DownloadRequest,
    cfg: &DlConfig,
    sink: Arc<dyn ProgressSink>,
) -> Result<DownloadReport> {
    let output_path = req.output_path();
    if output_path.exists() && !req.overwrite {
        anyhow::bail!(
            "output file already exists: {} (use --overwrite to replace)",
            output_path.display()
        );
    }

    let fetch = FetchOptions::from_config(cfg);
    let head = probe::probe(&req.url, &fetch)
        .with_context(|| format!("probe {}", req.url))?;
    tracing::info!(
        url = %req.url,
        size = ?head.content_length,
        ranges = head.accept_ranges,
        "probed"
    );

    let total_size = match head.content_length {
        Some(n) if head.accept_ranges || n == 0 => n,
        _ => {
            tracing::info!("server does not support ranged retrieval, using a single stream");
            return single::run_single_stream(req, &output_path, head.content_length, cfg, &fetch, sink);
        }
    };
    let target = DownloadTarget {
        url: req.url.clone(),
        total_size,
        output_path,
    };

    let threads = cfg.effective_threads();
    let chunk_count = planner::chunk_count_for(target.total_size, threads, cfg.max_chunk_bytes);
    let ranges = planner::plan(target.total_size, chunk_count);

    let assembler = create_output(&target.output_path, Some(target.total_size))?;
    let opts = SchedulerOptions {
        concurrency: threads,
        fail_fast: cfg.fail_fast,
        retry: cfg.retry.policy(),
        fetch,
    };
    let summary = scheduler::run(&target.url, &ranges, &assembler, &opts, sink);

    let report = DownloadReport {
        output_path: assembler.temp_path().to_path_buf(),
        total_size: target.total_size,
        chunk_count: ranges.len(),
        single_stream: false,
        bytes_written: summary.bytes_completed,
        failures: summary.failures,
    };
    finish(req, assembler, &target.output_path, report)
}

/// Create `<output>.part`, preallocated when the size is known.
fn create_output(output_path: &Path, size: Option<u64>) -> Result<Assembler> {
    let tp = temp_path(output_path);
    let mut builder = AssemblerBuilder::create(&tp)?;
    if let Some(n) = size {
        builder.preallocate(n)?;
    }
    Ok(builder.build())
}

/// Sync, verify and rename on success; keep the `.part` file on failure.
fn finish(
    req: &DownloadRequest,
    assembler: Assembler,
    output_path: &Path,
    mut report: DownloadReport,
) -> Result<DownloadReport> {
    assembler.sync()?;
    if !report.success() {
        tracing::warn!(
            failed = report.failures.len(),
            partial = %report.output_path.display(),
            "download incomplete"
        );
        return Ok(report);
    }

    if let Some(ref expected) = req.expected_sha256 {
        checksum::verify_sha256(assembler.temp_path(), expected)?;
        tracing::info!("SHA-256 verified");
    }
    assembler.finalize(output_path)?;
    report.output_path = output_path.to_path_buf();
    tracing::info!(
        bytes = report.bytes_written,
        path = %output_path.display(),
        "download complete"
    );
    Ok(report)
}
