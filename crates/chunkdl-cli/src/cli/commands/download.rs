//! Run one download and print its outcome.

use anyhow::{Context, Result};
use chunkdl_core::config::DlConfig;
use chunkdl_core::download::{self, DownloadReport, DownloadRequest};
use chunkdl_core::progress::{ChannelProgress, NoProgress, ProgressSink};
use std::sync::Arc;

use super::render;
use crate::cli::Cli;

const PROGRESS_CHANNEL: usize = 64;

/// Download `cli.url` with `cfg`. Returns whether every chunk succeeded.
pub async fn run_download(cli: &Cli, cfg: DlConfig) -> Result<bool> {
    let req = DownloadRequest::new(cli.url.clone(), cli.save_path.clone())?
        .overwrite(cli.overwrite)
        .expect_sha256(cli.sha256.clone());

    let (sink, printer) = if cli.quiet {
        (Arc::new(NoProgress) as Arc<dyn ProgressSink>, None)
    } else {
        let (tx, rx) = tokio::sync::mpsc::channel(PROGRESS_CHANNEL);
        let sink = Arc::new(ChannelProgress::new(tx)) as Arc<dyn ProgressSink>;
        (sink, Some(tokio::spawn(render::print_progress(rx))))
    };

    let report = tokio::task::spawn_blocking(move || download::run_download(&req, &cfg, sink))
        .await
        .context("download task panicked")?;
    // The sink (and with it the channel sender) is gone; the printer drains and exits.
    if let Some(handle) = printer {
        let _ = handle.await;
    }

    let report = report?;
    print_report(&report);
    Ok(report.success())
}

fn print_report(report: &DownloadReport) {
    if report.success() {
        let mode = if report.single_stream {
            "single stream".to_string()
        } else {
            format!("{} chunk(s)", report.chunk_count)
        };
        println!(
            "saved {} ({} bytes, {})",
            report.output_path.display(),
            report.bytes_written,
            mode
        );
        return;
    }

    eprintln!(
        "download failed: {} of {} chunk(s) did not complete",
        report.failures.len(),
        report.chunk_count
    );
    for (range, failure) in &report.failures {
        eprintln!("  {}: {}", range, failure);
    }
    eprintln!("partial file kept at {}", report.output_path.display());
}
