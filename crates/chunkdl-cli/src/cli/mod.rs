//! CLI for the chunkdl downloader.

mod commands;

use anyhow::Result;
use chunkdl_core::config::{self, DlConfig};
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Download a file over HTTP(S) in parallel byte-range chunks.
#[derive(Debug, Parser)]
#[command(name = "chunkdl")]
#[command(about = "chunkdl: parallel chunked HTTP downloader", long_about = None)]
pub struct Cli {
    /// Direct HTTP/HTTPS URL to download.
    #[arg(long)]
    pub url: String,

    /// Destination file. An existing directory gets a name derived from the URL.
    #[arg(long, value_name = "PATH")]
    pub save_path: PathBuf,

    /// Concurrent connections (default: config value, else CPU count).
    #[arg(long, value_name = "N")]
    pub num_threads: Option<NonZeroUsize>,

    /// Cancel the remaining chunks after the first unrecoverable failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Attempts per chunk, including the first.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub retry_limit: Option<u32>,

    /// Expected SHA-256 of the file (hex); the download fails on mismatch.
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<String>,

    /// Replace the destination if it already exists.
    #[arg(long)]
    pub overwrite: bool,

    /// Read settings from this file instead of ~/.config/chunkdl/config.toml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not print progress.
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// Layer command-line flags over file settings.
    pub fn apply_overrides(&self, cfg: &mut DlConfig) {
        if let Some(n) = self.num_threads {
            cfg.num_threads = Some(n.get());
        }
        if self.fail_fast {
            cfg.fail_fast = true;
        }
        if let Some(n) = self.retry_limit {
            cfg.retry.max_attempts = n;
        }
    }
}

/// Parse arguments and run the download. `Ok(false)` means some chunks failed.
pub async fn run_from_args() -> Result<bool> {
    let cli = Cli::parse();
    let mut cfg = match cli.config {
        Some(ref path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    cli.apply_overrides(&mut cfg);
    tracing::debug!("effective config: {:?}", cfg);

    commands::run_download(&cli, cfg).await
}

#[cfg(test)]
mod tests;
