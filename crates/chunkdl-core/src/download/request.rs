//! What to download and where.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::url_model::{filename_from_url, validate_http_url, FALLBACK_FILENAME};

/// User input for one run.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Destination file, or an existing directory to place the file in.
    pub save_path: PathBuf,
    /// Replace an existing destination file.
    pub overwrite: bool,
    /// Verify the finished file against this SHA-256 (hex).
    pub expected_sha256: Option<String>,
}

impl DownloadRequest {
    /// Build a request, rejecting anything but `http`/`https` URLs.
    pub fn new(url: impl Into<String>, save_path: impl Into<PathBuf>) -> Result<Self> {
        let url = url.into();
        validate_http_url(&url)?;
        Ok(Self {
            url,
            save_path: save_path.into(),
            overwrite: false,
            expected_sha256: None,
        })
    }

    pub fn overwrite(mut self, yes: bool) -> Self {
        self.overwrite = yes;
        self
    }

    pub fn expect_sha256(mut self, hex: Option<String>) -> Self {
        self.expected_sha256 = hex;
        self
    }

    /// Final output path: `save_path`, or `save_path/<name from URL>` when
    /// `save_path` is an existing directory.
    pub fn output_path(&self) -> PathBuf {
        resolve_output_path(&self.url, &self.save_path)
    }
}

pub(crate) fn resolve_output_path(url: &str, save_path: &Path) -> PathBuf {
    if save_path.is_dir() {
        let name = filename_from_url(url).unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        save_path.join(name)
    } else {
        save_path.to_path_buf()
    }
}

/// A probed, sized download. Created once per run after the metadata probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub total_size: u64,
    pub output_path: PathBuf,
}
