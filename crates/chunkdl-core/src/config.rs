use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per chunk (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 5,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
            ..RetryPolicy::default()
        }
    }
}

/// Global configuration loaded from `~/.config/chunkdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlConfig {
    /// Concurrent workers; `None` = number of logical CPUs.
    #[serde(default)]
    pub num_threads: Option<usize>,
    /// Cancel all in-flight chunks on the first permanent failure.
    #[serde(default)]
    pub fail_fast: bool,
    /// Upper bound on one chunk's size; more chunks are planned for large files.
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Abort a transfer slower than this many bytes/s for `low_speed_time_secs`.
    #[serde(default = "default_low_speed_limit_bytes")]
    pub low_speed_limit_bytes: u32,
    #[serde(default = "default_low_speed_time_secs")]
    pub low_speed_time_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_max_chunk_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_low_speed_limit_bytes() -> u32 {
    1024
}

fn default_low_speed_time_secs() -> u64 {
    60
}

impl Default for DlConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            fail_fast: false,
            max_chunk_bytes: default_max_chunk_bytes(),
            connect_timeout_secs: default_connect_timeout_secs(),
            low_speed_limit_bytes: default_low_speed_limit_bytes(),
            low_speed_time_secs: default_low_speed_time_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl DlConfig {
    /// Worker count: configured value or the host's logical CPU count, at least 1.
    pub fn effective_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<DlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: DlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
