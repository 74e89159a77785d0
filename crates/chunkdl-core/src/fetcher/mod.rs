//! Ranged HTTP retrieval of single chunks.
//!
//! A [`ChunkFetcher`] wraps one libcurl easy handle. Each worker thread owns
//! one fetcher and reuses it for every chunk it pulls, so the underlying
//! connection is kept alive between requests.

mod chunk;
mod response;
mod single;

use std::time::Duration;

use crate::config::DlConfig;
use crate::planner::ChunkRange;

pub use chunk::ChunkFetcher;
pub use response::{parse_content_range, parse_http_status};
pub use single::download_single;

/// A fetched chunk: its range and exactly `range.len()` bytes.
///
/// Owned by the worker that fetched it until handed to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    pub range: ChunkRange,
    pub data: Vec<u8>,
}

/// Transfer settings applied to every easy handle.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Hard wall-clock limit for one request.
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(3600),
        }
    }
}

impl FetchOptions {
    pub fn from_config(cfg: &DlConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            ..Self::default()
        }
    }

    pub(crate) fn apply(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Prefer a low-speed timeout so large chunks on slow links are not
        // killed by the wall-clock limit.
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        easy.timeout(self.timeout)?;
        Ok(())
    }
}
