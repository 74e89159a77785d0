//! Positional writer for the output temp file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fetcher::ChunkResult;

/// Shared handle to the output temp file. Cheap to clone; every write is
/// positional, so workers writing disjoint ranges need no coordination.
#[derive(Debug, Clone)]
pub struct Assembler {
    file: Arc<File>,
    temp_path: PathBuf,
}

impl Assembler {
    pub(crate) fn from_file_and_path(file: File, temp_path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            temp_path,
        }
    }

    /// Write a fetched chunk at its start offset. Overwrites, never appends:
    /// writing the same result twice leaves the same bytes.
    pub fn write(&self, result: &ChunkResult) -> io::Result<()> {
        self.write_at(result.range.start, &result.data)
    }

    /// Write `data` at `offset` without touching the file cursor.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.write_all_at(data, offset)
    }

    #[cfg(windows)]
    pub fn write_at(&self, offset: u64, mut data: &[u8]) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        let mut offset = offset;
        while !data.is_empty() {
            let n = self.file.seek_write(data, offset)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short positional write"));
            }
            data = &data[n..];
            offset += n as u64;
        }
        Ok(())
    }

    /// Cut or extend the file to `len` bytes (single-stream downloads of unknown size).
    pub fn set_len(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }

    /// Flush file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("output sync failed")?;
        Ok(())
    }

    /// Path of the in-progress temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file onto `final_path`. Consumes this handle; other
    /// clones must already be dropped for the file to close.
    pub fn finalize(self, final_path: &Path) -> Result<()> {
        let temp_path = self.temp_path.clone();
        drop(self.file);

        std::fs::rename(&temp_path, final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                final_path.display()
            )
        })?;
        Ok(())
    }
}
