//! Builder for creating and preallocating the output temp file.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::writer::Assembler;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Builder for a new output temp file. Call `preallocate` then `build` to get
/// an [`Assembler`] that supports concurrent positional writes.
pub struct AssemblerBuilder {
    file: File,
    temp_path: PathBuf,
}

impl AssemblerBuilder {
    /// Create the temp file at `temp_path`, truncating any previous content.
    pub fn create(temp_path: &Path) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        Ok(AssemblerBuilder {
            file,
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Preallocate `size` bytes. On Linux tries `posix_fallocate` for real block
    /// allocation; falls back to `set_len` on failure or other platforms.
    pub fn preallocate(&mut self, size: u64) -> Result<()> {
        #[cfg(target_os = "linux")]
        {
            if size > 0 {
                let fd = self.file.as_raw_fd();
                // SAFETY: fd is an open descriptor owned by self.file for the whole call.
                let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
                if r == 0 {
                    return Ok(());
                }
                tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
            }
        }
        self.file
            .set_len(size)
            .with_context(|| format!("failed to preallocate {} bytes", size))?;
        Ok(())
    }

    /// Finish building and return a writer that can be shared across workers.
    pub fn build(self) -> Assembler {
        Assembler::from_file_and_path(self.file, self.temp_path)
    }
}
