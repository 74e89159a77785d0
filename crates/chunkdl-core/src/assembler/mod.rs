//! Output file lifecycle and positional chunk writes.
//!
//! The output is written to `<path>.part`, preallocated to the full size
//! (posix_fallocate on Linux when available, else set_len) so concurrent
//! writes never extend the file. Each chunk lands at its own offset; on
//! success the temp file is synced and renamed onto the final path.

mod builder;
mod writer;

pub use builder::AssemblerBuilder;
pub use writer::Assembler;

/// Suffix of the in-progress output file.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
