//! CLI command handlers.

mod download;
mod render;

pub use download::run_download;
