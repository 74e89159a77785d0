//! Range math and chunk planning.
//!
//! Splits a resource of known size into contiguous, non-overlapping byte
//! ranges and formats them for HTTP `Range` requests.

mod range;

pub use range::{chunk_count_for, effective_chunk_count, plan, ChunkRange};
