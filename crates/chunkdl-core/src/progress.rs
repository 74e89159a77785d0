//! Progress reporting interface (bytes per chunk, bytes overall).
//!
//! Sinks are called from worker threads and must be safe to call
//! concurrently. The CLI uses [`ChannelProgress`] to forward events to a
//! single rendering task; [`ProgressStats`] turns a snapshot into rate/ETA.

use tokio::sync::mpsc;

/// Receiver of progress signals from the download workers.
pub trait ProgressSink: Send + Sync {
    /// Bytes received so far for one chunk (resets if the chunk is retried).
    fn on_chunk_progress(&self, chunk_index: usize, bytes_so_far: u64, chunk_total: u64);

    /// Bytes received so far across the whole download.
    fn on_overall_progress(&self, bytes_so_far: u64, total_bytes: u64);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_chunk_progress(&self, _: usize, _: u64, _: u64) {}
    fn on_overall_progress(&self, _: u64, _: u64) {}
}

/// One progress signal, as forwarded by [`ChannelProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Chunk {
        index: usize,
        bytes_so_far: u64,
        chunk_total: u64,
    },
    Overall {
        bytes_so_far: u64,
        total_bytes: u64,
    },
}

/// Sink that forwards events over a bounded tokio channel.
///
/// Intermediate events use `try_send` and are dropped when the consumer falls
/// behind, so workers never stall on display. Completion events (a chunk or
/// the whole download reaching its total) wait for channel space when called
/// from a plain thread, so the consumer always sees the final state.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: ProgressEvent, complete: bool) {
        // blocking_send panics inside a runtime; fall back to try_send there.
        if complete && tokio::runtime::Handle::try_current().is_err() {
            let _ = self.tx.blocking_send(event);
        } else {
            let _ = self.tx.try_send(event);
        }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_chunk_progress(&self, chunk_index: usize, bytes_so_far: u64, chunk_total: u64) {
        let event = ProgressEvent::Chunk {
            index: chunk_index,
            bytes_so_far,
            chunk_total,
        };
        self.send(event, bytes_so_far >= chunk_total);
    }

    fn on_overall_progress(&self, bytes_so_far: u64, total_bytes: u64) {
        let event = ProgressEvent::Overall {
            bytes_so_far,
            total_bytes,
        };
        self.send(event, bytes_so_far >= total_bytes);
    }
}

/// Snapshot of overall progress (CLI-friendly).
#[derive(Debug, Clone)]
pub struct ProgressStats {
    pub bytes_done: u64,
    pub total_bytes: u64,
    /// Elapsed time since download start (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if nothing has been received yet).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}
