//! Terminal progress line, fed by the core's progress channel.
//!
//! One line: overall bytes, rate, ETA, and how many chunks are finished or in
//! flight. Per-chunk events update the chunk counts; overall events trigger a
//! redraw.

use chunkdl_core::progress::{ProgressEvent, ProgressStats};
use std::collections::BTreeMap;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const PRINT_INTERVAL: Duration = Duration::from_millis(500);

/// Latest byte count per chunk index.
#[derive(Debug, Default)]
struct ChunkBoard {
    chunks: BTreeMap<usize, (u64, u64)>,
}

impl ChunkBoard {
    fn record(&mut self, index: usize, bytes_so_far: u64, chunk_total: u64) {
        self.chunks.insert(index, (bytes_so_far, chunk_total));
    }

    fn done(&self) -> usize {
        self.chunks.values().filter(|(so_far, total)| so_far >= total).count()
    }

    /// Chunks that have started receiving but are not finished.
    fn active(&self) -> usize {
        self.chunks
            .values()
            .filter(|(so_far, total)| *so_far > 0 && so_far < total)
            .count()
    }
}

/// Print progress at most every [`PRINT_INTERVAL`] (and once on completion)
/// until the sender is dropped.
pub async fn print_progress(mut rx: mpsc::Receiver<ProgressEvent>) {
    let started = Instant::now();
    let mut board = ChunkBoard::default();
    let mut last_print: Option<Instant> = None;
    let mut printed = false;

    while let Some(event) = rx.recv().await {
        let (bytes_so_far, total_bytes) = match event {
            ProgressEvent::Chunk {
                index,
                bytes_so_far,
                chunk_total,
            } => {
                board.record(index, bytes_so_far, chunk_total);
                continue;
            }
            ProgressEvent::Overall {
                bytes_so_far,
                total_bytes,
            } => (bytes_so_far, total_bytes),
        };
        let now = Instant::now();
        let due = last_print.map_or(true, |t| now.duration_since(t) >= PRINT_INTERVAL);
        if !due && bytes_so_far < total_bytes {
            continue;
        }
        let stats = ProgressStats {
            bytes_done: bytes_so_far,
            total_bytes,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };
        eprint!("\r{}", format_line(&stats, &board));
        let _ = std::io::stderr().flush();
        last_print = Some(now);
        printed = true;
    }
    if printed {
        eprintln!();
    }
}

fn format_line(stats: &ProgressStats, board: &ChunkBoard) -> String {
    let mib = |b: f64| b / 1_048_576.0;
    let eta = stats
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  chunks: {} done, {} active  ",
        mib(stats.bytes_done as f64),
        mib(stats.total_bytes as f64),
        stats.fraction() * 100.0,
        mib(stats.bytes_per_sec()),
        eta,
        board.done(),
        board.active()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_shows_sizes_percent_and_chunks() {
        let stats = ProgressStats {
            bytes_done: 1_048_576,
            total_bytes: 4 * 1_048_576,
            elapsed_secs: 1.0,
        };
        let mut board = ChunkBoard::default();
        board.record(0, 100, 100);
        board.record(1, 40, 100);
        board.record(2, 0, 100);
        let line = format_line(&stats, &board);
        assert!(line.contains("1.0 / 4.0 MiB"), "{}", line);
        assert!(line.contains("(25.0%)"), "{}", line);
        assert!(line.contains("1.00 MiB/s"), "{}", line);
        assert!(line.contains("ETA 3s"), "{}", line);
        assert!(line.contains("chunks: 1 done, 1 active"), "{}", line);
    }

    #[test]
    fn retried_chunk_goes_back_to_idle() {
        let mut board = ChunkBoard::default();
        board.record(3, 50, 100);
        assert_eq!(board.active(), 1);
        board.record(3, 0, 100);
        assert_eq!((board.done(), board.active()), (0, 0));
        board.record(3, 100, 100);
        assert_eq!((board.done(), board.active()), (1, 0));
    }

    #[test]
    fn unknown_rate_has_no_eta() {
        let stats = ProgressStats {
            bytes_done: 0,
            total_bytes: 10,
            elapsed_secs: 0.0,
        };
        assert!(format_line(&stats, &ChunkBoard::default()).contains("ETA ?"));
    }

    #[tokio::test]
    async fn printer_exits_when_sender_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(print_progress(rx));
        tx.send(ProgressEvent::Chunk {
            index: 0,
            bytes_so_far: 5,
            chunk_total: 5,
        })
        .await
        .unwrap();
        tx.send(ProgressEvent::Overall {
            bytes_so_far: 5,
            total_bytes: 5,
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
