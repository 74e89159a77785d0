//! Chunk range type and planning.

use std::fmt;

/// One unit of work: the byte span `[start, end]` (inclusive) of the target.
///
/// `index` is 0-based and defines output ordering. Ordering and equality
/// compare the index first, so a `BTreeMap<ChunkRange, _>` lists chunks in
/// file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkRange {
    pub index: usize,
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ChunkRange {
    /// Number of bytes covered by this range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Ranges are never empty; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value for curl's `range` option: `start-end`.
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk {} [{}-{}]", self.index, self.start, self.end)
    }
}

/// Chunk count actually used for `total_size`: never more chunks than bytes,
/// never fewer than one.
pub fn effective_chunk_count(total_size: u64, num_chunks: usize) -> usize {
    let requested = num_chunks.max(1) as u64;
    requested.min(total_size.max(1)) as usize
}

/// Chunk count for a download: at least one per worker, and enough that no
/// chunk exceeds `max_chunk_bytes` (0 disables the cap).
pub fn chunk_count_for(total_size: u64, workers: usize, max_chunk_bytes: u64) -> usize {
    let by_workers = workers.max(1) as u64;
    let by_size = if max_chunk_bytes == 0 {
        1
    } else {
        total_size.div_ceil(max_chunk_bytes)
    };
    by_workers.max(by_size).min(usize::MAX as u64) as usize
}

/// Builds the chunk plan for `total_size` bytes split into `num_chunks` parts.
///
/// Every chunk gets `total_size / n` bytes; the last chunk also takes the
/// remainder. Returns an empty plan for a zero-length resource.
pub fn plan(total_size: u64, num_chunks: usize) -> Vec<ChunkRange> {
    if total_size == 0 {
        return Vec::new();
    }

    let count = effective_chunk_count(total_size, num_chunks) as u64;
    let base = total_size / count;

    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    for i in 0..count {
        let len = if i + 1 == count { total_size - offset } else { base };
        out.push(ChunkRange {
            index: i as usize,
            start: offset,
            end: offset + len - 1,
        });
        offset += len;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(ranges: &[ChunkRange], total: u64) {
        let mut next = 0u64;
        for (i, r) in ranges.iter().enumerate() {
            assert_eq!(r.index, i);
            assert_eq!(r.start, next, "ranges must be contiguous");
            assert!(r.end >= r.start);
            next = r.end + 1;
        }
        assert_eq!(next, total);
        assert_eq!(ranges.iter().map(ChunkRange::len).sum::<u64>(), total);
    }

    #[test]
    fn plan_ten_into_three_last_takes_remainder() {
        let r = plan(10, 3);
        assert_eq!(r.len(), 3);
        assert_eq!((r[0].start, r[0].end), (0, 2));
        assert_eq!((r[1].start, r[1].end), (3, 5));
        assert_eq!((r[2].start, r[2].end), (6, 9));
        assert_eq!(r.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![3, 3, 4]);
    }

    #[test]
    fn plan_even() {
        let r = plan(1000, 4);
        assert_eq!(r.len(), 4);
        assert_eq!((r[3].start, r[3].end), (750, 999));
        assert_partition(&r, 1000);
    }

    #[test]
    fn plan_single_chunk() {
        let r = plan(100, 1);
        assert_eq!(r, vec![ChunkRange { index: 0, start: 0, end: 99 }]);
    }

    #[test]
    fn plan_zero_size_is_empty() {
        assert!(plan(0, 1).is_empty());
        assert!(plan(0, 8).is_empty());
    }

    #[test]
    fn plan_clamps_when_more_chunks_than_bytes() {
        let r = plan(3, 8);
        assert_eq!(r.len(), 3);
        assert!(r.iter().all(|c| c.len() == 1));
        assert_partition(&r, 3);
    }

    #[test]
    fn plan_zero_chunks_treated_as_one() {
        let r = plan(42, 0);
        assert_eq!(r.len(), 1);
        assert_partition(&r, 42);
    }

    #[test]
    fn plan_partitions_across_sizes() {
        for total in [1u64, 2, 7, 10, 99, 1000, 4097, 65_537] {
            for n in 1..=17 {
                assert_partition(&plan(total, n), total);
            }
        }
    }

    #[test]
    fn chunk_count_respects_size_cap() {
        assert_eq!(chunk_count_for(1000, 4, 0), 4);
        assert_eq!(chunk_count_for(1000, 4, 100), 10);
        assert_eq!(chunk_count_for(1000, 4, 1000), 4);
        assert_eq!(chunk_count_for(0, 0, 100), 1);
    }

    #[test]
    fn range_formats() {
        let r = ChunkRange { index: 2, start: 42, end: 42 };
        assert_eq!(r.curl_range(), "42-42");
        assert_eq!(r.range_header_value(), "bytes=42-42");
        assert_eq!(r.to_string(), "chunk 2 [42-42]");
        assert_eq!(r.len(), 1);
    }
}
