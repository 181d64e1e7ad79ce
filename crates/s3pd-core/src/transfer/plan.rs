//! Chunk planning.
//!
//! Splits an object of known size into fixed-size, inclusive byte ranges.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// One planned byte range of the remote object.
///
/// Both bounds are inclusive, matching HTTP `Range: bytes=start-end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the plan (0-based, ascending start offset).
    pub index: usize,
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range.
    pub end: u64,
}

impl Chunk {
    /// Number of bytes covered by this chunk.
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// File offset this chunk is written at.
    pub const fn offset(&self) -> u64 {
        self.start
    }

    /// Value for an HTTP `Range` header.
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Partition `[0, total_size)` into chunks of `chunk_size` bytes.
///
/// The last chunk is clipped to the remaining bytes. A zero-length object
/// yields an empty plan. The same inputs always produce the same sequence.
pub fn plan_chunks(total_size: u64, chunk_size: NonZeroU64) -> Vec<Chunk> {
    let chunk_size = chunk_size.get();
    let count = total_size.div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(usize::try_from(count).unwrap_or(0));

    let mut start = 0u64;
    let mut index = 0usize;
    while start < total_size {
        let end = start.saturating_add(chunk_size).min(total_size) - 1;
        chunks.push(Chunk { index, start, end });
        start = end + 1;
        index += 1;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn nz(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    fn assert_partition(total: u64, chunk_size: u64) {
        let chunks = plan_chunks(total, nz(chunk_size));

        assert_eq!(chunks.len() as u64, total.div_ceil(chunk_size));
        if total == 0 {
            assert!(chunks.is_empty());
            return;
        }

        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().unwrap().end, total - 1);
        for (i, pair) in chunks.windows(2).enumerate() {
            assert_eq!(pair[1].start, pair[0].end + 1, "gap or overlap at {i}");
        }
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.len() >= 1);
            assert!(chunk.len() <= chunk_size);
        }
        assert_eq!(chunks.iter().map(Chunk::len).sum::<u64>(), total);
    }

    #[test]
    fn twelve_mib_in_five_mib_chunks() {
        let chunks = plan_chunks(12 * MIB, nz(5 * MIB));
        assert_eq!(
            chunks,
            vec![
                Chunk {
                    index: 0,
                    start: 0,
                    end: 5_242_879
                },
                Chunk {
                    index: 1,
                    start: 5_242_880,
                    end: 10_485_759
                },
                Chunk {
                    index: 2,
                    start: 10_485_760,
                    end: 12_582_911
                },
            ]
        );
        assert_eq!(chunks[2].len(), 2_097_152);
    }

    #[test]
    fn zero_size_yields_no_chunks() {
        assert!(plan_chunks(0, nz(5 * MIB)).is_empty());
    }

    #[test]
    fn exact_multiple_yields_full_last_chunk() {
        let chunks = plan_chunks(5 * MIB, nz(5 * MIB));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, 5 * MIB - 1);

        let chunks = plan_chunks(20, nz(5));
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].len(), 5);
    }

    #[test]
    fn chunk_larger_than_object() {
        let chunks = plan_chunks(3, nz(100));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 3);
    }

    #[test]
    fn single_byte_chunks() {
        let chunks = plan_chunks(4, nz(1));
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.start == c.end));
    }

    #[test]
    fn partition_holds_across_sizes() {
        for total in [0, 1, 2, 7, 63, 64, 65, 1000, 4096, 12_345] {
            for chunk_size in [1, 2, 3, 7, 64, 100, 4096, 1 << 20] {
                assert_partition(total, chunk_size);
            }
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let a = plan_chunks(12_582_911, nz(5 * MIB));
        let b = plan_chunks(12_582_911, nz(5 * MIB));
        assert_eq!(a, b);
    }

    #[test]
    fn huge_chunk_size_does_not_overflow() {
        let chunks = plan_chunks(u64::MAX, nz(u64::MAX));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end, u64::MAX - 1);
    }

    #[test]
    fn range_header_is_inclusive() {
        let chunk = Chunk {
            index: 1,
            start: 5_242_880,
            end: 10_485_759,
        };
        assert_eq!(chunk.range_header(), "bytes=5242880-10485759");
        assert_eq!(chunk.offset(), 5_242_880);
    }
}
