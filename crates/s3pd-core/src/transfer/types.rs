//! Core domain types for a transfer.
//!
//! Pure data types with no I/O dependencies.

use std::num::NonZeroU64;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::ChunkError;
use super::locator::ObjectLocator;
use super::plan::{Chunk, plan_chunks};

/// One object being materialized into one local file.
///
/// Built after the size probe, so `total_size` is always known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Remote object.
    pub locator: ObjectLocator,
    /// Resolved local file path.
    pub destination: PathBuf,
    /// Planned chunk size in bytes.
    pub chunk_size: NonZeroU64,
    /// Object length reported by the store.
    pub total_size: u64,
}

impl Transfer {
    /// The chunk plan for this transfer.
    #[must_use]
    pub fn chunks(&self) -> Vec<Chunk> {
        plan_chunks(self.total_size, self.chunk_size)
    }

    /// Number of chunks in the plan.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        usize::try_from(self.total_size.div_ceil(self.chunk_size.get())).unwrap_or(usize::MAX)
    }
}

/// Terminal result of one chunk task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOutcome {
    /// The chunk this outcome belongs to.
    pub chunk: Chunk,
    /// Bytes written to the destination by the final attempt.
    pub bytes_written: u64,
    /// Number of attempts made (1 when no retry happened).
    pub attempts: u32,
    /// Failure cause, `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ChunkError>,
}

impl ChunkOutcome {
    /// Successful outcome.
    #[must_use]
    pub const fn success(chunk: Chunk, bytes_written: u64, attempts: u32) -> Self {
        Self {
            chunk,
            bytes_written,
            attempts,
            error: None,
        }
    }

    /// Failed outcome.
    #[must_use]
    pub const fn failure(chunk: Chunk, bytes_written: u64, attempts: u32, error: ChunkError) -> Self {
        Self {
            chunk,
            bytes_written,
            attempts,
            error: Some(error),
        }
    }

    /// Whether the chunk landed completely.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Convert a failed outcome into a report entry.
    #[must_use]
    pub fn into_failed(self) -> Option<FailedChunk> {
        let error = self.error?;
        Some(FailedChunk {
            index: self.chunk.index,
            start: self.chunk.start,
            end: self.chunk.end,
            bytes_written: self.bytes_written,
            error,
        })
    }
}

/// A chunk that did not complete, as reported in a failed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedChunk {
    /// Chunk index.
    pub index: usize,
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range.
    pub end: u64,
    /// Bytes written before the failure.
    pub bytes_written: u64,
    /// What went wrong.
    pub error: ChunkError,
}

/// Report of a fully successful transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    /// Remote object.
    pub locator: ObjectLocator,
    /// Local file that now holds the object.
    pub path: PathBuf,
    /// Object length.
    pub total_size: u64,
    /// Bytes written across all chunks.
    pub bytes_written: u64,
    /// Number of chunks fetched.
    pub chunks: usize,
    /// Chunk attempts beyond the first, summed over all chunks.
    pub retries: u32,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

impl TransferSummary {
    /// Average throughput in bytes per second.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput_bps(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.bytes_written as f64 / (self.elapsed_ms as f64 / 1000.0)
    }
}
