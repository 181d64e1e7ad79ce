//! Transfer events - discriminated union for everything an observer can see.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::ChunkError;
use super::locator::ObjectLocator;

/// Single discriminated union for all transfer events.
///
/// Serialized with a `type` tag so it can be streamed as JSON lines:
///
/// ```text
/// { "type": "started", "locator": {..}, "path": "..", "total_size": 12, "chunks": 3 }
/// { "type": "chunk_progress", "index": 1, "bytes": 65536 }
/// { "type": "chunk_completed", "index": 1, "bytes_written": 5242880 }
/// { "type": "finished", "bytes_written": 12582912, "failed_chunks": 0 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    /// The destination is pre-sized and chunk tasks are about to launch.
    Started {
        /// Remote object.
        locator: ObjectLocator,
        /// Resolved destination path.
        path: PathBuf,
        /// Object length.
        total_size: u64,
        /// Number of planned chunks.
        chunks: usize,
    },

    /// Bytes of one chunk were written to disk.
    ChunkProgress {
        /// Chunk index.
        index: usize,
        /// Bytes written by this step (not cumulative).
        bytes: u64,
    },

    /// A chunk landed completely.
    ChunkCompleted {
        /// Chunk index.
        index: usize,
        /// Bytes written for this chunk.
        bytes_written: u64,
    },

    /// A chunk attempt failed and will be retried.
    ChunkRetrying {
        /// Chunk index.
        index: usize,
        /// Attempt number that just failed (1-based).
        attempt: u32,
        /// Delay before the next attempt in milliseconds.
        delay_ms: u64,
        /// Bytes the failed attempt had written; they will be rewritten.
        discarded_bytes: u64,
        /// Why the attempt failed.
        error: ChunkError,
    },

    /// A chunk failed for good.
    ChunkFailed {
        /// Chunk index.
        index: usize,
        /// Why it failed.
        error: ChunkError,
    },

    /// Every chunk task reached a terminal state.
    Finished {
        /// Bytes written across all chunks.
        bytes_written: u64,
        /// Number of chunks that failed.
        failed_chunks: usize,
    },
}

impl TransferEvent {
    /// Create a progress event.
    #[must_use]
    pub const fn progress(index: usize, bytes: u64) -> Self {
        Self::ChunkProgress { index, bytes }
    }

    /// Create a completion event.
    #[must_use]
    pub const fn completed(index: usize, bytes_written: u64) -> Self {
        Self::ChunkCompleted {
            index,
            bytes_written,
        }
    }

    /// Create a chunk failure event.
    #[must_use]
    pub const fn failed(index: usize, error: ChunkError) -> Self {
        Self::ChunkFailed { index, error }
    }

    /// Chunk index for chunk-scoped events.
    #[must_use]
    pub const fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::ChunkProgress { index, .. }
            | Self::ChunkCompleted { index, .. }
            | Self::ChunkRetrying { index, .. }
            | Self::ChunkFailed { index, .. } => Some(*index),
            Self::Started { .. } | Self::Finished { .. } => None,
        }
    }

    /// Get the event type name as a string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::ChunkProgress { .. } => "chunk_progress",
            Self::ChunkCompleted { .. } => "chunk_completed",
            Self::ChunkRetrying { .. } => "chunk_retrying",
            Self::ChunkFailed { .. } => "chunk_failed",
            Self::Finished { .. } => "finished",
        }
    }
}
