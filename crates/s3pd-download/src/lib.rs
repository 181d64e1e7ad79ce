//! Parallel ranged download engine for s3pd.
//!
//! Given an [`ObjectStorePort`] this crate downloads one object into one
//! local file:
//!
//! 1. resolve the destination path (directories get the key's base name)
//! 2. probe the object size
//! 3. create the file and extend it to its final length
//! 4. plan fixed-size chunks
//! 5. fetch every chunk concurrently and write it at its own offset
//! 6. wait for every chunk, then report success or every failed chunk
//!
//! # Modules
//!
//! - `coordinator` - `DownloadCoordinator` and the `run` entry point
//! - `writer` - `DestinationFile`, the pre-sized positioned writer
//! - `paths` - destination resolution
//! - `retry` - per-chunk retry policy

mod coordinator;
mod paths;
mod retry;
mod writer;

pub use coordinator::{DownloadCoordinator, LOG_TARGET, run};
pub use paths::resolve_destination;
pub use retry::{MAX_RETRY_DELAY, RetryPolicy};
pub use writer::{DestinationFile, WRITE_BUFFER_SIZE};

// Re-export core types for convenience
pub use s3pd_core::{
    Chunk, ChunkError, FailedChunk, NoopObserver, ObjectLocator, ObjectStorePort, StoreError,
    TransferConfig, TransferError, TransferEvent, TransferObserver, TransferResult,
    TransferSummary, plan_chunks,
};
