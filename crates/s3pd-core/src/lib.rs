//! Core domain types and port definitions for s3pd.
//!
//! This crate holds everything the parallel download engine needs to talk
//! about a transfer without touching the network or the filesystem:
//!
//! - [`transfer`] - locators, chunk planning, outcomes, events and errors
//! - [`config`] - validated transfer tuning knobs
//! - [`ports`] - trait seams for the remote store and event observers
//!
//! Adapters (`s3pd-s3`) implement the ports; `s3pd-download` drives them.
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod ports;
pub mod transfer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use config::{
    ConfigError, DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, DEFAULT_RETRY_BASE_DELAY, MIB,
    TransferConfig,
};
pub use ports::{ByteStream, NoopObserver, ObjectStorePort, TransferObserver};
pub use transfer::{
    Chunk, ChunkError, ChunkOutcome, FailedChunk, LocatorError, ObjectLocator, StoreError,
    Transfer, TransferError, TransferEvent, TransferResult, TransferSummary, plan_chunks,
};
