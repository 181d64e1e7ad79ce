//! Transfer domain types, events, and errors.
//!
//! Pure data types for a single-object parallel download. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `locator` - `ObjectLocator` (bucket + key) and its parser
//! - `plan` - `Chunk` and the pure chunk planner
//! - `types` - `Transfer`, per-chunk outcomes and the final summary
//! - `events` - `TransferEvent` emitted while a transfer runs
//! - `errors` - store, chunk and transfer error types

pub mod errors;
pub mod events;
pub mod locator;
pub mod plan;
pub mod types;

// Re-export commonly used types
pub use errors::{ChunkError, StoreError, TransferError, TransferResult};
pub use events::TransferEvent;
pub use locator::{LocatorError, ObjectLocator};
pub use plan::{Chunk, plan_chunks};
pub use types::{ChunkOutcome, FailedChunk, Transfer, TransferSummary};
