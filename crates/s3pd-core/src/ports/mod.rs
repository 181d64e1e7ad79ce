//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the download engine expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No SDK types in any signature
//! - Errors cross the seam as `StoreError`
//! - Observers never block the transfer

pub mod object_store;
pub mod transfer_observer;

pub use object_store::{ByteStream, ObjectStorePort};
pub use transfer_observer::{NoopObserver, TransferObserver};
