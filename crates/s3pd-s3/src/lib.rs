//! Amazon S3 adapter for s3pd.
//!
//! Implements `ObjectStorePort` over `aws-sdk-s3`: `HeadObject` answers the
//! size probe and one ranged `GetObject` serves each chunk. Works against
//! S3-compatible endpoints through `S3ClientConfig::with_endpoint_url`.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod config;
mod error;
mod store;

// ============================================================================
// Public API
// ============================================================================

pub use config::S3ClientConfig;
pub use store::S3ObjectStore;
