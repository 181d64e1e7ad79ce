//! Remote object store port.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::transfer::{Chunk, ObjectLocator, StoreError};

/// Body of a ranged read, delivered as a stream of byte frames.
pub type ByteStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// Port trait for a bucket-addressed object store.
///
/// The implementation for S3 (and S3-compatible endpoints) lives in `s3pd-s3`.
///
/// # Design
///
/// - One metadata request per `object_size` call
/// - One ranged read per `fetch_range` call, no retries at this layer
/// - The returned stream is not length-checked; the consumer enforces it
#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Total length of the object in bytes.
    async fn object_size(&self, locator: &ObjectLocator) -> Result<u64, StoreError>;

    /// Read the inclusive byte range `[chunk.start, chunk.end]`.
    ///
    /// Resolves once the store has accepted the request; the body then
    /// arrives through the stream.
    async fn fetch_range(
        &self,
        locator: &ObjectLocator,
        chunk: &Chunk,
    ) -> Result<ByteStream, StoreError>;
}
