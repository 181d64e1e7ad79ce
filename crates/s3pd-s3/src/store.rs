//! `ObjectStorePort` implementation backed by `aws_sdk_s3::Client`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use futures_util::stream;

use s3pd_core::{ByteStream, Chunk, ObjectLocator, ObjectStorePort, StoreError};

use crate::config::S3ClientConfig;
use crate::error::{map_get_error, map_head_error};

/// S3 (or S3-compatible) object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wrap an existing SDK client.
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS default chain plus `config` overrides.
    pub async fn connect(config: &S3ClientConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region() {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = config.profile() {
            loader = loader.profile_name(profile);
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style());
        if let Some(url) = config.endpoint_url() {
            builder = builder.endpoint_url(url);
        }

        tracing::debug!(
            region = ?shared.region(),
            endpoint = ?config.endpoint_url(),
            path_style = config.force_path_style(),
            "S3 client configured"
        );

        Self::from_client(Client::from_conf(builder.build()))
    }

    /// The underlying SDK client.
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStorePort for S3ObjectStore {
    async fn object_size(&self, locator: &ObjectLocator) -> Result<u64, StoreError> {
        let output = self
            .client
            .head_object()
            .bucket(locator.bucket())
            .key(locator.key())
            .send()
            .await
            .map_err(|e| map_head_error(locator, &e))?;

        let length = output
            .content_length()
            .ok_or_else(|| StoreError::invalid_response("HeadObject returned no Content-Length"))?;
        u64::try_from(length).map_err(|_| {
            StoreError::invalid_response(format!("HeadObject returned negative length {length}"))
        })
    }

    async fn fetch_range(
        &self,
        locator: &ObjectLocator,
        chunk: &Chunk,
    ) -> Result<ByteStream, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(locator.bucket())
            .key(locator.key())
            .range(chunk.range_header())
            .send()
            .await
            .map_err(|e| map_get_error(locator, &e))?;

        check_content_range(output.content_range(), chunk)?;

        let body = output.body;
        Ok(Box::pin(stream::unfold(body, |mut body| async move {
            body.next().await.map(|frame| {
                let frame = frame.map_err(|e| StoreError::network(format!("body read failed: {e}")));
                (frame, body)
            })
        })))
    }
}

/// Verify the store answered with the range that was asked for.
///
/// A missing `Content-Range` means the whole object came back, which is only
/// acceptable when the chunk starts at 0; the writer enforces the length.
fn check_content_range(content_range: Option<&str>, chunk: &Chunk) -> Result<(), StoreError> {
    let Some(header) = content_range else {
        if chunk.start == 0 {
            return Ok(());
        }
        return Err(StoreError::invalid_response(format!(
            "range {} was ignored by the store",
            chunk.range_header()
        )));
    };

    match parse_content_range(header) {
        Some((start, end)) if start == chunk.start && end == chunk.end => Ok(()),
        Some((start, end)) => Err(StoreError::invalid_response(format!(
            "asked for bytes {}-{}, store returned {start}-{end}",
            chunk.start, chunk.end
        ))),
        None => Err(StoreError::invalid_response(format!(
            "unparseable Content-Range '{header}'"
        ))),
    }
}

/// Parse `bytes start-end/total` (total may be `*`).
fn parse_content_range(header: &str) -> Option<(u64, u64)> {
    let spec = header.trim().strip_prefix("bytes ")?;
    let (range, _total) = spec.split_once('/')?;
    let (start, end) = range.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}
