//! Remote object locators.
//!
//! A locator names one object in a bucket-addressed store, written as
//! `s3://bucket/key`. The key may contain `/` separators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URI scheme accepted by [`ObjectLocator::parse`].
pub const S3_SCHEME: &str = "s3://";

/// Errors produced while parsing a locator string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    /// The string does not start with `s3://`.
    #[error("unsupported locator '{0}': expected s3://bucket/key")]
    UnsupportedScheme(String),

    /// No bucket between the scheme and the first `/`.
    #[error("locator '{0}' has no bucket")]
    MissingBucket(String),

    /// Nothing after the bucket.
    #[error("locator '{0}' has no object key")]
    MissingKey(String),
}

/// Bucket + key pair identifying one remote object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocator {
    bucket: String,
    key: String,
}

impl ObjectLocator {
    /// Create a locator from an already-split bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `s3://bucket/key...`.
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let rest = input
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| LocatorError::UnsupportedScheme(input.to_string()))?;

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(LocatorError::MissingBucket(input.to_string()));
        }
        if key.is_empty() {
            return Err(LocatorError::MissingKey(input.to_string()));
        }

        Ok(Self::new(bucket, key))
    }

    /// The bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Final path segment of the key, ignoring trailing slashes.
    ///
    /// Returns `None` when the key consists only of slashes.
    pub fn base_name(&self) -> Option<&str> {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{S3_SCHEME}{}/{}", self.bucket, self.key)
    }
}

impl FromStr for ObjectLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
