//! Transfer error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error` or SDK errors. For I/O errors, we capture
//! the kind and message as strings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::locator::ObjectLocator;
use super::types::{FailedChunk, TransferSummary};

/// Error returned by an object store adapter.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreError {
    /// The object (or its bucket) does not exist.
    #[error("object not found: s3://{bucket}/{key}")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was queried.
        key: String,
    },

    /// Credentials were rejected or lack permission.
    #[error("access denied: {message}")]
    AccessDenied {
        /// Detailed error message.
        message: String,
    },

    /// Network/HTTP error talking to the store.
    #[error("network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The store answered but the response was unusable.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// What was wrong with the response.
        message: String,
    },
}

impl StoreError {
    /// Create a not found error for a locator.
    pub fn not_found(locator: &ObjectLocator) -> Self {
        Self::NotFound {
            bucket: locator.bucket().to_string(),
            key: locator.key().to_string(),
        }
    }

    /// Create an access denied error.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a network error with HTTP status code.
    pub fn network_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// HTTP status code attached to this error, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::AccessDenied { .. } => Some(403),
            Self::Network { status_code, .. } => *status_code,
            Self::InvalidResponse { .. } => None,
        }
    }
}

/// Why a single chunk did not land in the destination file.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChunkError {
    /// The ranged read failed (request or body stream).
    #[error("fetch failed: {message}")]
    Fetch {
        /// Detailed error message.
        message: String,
        /// HTTP status code if available.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The body did not contain exactly the requested number of bytes.
    #[error("expected {expected} bytes, received {actual}")]
    LengthMismatch {
        /// Length of the requested range.
        expected: u64,
        /// Bytes received when the mismatch was detected.
        actual: u64,
    },

    /// The positioned write failed.
    #[error("write failed ({kind}): {message}")]
    Write {
        /// The kind of I/O error (e.g., "StorageFull").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The chunk was abandoned because a sibling failed in fail-fast mode.
    #[error("cancelled")]
    Cancelled,

    /// The chunk task itself crashed.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl ChunkError {
    /// Create a write error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Write {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this is a fetch-side failure (request, status or body length).
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::LengthMismatch { .. })
    }

    /// Whether this is a write-side failure.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Whether retrying the chunk could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch { status_code, .. } => match status_code {
                Some(code) => *code >= 500 || *code == 408 || *code == 429,
                None => true,
            },
            Self::LengthMismatch { .. } => true,
            Self::Write { .. } | Self::Cancelled | Self::Internal { .. } => false,
        }
    }
}

impl From<StoreError> for ChunkError {
    fn from(err: StoreError) -> Self {
        Self::Fetch {
            status_code: err.status_code(),
            message: err.to_string(),
        }
    }
}

/// Error type for a whole transfer.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferError {
    /// Transfer settings were rejected before any work started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The object locator could not be parsed.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// The object size could not be determined.
    #[error("failed to read metadata for {locator}: {source}")]
    Metadata {
        /// The object that was probed.
        locator: ObjectLocator,
        /// Store failure.
        source: StoreError,
    },

    /// The destination could not be resolved, created, sized or synced.
    #[error("destination {} ({kind}): {message}", path.display())]
    Destination {
        /// Path that was being prepared.
        path: PathBuf,
        /// The kind of I/O error.
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// One or more chunks failed; the file is partially written.
    #[error("{} of {total_chunks} chunks failed for {}", failed.len(), path.display())]
    ChunksFailed {
        /// Destination file, left in place.
        path: PathBuf,
        /// Every failed chunk, ascending by index.
        failed: Vec<FailedChunk>,
        /// Number of chunks in the plan.
        total_chunks: usize,
        /// Bytes written by all chunks, including partial writes.
        bytes_written: u64,
    },
}

impl TransferError {
    /// Create a destination error from a `std::io::Error`.
    #[must_use]
    pub fn destination(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Destination {
            path: path.into(),
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Indices of failed chunks (empty unless `ChunksFailed`).
    #[must_use]
    pub fn failed_indices(&self) -> Vec<usize> {
        match self {
            Self::ChunksFailed { failed, .. } => failed.iter().map(|f| f.index).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the destination file may hold partially downloaded data.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::ChunksFailed { .. })
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidConfig(msg) => format!("Invalid settings: {msg}"),
            Self::InvalidLocator(msg) => format!("Invalid object locator: {msg}"),
            Self::Metadata { locator, source } => match source {
                StoreError::NotFound { .. } => format!("Object {locator} does not exist."),
                StoreError::AccessDenied { .. } => {
                    format!("Access to {locator} was denied. Check your credentials.")
                }
                other => format!("Could not read the size of {locator}: {other}"),
            },
            Self::Destination { path, message, .. } => {
                format!("Cannot write to {}: {message}", path.display())
            }
            Self::ChunksFailed {
                path,
                failed,
                total_chunks,
                ..
            } => {
                let indices: Vec<String> = failed.iter().map(|f| f.index.to_string()).collect();
                format!(
                    "{} of {total_chunks} chunks failed (indices: {}). {} is incomplete.",
                    failed.len(),
                    indices.join(", "),
                    path.display()
                )
            }
        }
    }
}

/// Result of a whole transfer.
pub type TransferResult = Result<TransferSummary, TransferError>;
