//! CLI error type and process exit codes.

use s3pd_core::{StoreError, TransferError};
use thiserror::Error;

/// Exit code for a partially written destination.
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code for rejected arguments, locators or settings (`EX_USAGE`-like).
pub const EXIT_USAGE: i32 = 2;
/// Exit code for a missing remote object (`EX_NOINPUT`).
pub const EXIT_NOT_FOUND: i32 = 66;
/// Exit code for an unreachable or refusing remote (`EX_UNAVAILABLE`).
pub const EXIT_UNAVAILABLE: i32 = 69;
/// Exit code for local file failures (`EX_IOERR`).
pub const EXIT_IO: i32 = 74;

/// Errors surfaced by the `s3pd` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Io(String),

    #[error("{message}")]
    Partial {
        message: String,
        failed_indices: Vec<usize>,
    },
}

impl CliError {
    /// Process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::NotFound(_) => EXIT_NOT_FOUND,
            Self::Unavailable(_) => EXIT_UNAVAILABLE,
            Self::Io(_) => EXIT_IO,
            Self::Partial { .. } => EXIT_PARTIAL,
        }
    }
}

impl From<TransferError> for CliError {
    fn from(err: TransferError) -> Self {
        let message = err.user_message();
        match &err {
            TransferError::InvalidConfig(_) | TransferError::InvalidLocator(_) => {
                Self::Usage(message)
            }
            TransferError::Metadata {
                source: StoreError::NotFound { .. },
                ..
            } => Self::NotFound(message),
            TransferError::Metadata { .. } => Self::Unavailable(message),
            TransferError::Destination { .. } => Self::Io(message),
            TransferError::ChunksFailed { .. } => Self::Partial {
                failed_indices: err.failed_indices(),
                message,
            },
        }
    }
}
