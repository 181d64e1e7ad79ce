//! Destination path resolution.

use std::io;
use std::path::{Path, PathBuf};

use s3pd_core::{ObjectLocator, TransferError};

/// Resolve where the object will be written.
///
/// An existing directory gets the key's final segment appended. Anything
/// else (an existing file or a path that does not exist yet) is used as is;
/// an existing file is overwritten.
pub async fn resolve_destination(
    requested: &Path,
    locator: &ObjectLocator,
) -> Result<PathBuf, TransferError> {
    match tokio::fs::metadata(requested).await {
        Ok(meta) if meta.is_dir() => {
            let name = locator.base_name().ok_or_else(|| TransferError::Destination {
                path: requested.to_path_buf(),
                kind: format!("{:?}", io::ErrorKind::InvalidInput),
                message: format!("object key '{}' has no file name", locator.key()),
            })?;
            let resolved = requested.join(name);
            tracing::debug!(
                dir = %requested.display(),
                path = %resolved.display(),
                "Destination is a directory, using object name"
            );
            Ok(resolved)
        }
        Ok(_) => Ok(requested.to_path_buf()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(requested.to_path_buf()),
        Err(e) => Err(TransferError::destination(requested, &e)),
    }
}
