//! Pre-sized destination file with positioned writes.
//!
//! One `std::fs::File` is shared by every chunk task. Writes always carry
//! their own absolute offset, so there is no shared cursor and no lock.
//! Blocking file calls run on tokio's blocking pool.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use s3pd_core::{ByteStream, Chunk, ChunkError, TransferError};

/// Incoming frames are coalesced up to this many bytes before each write.
pub const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Blocking positioned I/O on the destination.
pub(crate) trait PositionedFile: Send + Sync + fmt::Debug {
    /// Write all of `buf` starting at `offset`.
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()>;

    /// Flush data and metadata to disk.
    fn sync_all(&self) -> io::Result<()>;
}

impl PositionedFile for File {
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
        positioned_write(self, buf, offset)
    }

    fn sync_all(&self) -> io::Result<()> {
        Self::sync_all(self)
    }
}

/// The local file a transfer writes into.
#[derive(Debug, Clone)]
pub struct DestinationFile {
    path: PathBuf,
    file: Arc<dyn PositionedFile>,
    buffer_size: usize,
}

impl DestinationFile {
    /// Create (or truncate) `path` and extend it to `size` bytes.
    ///
    /// Returns only after the file has its final length, so every later
    /// positioned write lands inside it.
    pub async fn create(path: impl Into<PathBuf>, size: u64) -> Result<Self, TransferError> {
        let path = path.into();
        let open_path = path.clone();

        let file = tokio::task::spawn_blocking(move || -> io::Result<File> {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&open_path)?;
            file.set_len(size)?;
            Ok(file)
        })
        .await
        .map_err(|e| TransferError::Destination {
            path: path.clone(),
            kind: "Other".to_string(),
            message: format!("pre-size task failed: {e}"),
        })?
        .map_err(|e| TransferError::destination(&path, &e))?;

        tracing::debug!(path = %path.display(), size, "Destination pre-sized");

        Ok(Self::from_parts(path, Arc::new(file)))
    }

    /// Wrap an already sized file.
    pub(crate) fn from_parts(path: PathBuf, file: Arc<dyn PositionedFile>) -> Self {
        Self {
            path,
            file,
            buffer_size: WRITE_BUFFER_SIZE,
        }
    }

    /// Override the coalescing buffer size.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Path of the destination file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain `body` into the file at `chunk.offset()`.
    ///
    /// `on_write` is called with the size of every positioned write that
    /// succeeded. The body must contain exactly `chunk.len()` bytes: a short
    /// body fails after its bytes are written, and bytes beyond `chunk.end`
    /// are never written.
    pub async fn write_chunk<F>(
        &self,
        chunk: &Chunk,
        mut body: ByteStream,
        mut on_write: F,
    ) -> Result<u64, ChunkError>
    where
        F: FnMut(u64) + Send,
    {
        let expected = chunk.len();
        let mut written = 0u64;
        let mut buffer = BytesMut::with_capacity(self.buffer_size.min(capacity_hint(expected)));

        while let Some(frame) = body.next().await {
            let frame = frame?;
            let received = written + buffer.len() as u64 + frame.len() as u64;
            if received > expected {
                return Err(ChunkError::LengthMismatch {
                    expected,
                    actual: received,
                });
            }

            buffer.extend_from_slice(&frame);
            if buffer.len() >= self.buffer_size {
                let n = self
                    .write_at(chunk.offset() + written, buffer.split().freeze())
                    .await?;
                written += n;
                on_write(n);
            }
        }

        if !buffer.is_empty() {
            let n = self
                .write_at(chunk.offset() + written, buffer.freeze())
                .await?;
            written += n;
            on_write(n);
        }

        if written != expected {
            return Err(ChunkError::LengthMismatch {
                expected,
                actual: written,
            });
        }

        Ok(written)
    }

    /// Flush file contents to disk.
    pub async fn sync(&self) -> Result<(), TransferError> {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || file.sync_all())
            .await
            .map_err(|e| TransferError::Destination {
                path: self.path.clone(),
                kind: "Other".to_string(),
                message: format!("sync task failed: {e}"),
            })?
            .map_err(|e| TransferError::destination(&self.path, &e))
    }

    async fn write_at(&self, offset: u64, data: Bytes) -> Result<u64, ChunkError> {
        let file = Arc::clone(&self.file);
        let len = data.len() as u64;

        tokio::task::spawn_blocking(move || file.write_all_at(&data, offset))
            .await
            .map_err(|e| ChunkError::internal(format!("write task failed: {e}")))?
            .map_err(|e| ChunkError::from_io_error(&e))?;

        Ok(len)
    }
}

fn capacity_hint(expected: u64) -> usize {
    usize::try_from(expected).unwrap_or(usize::MAX)
}

#[cfg(unix)]
fn positioned_write(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    std::os::unix::fs::FileExt::write_all_at(file, buf, offset)
}

#[cfg(windows)]
fn positioned_write(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ));
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use s3pd_core::StoreError;

    fn body(frames: &[&'static str]) -> ByteStream {
        let frames: Vec<Result<Bytes, StoreError>> = frames
            .iter()
            .map(|f| Ok(Bytes::from_static(f.as_bytes())))
            .collect();
        Box::pin(stream::iter(frames))
    }

    fn chunk(index: usize, start: u64, end: u64) -> Chunk {
        Chunk { index, start, end }
    }

    #[tokio::test]
    async fn create_pre_sizes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let file = DestinationFile::create(&path, 4096).await.unwrap();

        assert_eq!(file.path(), path.as_path());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, vec![0xFF; 100]).unwrap();

        DestinationFile::create(&path, 10).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; 10]);
    }

    #[tokio::test]
    async fn create_fails_for_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");

        let err = DestinationFile::create(&path, 10).await.unwrap_err();

        match err {
            TransferError::Destination { kind, .. } => assert_eq!(kind, "NotFound"),
            other => panic!("Expected Destination error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_land_at_offsets_in_any_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let file = DestinationFile::create(&path, 9).await.unwrap();

        file.write_chunk(&chunk(2, 6, 8), body(&["ghi"]), |_| {})
            .await
            .unwrap();
        file.write_chunk(&chunk(0, 0, 2), body(&["a", "bc"]), |_| {})
            .await
            .unwrap();
        file.write_chunk(&chunk(1, 3, 5), body(&["def"]), |_| {})
            .await
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"abcdefghi");
    }

    #[tokio::test]
    async fn small_buffer_flushes_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let file = DestinationFile::create(&path, 10)
            .await
            .unwrap()
            .with_buffer_size(4);

        let mut writes = Vec::new();
        let written = file
            .write_chunk(
                &chunk(0, 0, 9),
                body(&["01", "234", "5", "6789"]),
                |n| writes.push(n),
            )
            .await
            .unwrap();

        assert_eq!(written, 10);
        assert_eq!(writes.iter().sum::<u64>(), 10);
        assert!(writes.len() > 1);
        assert_eq!(std::fs::read(&path).unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn short_body_is_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let file = DestinationFile::create(&path, 8).await.unwrap();

        let mut reported = 0;
        let err = file
            .write_chunk(&chunk(0, 0, 7), body(&["abc"]), |n| reported += n)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChunkError::LengthMismatch {
                expected: 8,
                actual: 3
            }
        );
        assert_eq!(reported, 3);
    }

    #[tokio::test]
    async fn overrun_never_writes_past_chunk_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let file = DestinationFile::create(&path, 8).await.unwrap();

        let err = file
            .write_chunk(&chunk(0, 0, 3), body(&["abcdXY"]), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ChunkError::LengthMismatch { expected: 4, .. }));
        assert_eq!(&std::fs::read(&path).unwrap()[4..], &[0u8; 4]);
    }

    #[tokio::test]
    async fn stream_error_becomes_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let file = DestinationFile::create(&path, 8).await.unwrap();

        let failing: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(StoreError::network("connection reset")),
        ]));
        let err = file
            .write_chunk(&chunk(0, 0, 7), failing, |_| {})
            .await
            .unwrap_err();

        assert!(err.is_fetch());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn failed_positioned_write_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        DestinationFile::create(&path, 8).await.unwrap();
        let read_only = File::open(&path).unwrap();
        let file = DestinationFile::from_parts(path.clone(), Arc::new(read_only));

        let mut reported = 0;
        let err = file
            .write_chunk(&chunk(0, 0, 7), body(&["abcdefgh"]), |n| reported += n)
            .await
            .unwrap_err();

        assert!(err.is_write());
        assert!(!err.is_recoverable());
        assert_eq!(reported, 0);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0u8; 8]);
    }

    #[tokio::test]
    async fn sync_succeeds_after_writes() {
        let dir = tempfile::tempdir().unwrap();
        let file = DestinationFile::create(dir.path().join("out.bin"), 2)
            .await
            .unwrap();
        file.write_chunk(&chunk(0, 0, 1), body(&["ok"]), |_| {})
            .await
            .unwrap();

        file.sync().await.unwrap();
    }
}
