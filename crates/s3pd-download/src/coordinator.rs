//! Transfer orchestration.
//!
//! The coordinator probes the object size, pre-sizes the destination and
//! plans chunks. Chunks are fed to a pool of at most `concurrency` tasks; a
//! new task is spawned only when a running one finishes. Each task fetches
//! its range and writes it at its own offset. The coordinator waits for
//! every chunk to reach a terminal state and folds the outcomes into a
//! single result.
//!
//! # Failure handling
//!
//! - Metadata failures abort before the destination is touched
//! - Chunk failures never cancel siblings unless `fail_fast` is set
//! - A panicking chunk task is reported as an internal failure for its index

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{StreamExt, stream};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use s3pd_core::{
    Chunk, ChunkError, ChunkOutcome, FailedChunk, NoopObserver, ObjectLocator, ObjectStorePort,
    Transfer, TransferConfig, TransferError, TransferEvent, TransferObserver, TransferResult,
    TransferSummary,
};

use crate::paths::resolve_destination;
use crate::retry::RetryPolicy;
use crate::writer::DestinationFile;

/// Tracing target for coordinator events.
pub const LOG_TARGET: &str = "s3pd.download";

/// Runs parallel ranged downloads against one object store.
#[derive(Clone)]
pub struct DownloadCoordinator {
    store: Arc<dyn ObjectStorePort>,
    config: TransferConfig,
    observer: Arc<dyn TransferObserver>,
}

impl DownloadCoordinator {
    /// Create a coordinator with the given store and settings.
    pub fn new(store: Arc<dyn ObjectStorePort>, config: TransferConfig) -> Self {
        Self {
            store,
            config,
            observer: Arc::new(NoopObserver::new()),
        }
    }

    /// Report events to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Active settings.
    pub const fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Parse `uri` and download it to `destination`.
    pub async fn run_uri(&self, uri: &str, destination: &Path) -> TransferResult {
        let locator = ObjectLocator::parse(uri)
            .map_err(|e| TransferError::InvalidLocator(e.to_string()))?;
        self.run(&locator, destination).await
    }

    /// Download one object into one local file.
    pub async fn run(&self, locator: &ObjectLocator, destination: &Path) -> TransferResult {
        let started = Instant::now();

        self.config
            .validate()
            .map_err(|e| TransferError::InvalidConfig(e.to_string()))?;
        let chunk_size = self
            .config
            .planned_chunk_size()
            .map_err(|e| TransferError::InvalidConfig(e.to_string()))?;

        let path = resolve_destination(destination, locator).await?;

        let total_size = self
            .store
            .object_size(locator)
            .await
            .map_err(|source| {
                tracing::warn!(
                    target: LOG_TARGET,
                    bucket = %locator.bucket(),
                    key = %locator.key(),
                    error = %source,
                    "Size probe failed"
                );
                TransferError::Metadata {
                    locator: locator.clone(),
                    source,
                }
            })?;

        let transfer = Transfer {
            locator: locator.clone(),
            destination: path,
            chunk_size,
            total_size,
        };

        let file = DestinationFile::create(&transfer.destination, total_size).await?;
        self.download_into(transfer, &file, started).await
    }

    /// Fetch every chunk of `transfer` into the pre-sized `file`.
    async fn download_into(
        &self,
        transfer: Transfer,
        file: &DestinationFile,
        started: Instant,
    ) -> TransferResult {
        let total_chunks = transfer.chunk_count();

        tracing::info!(
            target: LOG_TARGET,
            bucket = %transfer.locator.bucket(),
            key = %transfer.locator.key(),
            path = %transfer.destination.display(),
            total_size = transfer.total_size,
            chunk_size = transfer.chunk_size.get(),
            chunks = total_chunks,
            concurrency = self.config.concurrency,
            "Transfer started"
        );
        self.observer.emit(TransferEvent::Started {
            locator: transfer.locator.clone(),
            path: transfer.destination.clone(),
            total_size: transfer.total_size,
            chunks: total_chunks,
        });

        let outcomes = self
            .fan_out(&transfer.locator, file, transfer.chunks())
            .await;
        let report = Aggregate::from_outcomes(outcomes);

        if !report.failed.is_empty() {
            self.observer.emit(TransferEvent::Finished {
                bytes_written: report.bytes_written,
                failed_chunks: report.failed.len(),
            });
            tracing::warn!(
                target: LOG_TARGET,
                path = %transfer.destination.display(),
                failed = report.failed.len(),
                total_chunks,
                bytes_written = report.bytes_written,
                "Transfer failed; partial file left in place"
            );
            return Err(TransferError::ChunksFailed {
                path: transfer.destination,
                failed: report.failed,
                total_chunks,
                bytes_written: report.bytes_written,
            });
        }

        if let Err(err) = file.sync().await {
            tracing::warn!(
                target: LOG_TARGET,
                path = %transfer.destination.display(),
                error = %err,
                "Destination sync failed"
            );
            return Err(err);
        }

        self.observer.emit(TransferEvent::Finished {
            bytes_written: report.bytes_written,
            failed_chunks: 0,
        });

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            target: LOG_TARGET,
            path = %transfer.destination.display(),
            bytes = report.bytes_written,
            retries = report.retries,
            elapsed_ms,
            "Transfer completed"
        );

        Ok(TransferSummary {
            locator: transfer.locator,
            path: transfer.destination,
            total_size: transfer.total_size,
            bytes_written: report.bytes_written,
            chunks: total_chunks,
            retries: report.retries,
            elapsed_ms,
        })
    }

    /// Run every chunk through a pool of at most `concurrency` tasks.
    ///
    /// A chunk's task is spawned only when a pool slot frees up. Outcomes
    /// are returned in chunk order.
    async fn fan_out(
        &self,
        locator: &ObjectLocator,
        file: &DestinationFile,
        chunks: Vec<Chunk>,
    ) -> Vec<ChunkOutcome> {
        let cancel = CancellationToken::new();
        let retry = RetryPolicy::from_config(&self.config);

        let mut outcomes: Vec<ChunkOutcome> = stream::iter(chunks)
            .map(|chunk| {
                let task = ChunkTask {
                    store: Arc::clone(&self.store),
                    locator: locator.clone(),
                    file: file.clone(),
                    observer: Arc::clone(&self.observer),
                    cancel: cancel.clone(),
                    retry,
                    fail_fast: self.config.fail_fast,
                };
                let handle = tokio::spawn(task.run(chunk));
                async move { (chunk, handle.await) }
            })
            .buffer_unordered(self.config.concurrency)
            .map(|(chunk, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => self.crashed(chunk, &e, &cancel),
            })
            .collect()
            .await;

        outcomes.sort_by_key(|outcome| outcome.chunk.index);
        outcomes
    }

    /// Outcome for a chunk whose task panicked or was aborted.
    fn crashed(&self, chunk: Chunk, err: &JoinError, cancel: &CancellationToken) -> ChunkOutcome {
        tracing::error!(
            target: LOG_TARGET,
            index = chunk.index,
            error = %err,
            "Chunk task crashed"
        );
        if self.config.fail_fast {
            cancel.cancel();
        }
        let error = ChunkError::internal(format!("chunk task crashed: {err}"));
        self.observer
            .emit(TransferEvent::failed(chunk.index, error.clone()));
        ChunkOutcome::failure(chunk, 0, 1, error)
    }
}

/// Download `locator` into `destination` with default settings apart from
/// `chunk_size`.
pub async fn run(
    store: Arc<dyn ObjectStorePort>,
    locator: &ObjectLocator,
    destination: &Path,
    chunk_size: u64,
) -> TransferResult {
    DownloadCoordinator::new(store, TransferConfig::new(chunk_size))
        .run(locator, destination)
        .await
}

/// Everything one chunk task needs, owned so the task is `'static`.
struct ChunkTask {
    store: Arc<dyn ObjectStorePort>,
    locator: ObjectLocator,
    file: DestinationFile,
    observer: Arc<dyn TransferObserver>,
    cancel: CancellationToken,
    retry: RetryPolicy,
    fail_fast: bool,
}

impl ChunkTask {
    async fn run(self, chunk: Chunk) -> ChunkOutcome {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let mut written = 0u64;

            let result = tokio::select! {
                biased;

                () = self.cancel.cancelled() => Err(ChunkError::Cancelled),

                result = self.attempt(&chunk, &mut written) => result,
            };

            match result {
                Ok(bytes) => {
                    tracing::debug!(
                        target: LOG_TARGET,
                        index = chunk.index,
                        bytes,
                        attempt,
                        "Chunk completed"
                    );
                    self.observer
                        .emit(TransferEvent::completed(chunk.index, bytes));
                    return ChunkOutcome::success(chunk, bytes, attempt);
                }
                Err(error) if self.retry.should_retry(&error, attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(
                        target: LOG_TARGET,
                        index = chunk.index,
                        attempt,
                        delay_ms,
                        error = %error,
                        "Chunk attempt failed, retrying"
                    );
                    self.observer.emit(TransferEvent::ChunkRetrying {
                        index: chunk.index,
                        attempt,
                        delay_ms,
                        discarded_bytes: written,
                        error,
                    });

                    tokio::select! {
                        biased;

                        () = self.cancel.cancelled() => {
                            return self.fail(chunk, written, attempt, ChunkError::Cancelled);
                        }

                        () = tokio::time::sleep(delay) => {}
                    }
                }
                Err(error) => return self.fail(chunk, written, attempt, error),
            }
        }
    }

    /// One fetch-and-write pass over the chunk's range.
    ///
    /// `written` tracks bytes that reached the file, even when the attempt
    /// fails or is cancelled midway.
    async fn attempt(&self, chunk: &Chunk, written: &mut u64) -> Result<u64, ChunkError> {
        tracing::debug!(
            target: LOG_TARGET,
            index = chunk.index,
            range = %chunk.range_header(),
            "Fetching chunk"
        );

        let body = self.store.fetch_range(&self.locator, chunk).await?;

        let observer = &self.observer;
        let index = chunk.index;
        self.file
            .write_chunk(chunk, body, |n| {
                *written += n;
                observer.emit(TransferEvent::progress(index, n));
            })
            .await
    }

    fn fail(&self, chunk: Chunk, written: u64, attempt: u32, error: ChunkError) -> ChunkOutcome {
        if matches!(error, ChunkError::Cancelled) {
            tracing::debug!(target: LOG_TARGET, index = chunk.index, "Chunk cancelled");
        } else {
            if error.is_write() {
                tracing::error!(
                    target: LOG_TARGET,
                    index = chunk.index,
                    offset = chunk.offset(),
                    error = %error,
                    "Destination write failed"
                );
            }
            tracing::warn!(
                target: LOG_TARGET,
                index = chunk.index,
                attempt,
                bytes_written = written,
                error = %error,
                "Chunk failed"
            );
            if self.fail_fast {
                self.cancel.cancel();
            }
        }

        self.observer
            .emit(TransferEvent::failed(chunk.index, error.clone()));
        ChunkOutcome::failure(chunk, written, attempt, error)
    }
}

/// Folded view of all chunk outcomes.
struct Aggregate {
    bytes_written: u64,
    retries: u32,
    failed: Vec<FailedChunk>,
}

impl Aggregate {
    fn from_outcomes(outcomes: Vec<ChunkOutcome>) -> Self {
        let bytes_written = outcomes.iter().map(|o| o.bytes_written).sum();
        let retries = outcomes
            .iter()
            .map(|o| o.attempts.saturating_sub(1))
            .fold(0u32, u32::saturating_add);
        let failed = outcomes
            .into_iter()
            .filter_map(ChunkOutcome::into_failed)
            .collect();

        Self {
            bytes_written,
            retries,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::num::NonZeroU64;
    use std::ops::Range;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    use s3pd_core::test_utils::{InMemoryObjectStore, patterned_bytes};

    use crate::writer::PositionedFile;

    /// Real file that refuses writes starting inside `refused`.
    #[derive(Debug)]
    struct RefusingFile {
        inner: File,
        refused: Range<u64>,
        refuse_sync: bool,
    }

    impl RefusingFile {
        fn create(path: &Path, size: u64) -> Self {
            let inner = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .unwrap();
            inner.set_len(size).unwrap();
            Self {
                inner,
                refused: 0..0,
                refuse_sync: false,
            }
        }
    }

    impl PositionedFile for RefusingFile {
        fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
            if self.refused.contains(&offset) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "write refused",
                ));
            }
            PositionedFile::write_all_at(&self.inner, buf, offset)
        }

        fn sync_all(&self) -> io::Result<()> {
            if self.refuse_sync {
                return Err(io::Error::other("sync refused"));
            }
            PositionedFile::sync_all(&self.inner)
        }
    }

    #[derive(Default)]
    struct EventLog(Mutex<Vec<TransferEvent>>);

    impl TransferObserver for EventLog {
        fn emit(&self, event: TransferEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn locator() -> ObjectLocator {
        ObjectLocator::new("bucket", "blob.bin")
    }

    fn transfer(path: &Path, chunk_size: u64, total_size: u64) -> Transfer {
        Transfer {
            locator: locator(),
            destination: PathBuf::from(path),
            chunk_size: NonZeroU64::new(chunk_size).unwrap(),
            total_size,
        }
    }

    #[tokio::test]
    async fn write_failure_is_not_retried_and_siblings_land() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let data = patterned_bytes(300);
        let store = InMemoryObjectStore::new().with_object(locator(), data.clone());
        let stats = store.stats();
        let mut sink = RefusingFile::create(&path, 300);
        sink.refused = 100..200;
        let file = DestinationFile::from_parts(path.clone(), Arc::new(sink));
        let config = TransferConfig::new(100)
            .with_max_retries(3)
            .with_retry_base_delay(Duration::from_millis(1));

        let err = DownloadCoordinator::new(Arc::new(store), config)
            .download_into(transfer(&path, 100, 300), &file, Instant::now())
            .await
            .unwrap_err();

        match err {
            TransferError::ChunksFailed {
                failed,
                total_chunks,
                ..
            } => {
                assert_eq!(total_chunks, 3);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].index, 1);
                assert!(failed[0].error.is_write());
                assert_eq!(failed[0].bytes_written, 0);
            }
            other => panic!("Expected ChunksFailed, got {other:?}"),
        }
        assert_eq!(stats.attempts_for(1), 1);

        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[..100], &data[..100]);
        assert_eq!(&written[100..200], &[0u8; 100][..]);
        assert_eq!(&written[200..], &data[200..]);
    }

    #[tokio::test]
    async fn sync_failure_is_destination_error_without_finished_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let store = InMemoryObjectStore::new().with_object(locator(), patterned_bytes(50));
        let mut sink = RefusingFile::create(&path, 50);
        sink.refuse_sync = true;
        let file = DestinationFile::from_parts(path.clone(), Arc::new(sink));
        let events = Arc::new(EventLog::default());

        let err = DownloadCoordinator::new(Arc::new(store), TransferConfig::new(20))
            .with_observer(events.clone())
            .download_into(transfer(&path, 20, 50), &file, Instant::now())
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::Destination { .. }));
        let events = events.0.lock().unwrap();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, TransferEvent::ChunkCompleted { .. }))
                .count(),
            3
        );
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, TransferEvent::Finished { .. }))
        );
    }

    fn chunk(index: usize) -> Chunk {
        let start = index as u64 * 10;
        Chunk {
            index,
            start,
            end: start + 9,
        }
    }

    #[test]
    fn aggregate_all_success() {
        let report = Aggregate::from_outcomes(vec![
            ChunkOutcome::success(chunk(0), 10, 1),
            ChunkOutcome::success(chunk(1), 10, 3),
        ]);
        assert_eq!(report.bytes_written, 20);
        assert_eq!(report.retries, 2);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn aggregate_keeps_every_failure_in_order() {
        let report = Aggregate::from_outcomes(vec![
            ChunkOutcome::failure(chunk(0), 4, 1, ChunkError::Cancelled),
            ChunkOutcome::success(chunk(1), 10, 1),
            ChunkOutcome::failure(
                chunk(2),
                0,
                1,
                ChunkError::internal("chunk task crashed"),
            ),
        ]);
        assert_eq!(report.bytes_written, 14);
        let indices: Vec<usize> = report.failed.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(report.failed[0].bytes_written, 4);
    }

    #[test]
    fn aggregate_empty_plan() {
        let report = Aggregate::from_outcomes(Vec::new());
        assert_eq!(report.bytes_written, 0);
        assert_eq!(report.retries, 0);
        assert!(report.failed.is_empty());
    }
}
