//! In-memory object store for exercising the download engine.
//!
//! `InMemoryObjectStore` serves objects from memory and can be scripted to
//! misbehave per chunk index: reject the request, truncate or overrun the
//! body, break the stream midway, hang, or answer late. It also records
//! every request and the peak number of fetches in flight.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::stream;

use crate::ports::{ByteStream, ObjectStorePort};
use crate::transfer::{Chunk, ObjectLocator, StoreError};

/// Default frame size for streamed bodies.
pub const DEFAULT_FRAME_SIZE: usize = 64 * 1024;

type FetchHook = Arc<dyn Fn(&Chunk) + Send + Sync>;

/// Scripted misbehavior for one fetch of one chunk.
#[derive(Debug, Clone)]
pub enum ChunkFault {
    /// Fail the request before any body is returned.
    Reject(StoreError),
    /// Deliver only the first `n` bytes, then end the stream cleanly.
    Truncate(u64),
    /// Deliver the first `n` bytes, then yield an error.
    BreakAfter(u64, StoreError),
    /// Deliver the full range plus `n` extra bytes.
    Overrun(u64),
    /// Accept the request but never deliver anything.
    Hang,
}

/// Request counters shared with the test that owns the store.
#[derive(Debug, Default)]
pub struct StoreStats {
    head_requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<Chunk>>,
}

impl StoreStats {
    /// Number of `object_size` calls.
    pub fn head_requests(&self) -> usize {
        self.head_requests.load(Ordering::SeqCst)
    }

    /// Fetches currently between request and stream drop.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every `fetch_range` call in arrival order.
    pub fn requests(&self) -> Vec<Chunk> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `fetch_range` calls for one chunk index.
    pub fn attempts_for(&self, index: usize) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.index == index)
            .count()
    }

    fn record_request(&self, chunk: Chunk) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chunk);
    }
}

/// Tracks one fetch from request to stream drop.
struct InFlightGuard {
    stats: Arc<StoreStats>,
}

impl InFlightGuard {
    fn new(stats: Arc<StoreStats>) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { stats }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Object store backed by in-memory buffers.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: HashMap<ObjectLocator, Bytes>,
    metadata_errors: HashMap<ObjectLocator, StoreError>,
    faults: Mutex<HashMap<usize, VecDeque<ChunkFault>>>,
    delays: HashMap<usize, Duration>,
    frame_size: Option<usize>,
    fetch_hook: Option<FetchHook>,
    stats: Arc<StoreStats>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object.
    #[must_use]
    pub fn with_object(mut self, locator: ObjectLocator, data: impl Into<Bytes>) -> Self {
        self.objects.insert(locator, data.into());
        self
    }

    /// Make `object_size` fail for a locator.
    #[must_use]
    pub fn with_metadata_error(mut self, locator: ObjectLocator, error: StoreError) -> Self {
        self.metadata_errors.insert(locator, error);
        self
    }

    /// Queue a fault for the next fetch of a chunk index.
    ///
    /// Faults queued for the same index apply to successive attempts.
    #[must_use]
    pub fn with_fault(self, index: usize, fault: ChunkFault) -> Self {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(index)
            .or_default()
            .push_back(fault);
        self
    }

    /// Delay every fetch of a chunk index before the body is returned.
    #[must_use]
    pub fn with_delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// Split bodies into frames of `frame_size` bytes.
    #[must_use]
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = Some(frame_size.max(1));
        self
    }

    /// Run a callback at the start of every fetch.
    #[must_use]
    pub fn with_fetch_hook(mut self, hook: impl Fn(&Chunk) + Send + Sync + 'static) -> Self {
        self.fetch_hook = Some(Arc::new(hook));
        self
    }

    /// Shared request counters.
    pub fn stats(&self) -> Arc<StoreStats> {
        Arc::clone(&self.stats)
    }

    fn next_fault(&self, index: usize) -> Option<ChunkFault> {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&index)
            .and_then(VecDeque::pop_front)
    }

    fn frames(
        &self,
        body: &Bytes,
        trailing_error: Option<StoreError>,
        guard: InFlightGuard,
    ) -> ByteStream {
        let frame_size = self.frame_size.unwrap_or(DEFAULT_FRAME_SIZE);
        let mut items: Vec<Result<Bytes, StoreError>> = Vec::new();
        let mut offset = 0;
        while offset < body.len() {
            let end = (offset + frame_size).min(body.len());
            items.push(Ok(body.slice(offset..end)));
            offset = end;
        }
        if let Some(err) = trailing_error {
            items.push(Err(err));
        }

        Box::pin(stream::unfold(
            (items.into_iter(), guard),
            |(mut items, guard)| async move { items.next().map(|item| (item, (items, guard))) },
        ))
    }
}

#[async_trait]
impl ObjectStorePort for InMemoryObjectStore {
    async fn object_size(&self, locator: &ObjectLocator) -> Result<u64, StoreError> {
        self.stats.head_requests.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.metadata_errors.get(locator) {
            return Err(err.clone());
        }

        self.objects
            .get(locator)
            .map(|data| data.len() as u64)
            .ok_or_else(|| StoreError::not_found(locator))
    }

    async fn fetch_range(
        &self,
        locator: &ObjectLocator,
        chunk: &Chunk,
    ) -> Result<ByteStream, StoreError> {
        let guard = InFlightGuard::new(self.stats());
        self.stats.record_request(*chunk);

        if let Some(hook) = &self.fetch_hook {
            hook(chunk);
        }
        if let Some(delay) = self.delays.get(&chunk.index) {
            tokio::time::sleep(*delay).await;
        }

        let data = self
            .objects
            .get(locator)
            .ok_or_else(|| StoreError::not_found(locator))?;

        let len = data.len() as u64;
        if chunk.start >= len {
            return Err(StoreError::network_with_status(
                format!("range {} not satisfiable", chunk.range_header()),
                416,
            ));
        }
        let start = usize::try_from(chunk.start)
            .map_err(|_| StoreError::invalid_response("range start exceeds memory"))?;
        let end = usize::try_from(chunk.end.min(len - 1) + 1)
            .map_err(|_| StoreError::invalid_response("range end exceeds memory"))?;
        let body = data.slice(start..end);

        let clip = |n: u64| body.slice(..usize::try_from(n).unwrap_or(usize::MAX).min(body.len()));

        match self.next_fault(chunk.index) {
            None => Ok(self.frames(&body, None, guard)),
            Some(ChunkFault::Reject(err)) => Err(err),
            Some(ChunkFault::Truncate(n)) => Ok(self.frames(&clip(n), None, guard)),
            Some(ChunkFault::BreakAfter(n, err)) => Ok(self.frames(&clip(n), Some(err), guard)),
            Some(ChunkFault::Overrun(extra)) => {
                let mut padded = BytesMut::from(&body[..]);
                padded.resize(body.len() + usize::try_from(extra).unwrap_or(0), 0xAB);
                Ok(self.frames(&padded.freeze(), None, guard))
            }
            Some(ChunkFault::Hang) => Ok(Box::pin(stream::unfold(guard, |guard| async move {
                futures_util::future::pending::<()>().await;
                Some((Ok::<Bytes, StoreError>(Bytes::new()), guard))
            }))),
        }
    }
}

/// Deterministic test payload with no short repeating period.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn patterned_bytes(len: usize) -> Bytes {
    (0..len)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 8) ^ (i >> 16)) as u8)
        .collect::<Vec<u8>>()
        .into()
}
