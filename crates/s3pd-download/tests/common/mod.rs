//! Shared helpers for download integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use s3pd_core::test_utils::{InMemoryObjectStore, StoreStats};
use s3pd_core::{ObjectLocator, ObjectStorePort, TransferEvent, TransferObserver};

/// Observer that keeps every event it receives.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TransferEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<TransferEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Chunk indices in the order their completion was reported.
    pub fn completed_order(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TransferEvent::ChunkCompleted { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }

    /// Sum of all progress increments.
    pub fn progress_bytes(&self) -> u64 {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TransferEvent::ChunkProgress { bytes, .. } => Some(bytes),
                _ => None,
            })
            .sum()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl TransferObserver for RecordingObserver {
    fn emit(&self, event: TransferEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn locator() -> ObjectLocator {
    ObjectLocator::new("test-bucket", "datasets/archive.bin")
}

/// Wrap a configured store for the coordinator, keeping its counters.
pub fn into_port(store: InMemoryObjectStore) -> (Arc<dyn ObjectStorePort>, Arc<StoreStats>) {
    let stats = store.stats();
    (Arc::new(store), stats)
}
