//! Transfer observer port.
//!
//! This port lets the coordinator report progress without knowing how it is
//! rendered (progress bar, JSON lines, nothing at all).

use crate::transfer::TransferEvent;

/// Port for receiving transfer events.
///
/// Called from many chunk tasks at once, so implementations must be cheap
/// and must not block.
pub trait TransferObserver: Send + Sync {
    /// Receive one event.
    fn emit(&self, event: TransferEvent);
}

/// A no-op observer for tests and quiet runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NoopObserver {
    /// Create a new no-op observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransferObserver for NoopObserver {
    fn emit(&self, _event: TransferEvent) {
        // Intentionally do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;
    use std::sync::Arc;

    mock! {
        Observer {}

        impl TransferObserver for Observer {
            fn emit(&self, event: TransferEvent);
        }
    }

    #[test]
    fn test_noop_observer() {
        let observer: Arc<dyn TransferObserver> = Arc::new(NoopObserver::new());
        observer.emit(TransferEvent::progress(0, 42));
    }

    #[test]
    fn test_observer_through_trait_object() {
        let mut mock = MockObserver::new();
        mock.expect_emit()
            .with(eq(TransferEvent::completed(3, 128)))
            .times(1)
            .return_const(());

        let observer: Arc<dyn TransferObserver> = Arc::new(mock);
        observer.emit(TransferEvent::completed(3, 128));
    }
}
