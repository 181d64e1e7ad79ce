//! Per-chunk retry policy.

use std::time::Duration;

use s3pd_core::{ChunkError, TransferConfig};

/// Longest back-off between two attempts of one chunk.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Decides whether a failed chunk attempt is repeated and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy.
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Build from transfer settings.
    pub const fn from_config(config: &TransferConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }

    /// Maximum number of extra attempts.
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Whether attempt number `attempt` (1-based) failing with `error`
    /// should be followed by another attempt.
    pub const fn should_retry(&self, error: &ChunkError, attempt: u32) -> bool {
        attempt <= self.max_retries && error.is_recoverable()
    }

    /// Delay after failed attempt `attempt`: `base * 2^(attempt - 1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(MAX_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3pd_core::StoreError;

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(4));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_secs(10));
        assert_eq!(policy.delay_for(10), MAX_RETRY_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn retries_only_recoverable_errors_within_budget() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let transient = ChunkError::from(StoreError::network("reset"));
        let short = ChunkError::LengthMismatch {
            expected: 10,
            actual: 3,
        };
        let write = ChunkError::Write {
            kind: "StorageFull".into(),
            message: "disk full".into(),
        };

        assert!(policy.should_retry(&transient, 1));
        assert!(policy.should_retry(&short, 2));
        assert!(!policy.should_retry(&transient, 3));
        assert!(!policy.should_retry(&write, 1));
        assert!(!policy.should_retry(&ChunkError::Cancelled, 1));
    }

    #[test]
    fn default_never_retries() {
        let policy = RetryPolicy::from_config(&TransferConfig::default());
        assert_eq!(policy.max_retries(), 0);
        assert!(!policy.should_retry(&ChunkError::from(StoreError::network("x")), 1));
    }
}
