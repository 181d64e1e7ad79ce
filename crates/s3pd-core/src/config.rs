//! Transfer tuning knobs and their validation.

use std::num::NonZeroU64;
use std::time::Duration;

/// One mebibyte.
pub const MIB: u64 = 1024 * 1024;

/// Default chunk size (5 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * MIB;

/// Default number of chunks fetched at the same time.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Default delay before the first retry of a chunk.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound for `concurrency`.
pub const MAX_CONCURRENCY: usize = 1024;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES: u32 = 10;

/// Transfer settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Chunk size must be at least 1 byte")]
    ZeroChunkSize,

    #[error("Concurrency must be between 1 and {MAX_CONCURRENCY}, got {0}")]
    InvalidConcurrency(usize),

    #[error("Retries must be at most {MAX_RETRIES}, got {0}")]
    TooManyRetries(u32),
}

/// Settings for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes per chunk (must be at least 1).
    pub chunk_size: u64,
    /// Maximum number of chunks in flight.
    pub concurrency: usize,
    /// Extra attempts per chunk after a recoverable failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_base_delay: Duration,
    /// Cancel outstanding chunks as soon as one fails for good.
    pub fail_fast: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: 0,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            fail_fast: false,
        }
    }
}

impl TransferConfig {
    /// Create a config with the given chunk size and defaults elsewhere.
    #[must_use]
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            ..Default::default()
        }
    }

    /// Set the chunk size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the maximum number of chunks in flight.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the number of retries per chunk.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base retry delay.
    #[must_use]
    pub const fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Enable or disable fail-fast cancellation.
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Validate all values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }

        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }

        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::TooManyRetries(self.max_retries));
        }

        Ok(())
    }

    /// The chunk size as a planner input.
    pub fn planned_chunk_size(&self) -> Result<NonZeroU64, ConfigError> {
        NonZeroU64::new(self.chunk_size).ok_or(ConfigError::ZeroChunkSize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.chunk_size, 5_242_880);
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.max_retries, 0);
        assert!(!config.fail_fast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TransferConfig::new(1024)
            .with_concurrency(4)
            .with_max_retries(3)
            .with_retry_base_delay(Duration::from_millis(10))
            .with_fail_fast(true);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay, Duration::from_millis(10));
        assert!(config.fail_fast);
        assert_eq!(config.planned_chunk_size().unwrap().get(), 1024);
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let config = TransferConfig::new(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
        assert_eq!(config.planned_chunk_size(), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let config = TransferConfig::default().with_concurrency(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidConcurrency(0)));

        let config = TransferConfig::default().with_concurrency(MAX_CONCURRENCY + 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));

        let config = TransferConfig::default().with_concurrency(MAX_CONCURRENCY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_retries() {
        let config = TransferConfig::default().with_max_retries(MAX_RETRIES + 1);
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyRetries(MAX_RETRIES + 1))
        );
    }
}
