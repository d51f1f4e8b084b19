use std::time::Duration;

use recon_core::BatchSettings;

use crate::error::BatchError;

/// Immutable per-executor configuration.
///
/// `threshold_size` gates *whether* to batch, `batch_size` gates *how* to
/// split once batching is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutionConfig {
    /// Maximum items per batch.
    pub batch_size: usize,
    /// 1 means strictly sequential.
    pub max_concurrent_batches: usize,
    /// Wall-clock budget for each batch's processor call.
    pub batch_timeout: Duration,
    /// Inputs at or below this size bypass batching.
    pub threshold_size: usize,
}

impl BatchExecutionConfig {
    pub fn new(batch_size: usize, threshold_size: usize) -> Self {
        Self {
            batch_size,
            threshold_size,
            ..Self::default()
        }
    }

    pub fn with_max_concurrent_batches(mut self, n: usize) -> Self {
        self.max_concurrent_batches = n;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn is_sequential(&self) -> bool {
        self.max_concurrent_batches == 1
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch_size == 0 {
            return Err(BatchError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.max_concurrent_batches == 0 {
            return Err(BatchError::InvalidConfig(
                "max_concurrent_batches must be positive".into(),
            ));
        }
        if self.threshold_size == 0 {
            return Err(BatchError::InvalidConfig("threshold_size must be positive".into()));
        }
        if self.batch_timeout.is_zero() {
            return Err(BatchError::InvalidConfig("batch_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for BatchExecutionConfig {
    fn default() -> Self {
        Self::from(&BatchSettings::default())
    }
}

impl From<&BatchSettings> for BatchExecutionConfig {
    fn from(settings: &BatchSettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            max_concurrent_batches: settings.max_concurrent_batches,
            batch_timeout: settings.batch_timeout,
            threshold_size: settings.threshold_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_settings() {
        let cfg = BatchExecutionConfig::default();
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.max_concurrent_batches, 1);
        assert_eq!(cfg.threshold_size, 500);
        assert!(cfg.is_sequential());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = BatchExecutionConfig::new(10, 20)
            .with_max_concurrent_batches(4)
            .with_batch_timeout(Duration::from_secs(3));
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.threshold_size, 20);
        assert_eq!(cfg.max_concurrent_batches, 4);
        assert_eq!(cfg.batch_timeout, Duration::from_secs(3));
        assert!(!cfg.is_sequential());
    }

    #[test]
    fn zero_values_rejected() {
        assert!(BatchExecutionConfig::new(0, 10).validate().is_err());
        assert!(BatchExecutionConfig::new(10, 0).validate().is_err());
        assert!(BatchExecutionConfig::new(10, 10)
            .with_max_concurrent_batches(0)
            .validate()
            .is_err());
        assert!(BatchExecutionConfig::new(10, 10)
            .with_batch_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
