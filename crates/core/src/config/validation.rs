use crate::error::ConfigError;

use super::types::ReconConfig;

impl ReconConfig {
    /// Validate the batch knobs and command definitions.
    ///
    /// The scan cycle length is not checked here; the scheduler rejects a
    /// non-positive cycle when it starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_batch()?;
        self.validate_commands()?;
        Ok(())
    }

    fn validate_batch(&self) -> Result<(), ConfigError> {
        let batch = &self.batch;
        if batch.batch_size == 0 {
            return Err(ConfigError::invalid("batch.batch_size", "must be positive"));
        }
        if batch.max_concurrent_batches == 0 {
            return Err(ConfigError::invalid(
                "batch.max_concurrent_batches",
                "must be positive",
            ));
        }
        if batch.threshold_size == 0 {
            return Err(ConfigError::invalid("batch.threshold_size", "must be positive"));
        }
        if batch.batch_timeout.is_zero() {
            return Err(ConfigError::invalid("batch.batch_timeout", "must be non-zero"));
        }
        Ok(())
    }

    fn validate_commands(&self) -> Result<(), ConfigError> {
        if self.scan.command.first().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid("scan.command", "program name is empty"));
        }
        if self.monitor.command.first().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::invalid("monitor.command", "program name is empty"));
        }
        Ok(())
    }
}
