use std::time::Duration;

use recon_batch::BatchError;
use recon_core::{ConfigError, ContextError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("no services configured: set scan targets, or monitor targets with a monitor service")]
    NoServicesConfigured,

    #[error("scan cycle interval must be positive, got {0:?}")]
    InvalidCycleInterval(Duration),

    #[error("scheduler run ended abnormally: {0}")]
    Context(#[from] ContextError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
