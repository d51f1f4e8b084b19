use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch config: {0}")]
    InvalidConfig(String),

    #[error("batch execution cancelled after {completed} of {total} batches")]
    Cancelled { completed: usize, total: usize },

    #[error("batch executor stopped after {completed} of {total} batches")]
    Stopped { completed: usize, total: usize },

    #[error("batch {index} timed out after {timeout:?}")]
    TimedOut { index: usize, timeout: Duration },

    #[error("batch {index} panicked: {message}")]
    Panicked { index: usize, message: String },

    /// Error returned by the processor for an unbatched input.
    #[error("{0}")]
    Callback(Arc<anyhow::Error>),
}

impl BatchError {
    /// True for early termination caused by the parent token or executor stop.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Stopped { .. })
    }
}
