use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::BatchError;

// ── BatchContext ─────────────────────────────────────────────────────

/// What a processor receives alongside its batch: a token derived from the
/// caller's token and, in batched mode, the batch deadline.
#[derive(Debug, Clone)]
pub struct BatchContext {
    index: usize,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl BatchContext {
    pub(crate) fn new(index: usize, token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self {
            index,
            token,
            deadline,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// `None` for unbatched runs, which only inherit the caller's token.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the batch deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the caller cancels or the batch is released.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

// ── BatchResult ──────────────────────────────────────────────────────

/// Outcome of one processor invocation. Created when the call returns.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Position among produced batches, independent of completion order.
    pub batch_index: usize,
    pub success: bool,
    pub error: Option<Arc<anyhow::Error>>,
    /// Length of the batch handed to the processor, counted even on failure.
    pub processed_count: usize,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
}

impl BatchResult {
    pub(crate) fn from_outcome(
        batch_index: usize,
        processed_count: usize,
        outcome: anyhow::Result<()>,
    ) -> Self {
        let error = outcome.err().map(Arc::new);
        Self {
            batch_index,
            success: error.is_none(),
            error,
            processed_count,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn panicked(batch_index: usize, processed_count: usize, message: String) -> Self {
        Self::from_outcome(
            batch_index,
            processed_count,
            Err(anyhow::Error::new(BatchError::Panicked {
                index: batch_index,
                message,
            })),
        )
    }

    /// True when the processor exceeded its batch timeout.
    pub fn timed_out(&self) -> bool {
        self.error
            .as_ref()
            .and_then(|e| e.downcast_ref::<BatchError>())
            .is_some_and(|e| matches!(e, BatchError::TimedOut { .. }))
    }
}

// ── ExecutionReport ──────────────────────────────────────────────────

/// Everything one `execute` call produced.
///
/// `results` always holds a contiguous prefix of the batches in index order:
/// all of them on a full run, fewer when `error` reports an interruption.
#[derive(Debug)]
pub struct ExecutionReport {
    pub results: Vec<BatchResult>,
    pub total_batches: usize,
    pub error: Option<BatchError>,
    pub elapsed: Duration,
}

impl ExecutionReport {
    /// Every batch was attempted and no execution-level error occurred.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.results.len() == self.total_batches
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self.results.iter().filter(|r| r.success).count();
        BatchSummary {
            total_batches: self.total_batches,
            attempted: self.results.len(),
            succeeded,
            failed: self.results.len() - succeeded,
            processed: self.results.iter().map(|r| r.processed_count).sum(),
            elapsed_ms: self.elapsed.as_millis() as u64,
            interrupted: self.error.as_ref().is_some_and(BatchError::is_interruption),
        }
    }

    /// Drop partial results on error; for callers that only care about full runs.
    pub fn into_result(self) -> Result<Vec<BatchResult>, BatchError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.results),
        }
    }
}

/// Counters for logs and status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total_batches: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub processed: usize,
    pub elapsed_ms: u64,
    pub interrupted: bool,
}
