//! [`BatchExecutor`] -- splits large inputs and runs the batches within
//! concurrency and timeout bounds.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BatchExecutionConfig;
use crate::error::BatchError;
use crate::processor::BatchProcessor;
use crate::types::{BatchContext, BatchResult, ExecutionReport};

/// Runs a [`BatchProcessor`] over an input list.
///
/// Inputs at or below `threshold_size` are handed to the processor in a single
/// call. Larger inputs are split into `batch_size` chunks and executed either
/// strictly in order (`max_concurrent_batches == 1`) or with at most
/// `max_concurrent_batches` in flight. One batch failing never stops the others.
#[derive(Debug)]
pub struct BatchExecutor {
    config: BatchExecutionConfig,
    /// One-shot stop signal, checked before every batch.
    stop: CancellationToken,
}

impl BatchExecutor {
    pub fn new(config: BatchExecutionConfig) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self {
            config,
            stop: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &BatchExecutionConfig {
        &self.config
    }

    /// Stop dispatching batches. Batches already running are not interrupted.
    pub fn stop(&self) {
        info!("Batch executor stop requested");
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Whether an input of `input_size` items is split into batches.
    pub fn should_batch(&self, input_size: usize) -> bool {
        input_size > self.config.threshold_size
    }

    /// Partition `input` into contiguous chunks of `batch_size`, the last one
    /// possibly shorter. Inputs no longer than `batch_size` come back whole.
    ///
    /// Independent of [`should_batch`](Self::should_batch).
    pub fn split(&self, input: &[String]) -> Vec<Vec<String>> {
        if input.len() <= self.config.batch_size {
            return vec![input.to_vec()];
        }
        input
            .chunks(self.config.batch_size)
            .map(<[String]>::to_vec)
            .collect()
    }

    /// Process `input` with `processor`.
    ///
    /// Unbatched inputs run once as batch 0 under `cancel` with no extra
    /// timeout; the processor's error becomes the report's error. Batched
    /// inputs record per-batch failures only inside their [`BatchResult`]s and
    /// report an error only when `cancel` or [`stop`](Self::stop) cut the run
    /// short, in which case the results attempted so far are kept. A panicking
    /// processor fails its batch like a returned error on every path.
    pub async fn execute<P>(
        &self,
        cancel: &CancellationToken,
        input: Vec<String>,
        processor: Arc<P>,
    ) -> ExecutionReport
    where
        P: BatchProcessor + ?Sized + 'static,
    {
        let started = Instant::now();

        let mut report = if !self.should_batch(input.len()) {
            debug!(items = input.len(), "input below batch threshold, processing unbatched");
            self.execute_unbatched(cancel, input, processor).await
        } else {
            let batches = self.split(&input);
            info!(
                items = input.len(),
                batches = batches.len(),
                batch_size = self.config.batch_size,
                concurrency = self.config.max_concurrent_batches,
                "processing input in batches"
            );
            if self.config.is_sequential() {
                self.execute_sequential(cancel, batches, processor).await
            } else {
                self.execute_concurrent(cancel, batches, processor).await
            }
        };
        report.elapsed = started.elapsed();

        let summary = report.summary();
        info!(
            batches = summary.total_batches,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            processed = summary.processed,
            elapsed_ms = summary.elapsed_ms,
            "batch execution finished"
        );
        if let Some(e) = &report.error {
            warn!(error = %e, "batch execution ended with error");
        }

        report
    }

    async fn execute_unbatched<P>(
        &self,
        cancel: &CancellationToken,
        input: Vec<String>,
        processor: Arc<P>,
    ) -> ExecutionReport
    where
        P: BatchProcessor + ?Sized + 'static,
    {
        let ctx = BatchContext::new(0, cancel.clone(), None);
        let count = input.len();
        let result = guarded(0, count, async move {
            BatchResult::from_outcome(0, count, processor.process(ctx, input, 0).await)
        })
        .await;
        let error = result.error.clone().map(BatchError::Callback);

        ExecutionReport {
            results: vec![result],
            total_batches: 1,
            error,
            elapsed: Default::default(),
        }
    }

    async fn execute_sequential<P>(
        &self,
        cancel: &CancellationToken,
        batches: Vec<Vec<String>>,
        processor: Arc<P>,
    ) -> ExecutionReport
    where
        P: BatchProcessor + ?Sized + 'static,
    {
        let total = batches.len();
        let mut results = Vec::with_capacity(total);
        let mut error = None;

        for (index, batch) in batches.into_iter().enumerate() {
            if let Some(e) = self.interruption(cancel, index, total) {
                error = Some(e);
                break;
            }
            let processor = Arc::clone(&processor);
            let parent = cancel.clone();
            let timeout = self.config.batch_timeout;
            let count = batch.len();
            let result = guarded(index, count, async move {
                run_batch(&*processor, &parent, batch, index, timeout).await
            })
            .await;
            log_result(&result);
            results.push(result);
        }

        ExecutionReport {
            results,
            total_batches: total,
            error,
            elapsed: Default::default(),
        }
    }

    async fn execute_concurrent<P>(
        &self,
        cancel: &CancellationToken,
        batches: Vec<Vec<String>>,
        processor: Arc<P>,
    ) -> ExecutionReport
    where
        P: BatchProcessor + ?Sized + 'static,
    {
        let total = batches.len();
        let slots: Arc<Mutex<Vec<Option<BatchResult>>>> =
            Arc::new(Mutex::new((0..total).map(|_| None).collect()));
        let gate = Arc::new(Semaphore::new(self.config.max_concurrent_batches));
        let mut handles = Vec::with_capacity(total);
        let mut error = None;

        for (index, batch) in batches.into_iter().enumerate() {
            // Waiting for a free slot is interruptible; batches already
            // admitted keep running.
            let permit = tokio::select! {
                biased;
                _ = self.stop.cancelled() => None,
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&gate).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                error = self.interruption(cancel, index, total);
                break;
            };

            let processor = Arc::clone(&processor);
            let slots = Arc::clone(&slots);
            let parent = cancel.clone();
            let timeout = self.config.batch_timeout;
            let count = batch.len();
            let handle = tokio::spawn(async move {
                let result = run_batch(&*processor, &parent, batch, index, timeout).await;
                log_result(&result);
                slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(result);
                drop(permit);
            });
            handles.push((index, count, handle));
        }

        for (index, count, handle) in handles {
            if let Err(e) = handle.await {
                warn!(batch = index, error = %e, "batch task failed to complete");
                let result = BatchResult::panicked(index, count, e.to_string());
                slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(result);
            }
        }

        let filled = std::mem::take(&mut *slots.lock().unwrap_or_else(PoisonError::into_inner));
        ExecutionReport {
            results: filled.into_iter().flatten().collect(),
            total_batches: total,
            error,
            elapsed: Default::default(),
        }
    }

    /// The error to report if the run must end before batch `index`.
    fn interruption(
        &self,
        cancel: &CancellationToken,
        index: usize,
        total: usize,
    ) -> Option<BatchError> {
        if self.stop.is_cancelled() {
            Some(BatchError::Stopped {
                completed: index,
                total,
            })
        } else if cancel.is_cancelled() {
            Some(BatchError::Cancelled {
                completed: index,
                total,
            })
        } else {
            None
        }
    }
}

/// Drive one batch on its own task so a panicking processor is recorded as a
/// failed result instead of unwinding into the caller.
async fn guarded<F>(index: usize, count: usize, batch: F) -> BatchResult
where
    F: Future<Output = BatchResult> + Send + 'static,
{
    match tokio::spawn(batch).await {
        Ok(result) => result,
        Err(e) => {
            warn!(batch = index, error = %e, "batch task failed to complete");
            BatchResult::panicked(index, count, e.to_string())
        }
    }
}

/// Run one batch under its own deadline-bound child token. The child token is
/// cancelled when the batch returns or times out.
async fn run_batch<P>(
    processor: &P,
    parent: &CancellationToken,
    batch: Vec<String>,
    index: usize,
    timeout: std::time::Duration,
) -> BatchResult
where
    P: BatchProcessor + ?Sized,
{
    let token = parent.child_token();
    let _release = token.clone().drop_guard();
    let deadline = tokio::time::Instant::now() + timeout;
    let ctx = BatchContext::new(index, token, Some(deadline));
    let count = batch.len();

    let outcome = match tokio::time::timeout_at(deadline, processor.process(ctx, batch, index)).await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(anyhow::Error::new(BatchError::TimedOut { index, timeout })),
    };
    BatchResult::from_outcome(index, count, outcome)
}

fn log_result(result: &BatchResult) {
    match &result.error {
        None => debug!(
            batch = result.batch_index,
            items = result.processed_count,
            "batch completed"
        ),
        Some(e) => warn!(
            batch = result.batch_index,
            items = result.processed_count,
            error = %e,
            "batch failed"
        ),
    }
}
