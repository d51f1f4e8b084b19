//! Bounded batch execution for large target lists.
//!
//! [`BatchExecutor`] decides whether an input needs splitting, splits it into
//! contiguous batches and runs them sequentially or with a bounded number in
//! flight, returning one [`BatchResult`] per attempted batch.

pub mod config;
pub mod error;
pub mod executor;
pub mod processor;
pub mod types;

pub use config::BatchExecutionConfig;
pub use error::BatchError;
pub use executor::BatchExecutor;
pub use processor::{processor_fn, BatchProcessor, FnProcessor};
pub use types::{BatchContext, BatchResult, BatchSummary, ExecutionReport};
