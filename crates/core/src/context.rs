//! Cancellable run context with an optional deadline.
//!
//! A [`CancellationToken`] alone cannot say *why* it fired. [`RunContext`]
//! records the first cause so callers can tell an operator cancel from an
//! expired deadline.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancellationToken,
    cause: Arc<OnceLock<ContextError>>,
    deadline: Option<Instant>,
}

impl RunContext {
    /// A context that only ends when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that ends after `timeout`. Must be called inside a tokio runtime.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that ends at `deadline`. Must be called inside a tokio runtime.
    pub fn with_deadline(deadline: Instant) -> Self {
        let ctx = Self {
            deadline: Some(deadline),
            ..Self::default()
        };

        let token = ctx.token.clone();
        let cause = Arc::clone(&ctx.cause);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    let _ = cause.set(ContextError::DeadlineExceeded);
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });

        ctx
    }

    /// Cancel the context. The first recorded cause wins.
    pub fn cancel(&self) {
        let _ = self.cause.set(ContextError::Cancelled);
        self.token.cancel();
    }

    /// The underlying token, for handing to collaborators.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        self.token.cancelled().await
    }

    /// `None` while running; otherwise why the context ended. A token
    /// cancelled directly through [`token`](Self::token) reports `Cancelled`.
    pub fn err(&self) -> Option<ContextError> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(self.cause.get().copied().unwrap_or(ContextError::Cancelled))
    }
}
