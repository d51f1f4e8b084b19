use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::BatchContext;

/// Per-batch work supplied by the caller.
///
/// Implementations may be invoked concurrently with disjoint batches; the
/// executor does not serialize access to state the processor touches. A
/// processor must keep observing `ctx` so cancellation and the batch deadline
/// can take effect.
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    async fn process(
        &self,
        ctx: BatchContext,
        batch: Vec<String>,
        index: usize,
    ) -> anyhow::Result<()>;
}

/// Adapter turning an async closure into a [`BatchProcessor`].
pub struct FnProcessor<F> {
    f: F,
}

/// Wrap an async closure as a shareable processor.
///
/// ```ignore
/// let processor = processor_fn(|ctx, batch, index| async move {
///     probe_all(ctx.token(), &batch).await
/// });
/// ```
pub fn processor_fn<F, Fut>(f: F) -> Arc<FnProcessor<F>>
where
    F: Fn(BatchContext, Vec<String>, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnProcessor { f })
}

#[async_trait]
impl<F, Fut> BatchProcessor for FnProcessor<F>
where
    F: Fn(BatchContext, Vec<String>, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn process(
        &self,
        ctx: BatchContext,
        batch: Vec<String>,
        index: usize,
    ) -> anyhow::Result<()> {
        (self.f)(ctx, batch, index).await
    }
}

/// Blanket implementation so `Arc<dyn BatchProcessor>` can be used directly.
#[async_trait]
impl<T: BatchProcessor + ?Sized> BatchProcessor for Arc<T> {
    async fn process(
        &self,
        ctx: BatchContext,
        batch: Vec<String>,
        index: usize,
    ) -> anyhow::Result<()> {
        (**self).process(ctx, batch, index).await
    }
}
