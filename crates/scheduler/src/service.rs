//! Collaborator interfaces the scheduler drives.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One execution of the periodic scan workload.
///
/// Implementations typically read their target list and push it through a
/// [`BatchExecutor`](recon_batch::BatchExecutor). Returning an error lets the
/// scheduler retry the cycle.
#[async_trait]
pub trait ScanCycle: Send + Sync {
    async fn run_cycle(&self, cancel: CancellationToken) -> anyhow::Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "scan"
    }
}

/// Long-running change monitor. Its internal concurrency is opaque to the
/// scheduler.
#[async_trait]
pub trait MonitorService: Send + Sync {
    /// Hand over the run's cancellation token. Called before anything else.
    fn set_parent_context(&self, cancel: CancellationToken);

    /// One-time setup: load the initial targets and return how many there are.
    /// An error here counts as a monitor start-up failure.
    async fn load_targets(&self, targets_file: &Path) -> anyhow::Result<usize>;

    /// Monitor the targets until done or cancelled. May run indefinitely.
    async fn load_and_monitor_from_sources(&self, targets_file: &Path) -> anyhow::Result<()>;
}
