use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::service::MonitorService;

use super::scan::shutdown_reason;

/// Start the monitor once, let it run, then hold until shutdown.
///
/// A start-up failure ends only this loop.
pub(super) async fn run_monitor_loop(
    parent: CancellationToken,
    stop: CancellationToken,
    service: Arc<dyn MonitorService>,
    targets: PathBuf,
) {
    service.set_parent_context(stop.clone());

    match service.load_targets(&targets).await {
        Ok(count) => info!(targets = %targets.display(), count, "Monitor targets loaded"),
        Err(e) => {
            error!(
                targets = %targets.display(),
                error = %e,
                "Monitor start-up failed, monitor loop exiting"
            );
            return;
        }
    }

    info!(targets = %targets.display(), "Monitor service starting");
    match service.load_and_monitor_from_sources(&targets).await {
        Ok(()) => info!("Monitor service returned"),
        Err(e) => warn!(error = %e, "Monitor service returned with error"),
    }

    stop.cancelled().await;
    let reason = shutdown_reason(&parent, &stop).unwrap_or("stop signal");
    info!(reason, "Monitor loop exiting");
}
