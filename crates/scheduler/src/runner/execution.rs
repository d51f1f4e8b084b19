use std::path::PathBuf;
use std::sync::Arc;

use recon_core::{ContextError, RunContext};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::SchedulerError;
use crate::service::{MonitorService, ScanCycle};

use super::monitor::run_monitor_loop;
use super::scan::{run_scan_loop, ScanSettings};
use super::Scheduler;

impl Scheduler {
    /// Run the scheduler until `ctx` ends or [`stop`](Self::stop) is called.
    ///
    /// Launches the scan loop when scan targets are configured and the
    /// monitor loop when both monitor targets and a monitor service are
    /// present, then blocks until every launched loop has exited.
    ///
    /// Returns `Ok` on a clean stop or plain cancellation. Configuration
    /// problems fail before anything is launched; a context that ended for
    /// any other reason (deadline) is reported as [`SchedulerError::Context`].
    pub async fn start(&self, ctx: &RunContext) -> Result<(), SchedulerError> {
        let parent = ctx.token();
        let (_running, stop) = self.try_claim(&parent)?;

        let scan = self.select_scan_cycle();
        let monitor = self.select_monitor();

        if scan.is_none() && monitor.is_none() {
            return Err(SchedulerError::NoServicesConfigured);
        }
        if scan.is_some() && self.config.cycle_interval.is_zero() {
            return Err(SchedulerError::InvalidCycleInterval(
                self.config.cycle_interval,
            ));
        }

        let mut loops = JoinSet::new();
        if let Some(cycle) = scan {
            let settings = ScanSettings::from(&self.config);
            loops.spawn(run_scan_loop(parent.clone(), stop.clone(), cycle, settings));
        }
        if let Some((targets, service)) = monitor {
            loops.spawn(run_monitor_loop(parent.clone(), stop.clone(), service, targets));
        }
        info!(loops = loops.len(), "Scheduler started");

        while let Some(joined) = loops.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "scheduler sub-loop terminated abnormally");
            }
        }

        match ctx.err() {
            Some(ContextError::DeadlineExceeded) => {
                warn!("Scheduler stopped: run deadline exceeded");
                Err(SchedulerError::Context(ContextError::DeadlineExceeded))
            }
            Some(ContextError::Cancelled) => {
                info!("Scheduler stopped: context cancelled");
                Ok(())
            }
            None => {
                info!("Scheduler stopped");
                Ok(())
            }
        }
    }

    fn select_scan_cycle(&self) -> Option<Arc<dyn ScanCycle>> {
        let targets = self.config.scan_targets.as_ref()?;
        match &self.scan_cycle {
            Some(cycle) => Some(Arc::clone(cycle)),
            None => {
                warn!(
                    targets = %targets.display(),
                    "scan targets configured but no scan cycle service registered, scan loop not started"
                );
                None
            }
        }
    }

    fn select_monitor(&self) -> Option<(PathBuf, Arc<dyn MonitorService>)> {
        let targets = self.config.monitor_targets.as_ref()?;
        match &self.monitor {
            Some(service) => Some((targets.clone(), Arc::clone(service))),
            None => {
                error!(
                    targets = %targets.display(),
                    "monitor targets configured but monitor service is missing, monitor not started"
                );
                None
            }
        }
    }
}
