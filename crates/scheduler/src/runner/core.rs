use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::service::{MonitorService, ScanCycle};
use crate::types::SchedulerConfig;

/// Drives the periodic scan loop and the monitor loop for one run at a time.
///
/// Collaborators are optional: the scan loop needs a [`ScanCycle`] and scan
/// targets, the monitor loop needs a [`MonitorService`] and monitor targets.
pub struct Scheduler {
    pub(super) config: SchedulerConfig,
    pub(super) scan_cycle: Option<Arc<dyn ScanCycle>>,
    pub(super) monitor: Option<Arc<dyn MonitorService>>,
    /// Set while `start` is executing.
    running: AtomicBool,
    /// Stop signal of the current run. Replaced on every start.
    stop: Mutex<CancellationToken>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            scan_cycle: None,
            monitor: None,
            running: AtomicBool::new(false),
            stop: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_scan_cycle(mut self, cycle: Arc<dyn ScanCycle>) -> Self {
        info!(service = cycle.name(), "Registered scan cycle");
        self.scan_cycle = Some(cycle);
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn MonitorService>) -> Self {
        info!("Registered monitor service");
        self.monitor = Some(monitor);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the current run to wind down. Sub-loops observe the signal at their
    /// next wait point; `start` returns once both have exited. No effect when
    /// the scheduler is idle.
    pub fn stop(&self) {
        let stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_running() {
            debug!("stop requested while scheduler idle, ignoring");
            return;
        }
        info!("Scheduler stop requested");
        stop.cancel();
    }

    /// Claim the running flag and install a fresh stop signal tied to `parent`.
    ///
    /// Both happen under the stop lock, so a concurrent [`stop`](Self::stop)
    /// either sees the scheduler idle or cancels the new signal. Fails without
    /// side effects if already running.
    pub(super) fn try_claim(
        &self,
        parent: &CancellationToken,
    ) -> Result<(RunningGuard<'_>, CancellationToken), SchedulerError> {
        let mut stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SchedulerError::AlreadyRunning)?;
        let token = parent.child_token();
        *stop = token.clone();
        let guard = RunningGuard {
            running: &self.running,
        };
        Ok((guard, token))
    }
}

/// Clears the running flag when `start` returns, whichever way it returns.
pub(super) struct RunningGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
