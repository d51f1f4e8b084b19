use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use recon_core::format_duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::service::ScanCycle;
use crate::types::SchedulerConfig;

use super::next_scan_time;

#[derive(Debug, Clone, Copy)]
pub(super) struct ScanSettings {
    pub interval: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl From<&SchedulerConfig> for ScanSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            interval: config.cycle_interval,
            retries: config.retries,
            retry_delay: config.retry_delay,
        }
    }
}

/// How one scheduled cycle ended after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CycleOutcome {
    Completed { attempts: u32 },
    Failed { attempts: u32 },
    Interrupted { attempts: u32 },
}

/// Why a sub-loop is winding down, if it is. `stop` is a child of `parent`,
/// so a cancelled parent takes precedence in the report.
pub(super) fn shutdown_reason(
    parent: &CancellationToken,
    stop: &CancellationToken,
) -> Option<&'static str> {
    if parent.is_cancelled() {
        Some("context cancelled")
    } else if stop.is_cancelled() {
        Some("stop signal")
    } else {
        None
    }
}

pub(super) async fn run_scan_loop(
    parent: CancellationToken,
    stop: CancellationToken,
    cycle: Arc<dyn ScanCycle>,
    settings: ScanSettings,
) {
    info!(
        service = cycle.name(),
        interval = %format_duration(settings.interval),
        retries = settings.retries,
        "Scan loop started"
    );

    loop {
        if let Some(reason) = shutdown_reason(&parent, &stop) {
            info!(reason, "Scan loop exiting");
            return;
        }

        let next = match next_scan_time(Utc::now(), settings.interval) {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "cannot schedule next scan, scan loop exiting");
                return;
            }
        };
        info!(next_scan = %next.to_rfc3339(), "Next scan scheduled");

        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            _ = stop.cancelled() => {
                let reason = shutdown_reason(&parent, &stop).unwrap_or("stop signal");
                info!(reason, "Scan wait interrupted, scan loop exiting");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        if let Some(reason) = shutdown_reason(&parent, &stop) {
            info!(reason, "Scan loop exiting");
            return;
        }

        match run_cycle_with_retries(&*cycle, &stop, &settings).await {
            CycleOutcome::Interrupted { attempts } => {
                debug!(attempts, "scan cycle interrupted");
            }
            CycleOutcome::Completed { attempts } | CycleOutcome::Failed { attempts } => {
                debug!(attempts, "scan cycle finished");
            }
        }
    }
}

/// Run one cycle, retrying failures up to `settings.retries` more times with a
/// flat delay. Shutdown aborts both the attempt and the delay.
pub(super) async fn run_cycle_with_retries(
    cycle: &dyn ScanCycle,
    stop: &CancellationToken,
    settings: &ScanSettings,
) -> CycleOutcome {
    let max_attempts = settings.retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let started = Instant::now();
        info!(service = cycle.name(), attempt, max_attempts, "Scan cycle starting");

        let outcome = cycle.run_cycle(stop.child_token()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                info!(service = cycle.name(), attempt, elapsed_ms, "Scan cycle completed");
                return CycleOutcome::Completed { attempts: attempt };
            }
            Err(e) if stop.is_cancelled() => {
                warn!(service = cycle.name(), attempt, error = %e, "Scan cycle interrupted by shutdown");
                return CycleOutcome::Interrupted { attempts: attempt };
            }
            Err(e) if attempt >= max_attempts => {
                error!(
                    service = cycle.name(),
                    attempts = attempt,
                    elapsed_ms,
                    error = %e,
                    "Scan cycle failed, giving up until next cycle"
                );
                return CycleOutcome::Failed { attempts: attempt };
            }
            Err(e) => {
                warn!(
                    service = cycle.name(),
                    attempt,
                    max_attempts,
                    retry_in = %format_duration(settings.retry_delay),
                    error = %e,
                    "Scan cycle failed, retrying"
                );
            }
        }

        tokio::select! {
            _ = stop.cancelled() => {
                info!(service = cycle.name(), "Retry wait interrupted by shutdown");
                return CycleOutcome::Interrupted { attempts: attempt };
            }
            _ = tokio::time::sleep(settings.retry_delay) => {}
        }
    }
}
