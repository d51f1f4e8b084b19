use std::path::PathBuf;
use std::time::Duration;

use recon_core::ReconConfig;

/// Scheduler settings, already parsed and validated by the config layer.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Presence enables the scan sub-loop.
    pub scan_targets: Option<PathBuf>,
    /// Presence, together with a monitor service, enables the monitor sub-loop.
    pub monitor_targets: Option<PathBuf>,
    /// Wait between the end of one scan cycle and the start of the next.
    pub cycle_interval: Duration,
    /// Extra attempts after a failed scan cycle.
    pub retries: u32,
    /// Pause between attempts of one cycle.
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&ReconConfig::default())
    }
}

impl From<&ReconConfig> for SchedulerConfig {
    fn from(config: &ReconConfig) -> Self {
        Self {
            scan_targets: config.scan.targets_file.clone(),
            monitor_targets: config.monitor.targets_file.clone(),
            cycle_interval: config.scan.cycle,
            retries: config.scan.retries,
            retry_delay: config.scan.retry_delay,
        }
    }
}
