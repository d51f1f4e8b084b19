use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::serde_str;

// ── Top-level config ────────────────────────────────────────────────

/// Full configuration for the scheduling engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Periodic scan cycle settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Continuous monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Batch executor knobs shared by scan and monitor collaborators.
    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ── Section configs ─────────────────────────────────────────────────

/// Scan section. The scan sub-loop only runs when `targets_file` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Newline-separated target list.
    pub targets_file: Option<PathBuf>,

    /// Time between the end of one cycle and the start of the next.
    #[serde(default = "default_cycle", with = "serde_str")]
    pub cycle: Duration,

    /// Extra attempts after a failed cycle.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between attempts of the same cycle.
    #[serde(default = "default_retry_delay", with = "serde_str")]
    pub retry_delay: Duration,

    /// Program and arguments run once per batch by the command-backed scan cycle.
    #[serde(default)]
    pub command: Vec<String>,
}

fn default_cycle() -> Duration {
    Duration::from_secs(24 * 3_600)
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(30)
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            targets_file: None,
            cycle: default_cycle(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            command: Vec::new(),
        }
    }
}

/// Monitor section. The monitor sub-loop needs `targets_file` and a monitor service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub targets_file: Option<PathBuf>,

    /// Long-lived program run by the command-backed monitor. `{targets}` is
    /// replaced by the targets file path.
    #[serde(default)]
    pub command: Vec<String>,
}

/// Batch section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    #[serde(default = "default_batch_timeout", with = "serde_str")]
    pub batch_timeout: Duration,

    /// Inputs at or below this size are processed as a single unbatched call.
    #[serde(default = "default_threshold_size")]
    pub threshold_size: usize,
}

fn default_batch_size() -> usize {
    100
}

fn default_max_concurrent_batches() -> usize {
    1
}

fn default_batch_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_threshold_size() -> usize {
    500
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
            batch_timeout: default_batch_timeout(),
            threshold_size: default_threshold_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}
