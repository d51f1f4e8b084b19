use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::duration::{format_duration, parse_duration};
use crate::error::ConfigError;

use super::types::ReconConfig;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

impl ReconConfig {
    /// Parse config from a TOML string, apply env overrides and validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Defaults plus env overrides, for running without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// Convention: `RECON_SECTION_KEY` overrides `section.key`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RECON_SCAN_TARGETS_FILE") {
            self.scan.targets_file = Some(PathBuf::from(v));
        }
        if let Some(d) = duration_override(&lookup, "RECON_SCAN_CYCLE") {
            self.scan.cycle = d;
        }
        if let Some(n) = number_override(&lookup, "RECON_SCAN_RETRIES") {
            self.scan.retries = n;
        }
        if let Some(d) = duration_override(&lookup, "RECON_SCAN_RETRY_DELAY") {
            self.scan.retry_delay = d;
        }
        if let Some(v) = lookup("RECON_MONITOR_TARGETS_FILE") {
            self.monitor.targets_file = Some(PathBuf::from(v));
        }
        if let Some(n) = number_override(&lookup, "RECON_BATCH_SIZE") {
            self.batch.batch_size = n;
        }
        if let Some(n) = number_override(&lookup, "RECON_BATCH_MAX_CONCURRENT") {
            self.batch.max_concurrent_batches = n;
        }
        if let Some(d) = duration_override(&lookup, "RECON_BATCH_TIMEOUT") {
            self.batch.batch_timeout = d;
        }
        if let Some(n) = number_override(&lookup, "RECON_BATCH_THRESHOLD") {
            self.batch.threshold_size = n;
        }
        if let Some(v) = lookup("RECON_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        info!("Config loaded:");
        info!(
            "  scan:     targets={}, cycle={}, retries={}, retry_delay={}",
            display_path(self.scan.targets_file.as_deref()),
            format_duration(self.scan.cycle),
            self.scan.retries,
            format_duration(self.scan.retry_delay)
        );
        info!(
            "  monitor:  targets={}",
            display_path(self.monitor.targets_file.as_deref())
        );
        info!(
            "  batch:    size={}, concurrency={}, timeout={}, threshold={}",
            self.batch.batch_size,
            self.batch.max_concurrent_batches,
            format_duration(self.batch.batch_timeout),
            self.batch.threshold_size
        );
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

fn duration_override<F>(lookup: &F, key: &str) -> Option<std::time::Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let parsed = parse_duration(&raw);
    if parsed.is_none() {
        warn!(key = key, value = %raw, "ignoring unparseable duration override");
    }
    parsed
}

fn number_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!(key = key, value = %raw, "ignoring unparseable numeric override");
    }
    parsed
}
