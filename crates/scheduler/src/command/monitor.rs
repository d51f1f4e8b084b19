use std::path::Path;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Context};
use async_trait::async_trait;
use recon_core::ReconConfig;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::SchedulerError;
use crate::service::MonitorService;

use super::{read_targets, split_command};

/// Placeholder in monitor arguments replaced by the targets file path.
const TARGETS_PLACEHOLDER: &str = "{targets}";

/// Monitor service that runs a long-lived external watcher.
///
/// The watcher runs until it exits on its own or the parent context is
/// cancelled, in which case it is killed.
#[derive(Debug)]
pub struct CommandMonitor {
    program: String,
    args: Vec<String>,
    parent: Mutex<Option<CancellationToken>>,
}

impl CommandMonitor {
    pub fn new(command: &[String]) -> Result<Self, SchedulerError> {
        let (program, args) = split_command("monitor.command", command)?;
        Ok(Self {
            program,
            args,
            parent: Mutex::new(None),
        })
    }

    /// Build from config. `None` when no monitor command is set.
    pub fn from_config(config: &ReconConfig) -> Result<Option<Self>, SchedulerError> {
        if config.monitor.command.is_empty() {
            return Ok(None);
        }
        Self::new(&config.monitor.command).map(Some)
    }

    fn args_for(&self, targets_file: &Path) -> Vec<String> {
        let path = targets_file.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(TARGETS_PLACEHOLDER, &path))
            .collect()
    }

    fn parent(&self) -> CancellationToken {
        self.parent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MonitorService for CommandMonitor {
    fn set_parent_context(&self, cancel: CancellationToken) {
        *self.parent.lock().unwrap_or_else(PoisonError::into_inner) = Some(cancel);
    }

    async fn load_targets(&self, targets_file: &Path) -> anyhow::Result<usize> {
        let targets = read_targets(targets_file)
            .await
            .with_context(|| format!("reading monitor targets from {}", targets_file.display()))?;
        if targets.is_empty() {
            bail!("monitor targets file {} has no targets", targets_file.display());
        }
        Ok(targets.len())
    }

    async fn load_and_monitor_from_sources(&self, targets_file: &Path) -> anyhow::Result<()> {
        let cancel = self.parent();

        let mut child = Command::new(&self.program)
            .args(self.args_for(targets_file))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn monitor command '{}'", self.program))?;
        info!(program = %self.program, pid = child.id(), "Monitor command started");

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        match status {
            Some(status) => {
                let status = status.with_context(|| format!("waiting for '{}'", self.program))?;
                if !status.success() {
                    bail!("monitor command '{}' exited with {status}", self.program);
                }
                info!(program = %self.program, "Monitor command exited");
                Ok(())
            }
            None => {
                child.kill().await.ok();
                info!(program = %self.program, "Monitor command terminated on shutdown");
                Ok(())
            }
        }
    }
}
