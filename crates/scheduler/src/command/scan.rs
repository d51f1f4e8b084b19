use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use recon_batch::{BatchContext, BatchExecutionConfig, BatchExecutor, BatchProcessor};
use recon_core::ReconConfig;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::service::ScanCycle;

use super::{read_targets, split_command};

/// Longest stderr excerpt carried into a batch error.
const STDERR_EXCERPT: usize = 512;

/// Runs one program per batch with the batch's targets on stdin, one per line.
///
/// The program's stdout is passed through. A non-zero exit fails the batch.
/// The child is killed if the batch is cancelled or times out.
#[derive(Debug, Clone)]
pub struct CommandBatchProcessor {
    program: String,
    args: Vec<String>,
}

impl CommandBatchProcessor {
    pub fn new(command: &[String]) -> Result<Self, SchedulerError> {
        let (program, args) = split_command("scan.command", command)?;
        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl BatchProcessor for CommandBatchProcessor {
    async fn process(&self, ctx: BatchContext, batch: Vec<String>, index: usize) -> anyhow::Result<()> {
        debug!(program = %self.program, batch = index, items = batch.len(), "spawning scan command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn '{}' for batch {index}", self.program))?;

        let mut payload = batch.join("\n");
        payload.push('\n');
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(payload.as_bytes()).await {
                // The program may legitimately exit without reading its input.
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        // Feeding stdin and waiting run together so neither blocks the other,
        // and both stay inside the cancellation race. Dropping the child on
        // cancellation kills it.
        let run = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            fed.with_context(|| format!("writing targets for batch {index}"))?;
            output.with_context(|| format!("waiting for '{}' in batch {index}", self.program))
        };
        let output = tokio::select! {
            output = run => output?,
            _ = ctx.cancelled() => bail!("batch {index} cancelled while '{}' was running", self.program),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            if excerpt.is_empty() {
                bail!("'{}' exited with {} for batch {index}", self.program, output.status);
            }
            bail!(
                "'{}' exited with {} for batch {index}: {excerpt}",
                self.program,
                output.status
            );
        }
        Ok(())
    }
}

/// Scan cycle that reads the scan targets file and pushes it through a
/// [`BatchExecutor`] with a [`CommandBatchProcessor`].
///
/// A cycle fails, and so becomes eligible for retry, when the target file
/// cannot be read, when the run is cut short, or when every attempted batch
/// failed. Partial batch failures are logged and the cycle counts as done.
#[derive(Debug)]
pub struct CommandScanCycle {
    targets_file: PathBuf,
    executor: BatchExecutor,
    processor: Arc<CommandBatchProcessor>,
}

impl CommandScanCycle {
    pub fn new(
        targets_file: impl Into<PathBuf>,
        command: &[String],
        batch: BatchExecutionConfig,
    ) -> Result<Self, SchedulerError> {
        Ok(Self {
            targets_file: targets_file.into(),
            executor: BatchExecutor::new(batch)?,
            processor: Arc::new(CommandBatchProcessor::new(command)?),
        })
    }

    /// Build from config. `None` when no scan targets file or command is set.
    pub fn from_config(config: &ReconConfig) -> Result<Option<Self>, SchedulerError> {
        let Some(targets) = &config.scan.targets_file else {
            return Ok(None);
        };
        if config.scan.command.is_empty() {
            return Ok(None);
        }
        let batch = BatchExecutionConfig::from(&config.batch);
        Self::new(targets.clone(), &config.scan.command, batch).map(Some)
    }

    pub fn executor(&self) -> &BatchExecutor {
        &self.executor
    }
}

#[async_trait]
impl ScanCycle for CommandScanCycle {
    async fn run_cycle(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let targets = read_targets(&self.targets_file).await.with_context(|| {
            format!("reading scan targets from {}", self.targets_file.display())
        })?;
        if targets.is_empty() {
            warn!(targets_file = %self.targets_file.display(), "scan targets file is empty, nothing to scan");
            return Ok(());
        }

        info!(targets = targets.len(), program = %self.processor.program(), "Running scan command");
        let mut report = self
            .executor
            .execute(&cancel, targets, Arc::clone(&self.processor))
            .await;

        let summary = report.summary();
        if let Some(e) = report.error.take() {
            return Err(e.into());
        }
        if summary.attempted > 0 && summary.failed == summary.attempted {
            bail!("all {} scan batches failed", summary.attempted);
        }
        if summary.failed > 0 {
            let failed: Vec<usize> = report.failed().map(|r| r.batch_index).collect();
            warn!(
                failed = summary.failed,
                attempted = summary.attempted,
                batches = ?failed,
                "scan cycle finished with failed batches"
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "command-scan"
    }
}
