//! recon-scheduler -- runs periodic scan cycles and the continuous monitor.
//!
//! Reads `config/recon.toml` (or `--config`), applies `RECON_*` environment
//! overrides and runs until Ctrl-C / SIGTERM or the optional `--timeout`.
//! Exits non-zero when the run ends abnormally.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use recon_batch::BatchExecutionConfig;
use recon_core::config::load_dotenv;
use recon_core::logging::init_tracing;
use recon_core::{parse_duration, ConfigError, ReconConfig, RunContext};
use recon_scheduler::{CommandMonitor, CommandScanCycle, Scheduler, SchedulerConfig};

// ── CLI ─────────────────────────────────────────────────────────────

/// Recon scheduler: periodic scans and change monitoring.
#[derive(Parser, Debug)]
#[command(name = "recon-scheduler", version, about)]
struct Cli {
    /// Path to the recon.toml config file.
    #[arg(long, env = "RECON_CONFIG", default_value = "config/recon.toml")]
    config: String,

    /// Stop the run after this long, e.g. "12h" or "90m".
    #[arg(long, env = "RECON_RUN_TIMEOUT", value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Log level used when RUST_LOG is unset. Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    match parse_duration(s) {
        Some(d) if !d.is_zero() => Ok(d),
        _ => Err(format!("invalid timeout '{s}'")),
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    // Tracing is not up yet; the outcome is logged once it is.
    let loaded = ReconConfig::from_file(&cli.config);
    let (config, fallback) = match loaded {
        Ok(cfg) => (cfg, None),
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            (ReconConfig::from_env().context("invalid environment configuration")?, Some(e))
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load config from {}", cli.config));
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level);

    match fallback {
        None => info!(path = %cli.config, "loaded recon config"),
        Some(e) => warn!(
            error = %e,
            path = %cli.config,
            "config file not found, using defaults and environment"
        ),
    }
    config.log_summary();

    let mut scheduler = Scheduler::new(SchedulerConfig::from(&config));
    if let Some(cycle) = CommandScanCycle::from_config(&config)? {
        scheduler = scheduler.with_scan_cycle(Arc::new(cycle));
    }
    if let Some(monitor) = CommandMonitor::from_config(&config)? {
        scheduler = scheduler.with_monitor(Arc::new(monitor));
    }
    info!(
        batch = ?BatchExecutionConfig::from(&config.batch),
        "batch execution settings"
    );

    let ctx = match cli.timeout {
        Some(timeout) => RunContext::with_timeout(timeout),
        None => RunContext::new(),
    };

    let signal_ctx = ctx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_ctx.cancel();
    });

    info!("recon-scheduler starting");
    if let Err(e) = scheduler.start(&ctx).await {
        error!(error = %e, "recon-scheduler exited with error");
        return Err(e.into());
    }
    info!("recon-scheduler exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM. A handler that cannot be installed is logged
/// and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let sigterm = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::select! {
            _ = ctrl_c => {},
            _ = sigterm => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
