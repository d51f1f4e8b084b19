//! Collaborators backed by external programs, so the scheduler can drive
//! existing recon tooling without code changes.

mod monitor;
mod scan;
mod targets;

pub use monitor::CommandMonitor;
pub use scan::{CommandBatchProcessor, CommandScanCycle};
pub use targets::{parse_targets, read_targets};

use recon_core::ConfigError;

/// Split a configured `[program, args...]` list.
fn split_command(field: &str, command: &[String]) -> Result<(String, Vec<String>), ConfigError> {
    match command.split_first() {
        Some((program, args)) if !program.trim().is_empty() => {
            Ok((program.clone(), args.to_vec()))
        }
        _ => Err(ConfigError::invalid(field, "must name a program to run")),
    }
}
