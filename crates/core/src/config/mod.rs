//! Engine configuration: scan cadence, monitor sources, batch knobs, logging.
//!
//! Parsed from `recon.toml` with `RECON_*` environment variable overrides.

mod loading;
mod types;
mod validation;


pub use loading::load_dotenv;
pub use types::{BatchSettings, LoggingConfig, MonitorConfig, ReconConfig, ScanConfig};
