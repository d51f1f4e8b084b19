pub mod config;
pub mod context;
pub mod duration;
pub mod error;
pub mod logging;

pub use config::{BatchSettings, LoggingConfig, MonitorConfig, ReconConfig, ScanConfig};
pub use context::RunContext;
pub use duration::{format_duration, parse_duration};
pub use error::*;
