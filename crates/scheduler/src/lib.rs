//! Top-level run loop for recurring scans and continuous monitoring.
//!
//! The [`Scheduler`] launches up to two sub-loops (periodic scan cycles and a
//! long-running monitor service) and supervises them until the run context is
//! cancelled or [`Scheduler::stop`] is called.

pub mod command;
pub mod error;
pub mod runner;
pub mod service;
pub mod types;

pub use command::{read_targets, CommandBatchProcessor, CommandMonitor, CommandScanCycle};
pub use error::SchedulerError;
pub use runner::{next_scan_time, Scheduler};
pub use service::{MonitorService, ScanCycle};
pub use types::SchedulerConfig;
