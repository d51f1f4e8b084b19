//! Scheduler runner -- owns the run lifecycle and the two sub-loops.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, builder methods, running flag and stop signal
//! - `execution`: `start`, service selection and sub-loop supervision
//! - `scan`: periodic scan loop with per-cycle retries
//! - `monitor`: monitor start-up and long-running monitor loop
//! - `timing`: next-run computation

mod core;
mod execution;
mod monitor;
mod scan;
mod timing;

pub use self::core::Scheduler;
pub use self::timing::next_scan_time;
