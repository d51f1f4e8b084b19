use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;

/// When the next scan cycle starts if the previous one finished at `now`.
///
/// Fails for a zero interval and for intervals that overflow the calendar.
pub fn next_scan_time(
    now: DateTime<Utc>,
    cycle: Duration,
) -> Result<DateTime<Utc>, SchedulerError> {
    if cycle.is_zero() {
        return Err(SchedulerError::InvalidCycleInterval(cycle));
    }
    chrono::Duration::from_std(cycle)
        .ok()
        .and_then(|step| now.checked_add_signed(step))
        .ok_or(SchedulerError::InvalidCycleInterval(cycle))
}
