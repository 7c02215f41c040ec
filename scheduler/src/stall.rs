//! Stall detection (spec §4.1 "Stall detection").

use crate::fleet::FleetTable;
use std::time::Duration;
use tokio::time::Instant;

/// Drone ids whose state has not progressed for at least `stall_timeout`
/// while mid-mission. Only drones carrying a task are monitored: `Idle`,
/// `ArrivedToBase`, and `Fault` are not in-flight and cannot stall.
pub fn detect_stalled(fleet: &FleetTable, now: Instant, stall_timeout: Duration) -> Vec<u32> {
    fleet
        .iter()
        .filter(|d| d.state.carries_task())
        .filter(|d| now.saturating_duration_since(d.last_progress_at) >= stall_timeout)
        .map(|d| d.id)
        .collect()
}
