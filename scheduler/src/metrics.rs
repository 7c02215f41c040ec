//! Aggregate mission metrics (spec §2 "Metrics sink", §9 design note:
//! an explicitly owned sink rather than a global singleton).

use crate::fleet::FleetTable;
use shared::types::DroneState;
use std::collections::HashMap;

/// A point-in-time snapshot of fleet and mission progress, logged every
/// scheduler tick and exposed to tests via `SchedulerState::summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub idle: usize,
    pub en_route: usize,
    pub at_location: usize,
    pub returning: usize,
    pub faulted: usize,
    pub hard_shutdown: usize,
    pub pending_fires: usize,
    pub zones_cleared: u64,
}

impl FleetSummary {
    pub fn compute(fleet: &FleetTable, pending_fires: usize, zones_cleared: u64) -> Self {
        let mut summary = FleetSummary {
            pending_fires,
            zones_cleared,
            ..Default::default()
        };
        for drone in fleet.iter() {
            match drone.state {
                DroneState::Idle => summary.idle += 1,
                DroneState::EnRoute => summary.en_route += 1,
                DroneState::AtLocation => summary.at_location += 1,
                DroneState::ReturningToBase => summary.returning += 1,
                DroneState::ArrivedToBase => summary.idle += 1,
                DroneState::Fault => summary.faulted += 1,
                DroneState::HardShutdown => summary.hard_shutdown += 1,
            }
        }
        summary
    }

    pub fn log(&self) {
        tracing::info!(
            idle = self.idle,
            en_route = self.en_route,
            at_location = self.at_location,
            returning = self.returning,
            faulted = self.faulted,
            hard_shutdown = self.hard_shutdown,
            pending_fires = self.pending_fires,
            zones_cleared = self.zones_cleared,
            "fleet summary"
        );
    }
}

/// Per-zone drop counters, persisted across drone churn until the fire is
/// declared out (spec §3 invariant 4, §11 open-question resolution).
#[derive(Debug, Default, Clone)]
pub struct DropCounters {
    counts: HashMap<u32, u32>,
}

impl DropCounters {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    pub fn record_drop(&mut self, zone_id: u32) -> u32 {
        let count = self.counts.entry(zone_id).or_insert(0);
        *count += 1;
        *count
    }

    pub fn get(&self, zone_id: u32) -> u32 {
        self.counts.get(&zone_id).copied().unwrap_or(0)
    }

    pub fn clear(&mut self, zone_id: u32) {
        self.counts.remove(&zone_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::DroneRecord;
    use shared::types::Location;
    use tokio::time::Instant;

    #[test]
    fn summary_counts_by_state() {
        let mut fleet = FleetTable::new();
        let now = Instant::now();
        let mut idle = DroneRecord::new_idle(1, Location::new(0, 0), now);
        idle.state = DroneState::Idle;
        fleet.register(idle);
        let mut en_route = DroneRecord::new_idle(2, Location::new(0, 0), now);
        en_route.state = DroneState::EnRoute;
        fleet.register(en_route);

        let summary = FleetSummary::compute(&fleet, 3, 5);
        assert_eq!(summary.idle, 1);
        assert_eq!(summary.en_route, 1);
        assert_eq!(summary.pending_fires, 3);
        assert_eq!(summary.zones_cleared, 5);
    }

    #[test]
    fn drop_counters_persist_until_cleared() {
        let mut counters = DropCounters::new();
        assert_eq!(counters.record_drop(1), 1);
        assert_eq!(counters.record_drop(1), 2);
        assert_eq!(counters.get(1), 2);
        counters.clear(1);
        assert_eq!(counters.get(1), 0);
    }
}
