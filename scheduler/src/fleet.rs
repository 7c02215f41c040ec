use shared::types::{DroneState, Location};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::time::Instant;

/// The scheduler's authoritative view of one drone (spec §3 DroneStatus).
#[derive(Debug, Clone)]
pub struct DroneRecord {
    pub id: u32,
    pub state: DroneState,
    pub current_location: Location,
    pub target_location: Option<Location>,
    /// Zone id of the fire this drone is currently working, if any.
    /// Invariant 1 (spec §3): non-null exactly when state carries a task.
    pub current_task: Option<u32>,
    pub zones_serviced: u32,
    pub hard_fault: bool,
    pub capacity_remaining: f64,
    pub last_seen_at: Instant,
    pub last_progress_at: Instant,
    pub addr: Option<SocketAddr>,
    /// Raw text of the last status datagram accepted from this drone, used
    /// to detect byte-identical retransmissions (spec §8 property 5:
    /// idempotence under repeated receipt).
    pub last_raw_status: Option<String>,
}

impl DroneRecord {
    pub fn new_idle(id: u32, base: Location, now: Instant) -> Self {
        Self {
            id,
            state: DroneState::Idle,
            current_location: base,
            target_location: None,
            current_task: None,
            zones_serviced: 0,
            hard_fault: false,
            capacity_remaining: 10.0,
            last_seen_at: now,
            last_progress_at: now,
            addr: None,
            last_raw_status: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.hard_fault && self.state.is_available_for_assignment()
    }
}

/// Fleet table: the scheduler's private, single-owner mapping of drone id
/// to its last-known record. Only the scheduler's owner task ever mutates
/// this (spec §5, §9 design note: owner-task pattern, no external mutator).
#[derive(Debug, Default)]
pub struct FleetTable {
    drones: HashMap<u32, DroneRecord>,
}

impl FleetTable {
    pub fn new() -> Self {
        Self {
            drones: HashMap::new(),
        }
    }

    pub fn register(&mut self, record: DroneRecord) {
        self.drones.entry(record.id).or_insert(record);
    }

    pub fn get(&self, id: u32) -> Option<&DroneRecord> {
        self.drones.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut DroneRecord> {
        self.drones.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DroneRecord> {
        self.drones.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DroneRecord> {
        self.drones.values_mut()
    }

    pub fn len(&self) -> usize {
        self.drones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }

    /// Drones eligible for a fresh assignment (spec §4.1 step 1), excluding
    /// those already working `excluded_zone`'s fire.
    pub fn available_candidates(&self, excluded: &std::collections::BTreeSet<u32>) -> Vec<&DroneRecord> {
        self.drones
            .values()
            .filter(|d| d.is_available() && !excluded.contains(&d.id))
            .collect()
    }
}
