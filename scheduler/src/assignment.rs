//! Drone selection, multi-drone dispatch, and priority redirection
//! (spec §4.1). Pure decision logic kept separate from the I/O-driven
//! scheduler loop, the way the teacher's `mission_assignment.rs` separates
//! `MissionAssignmentEngine`'s scoring from `multi_drone_control`'s
//! network-facing service.

use crate::fleet::DroneRecord;
use shared::types::{FireEvent, Location};
use std::collections::HashMap;

fn drone_token(id: u32) -> String {
    format!("drone{id}")
}

/// Picks the best candidate for an event at `target` (spec §4.1 step 2):
/// ascending by `(zones_serviced, manhattan_distance)`, final tiebreak by
/// the drone's wire-format id token, lexicographically (spec §8 property 6).
pub fn select_best<'a>(candidates: &[&'a DroneRecord], target: Location) -> Option<&'a DroneRecord> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| {
            let key_a = (
                a.zones_serviced,
                a.current_location.manhattan_distance(&target),
            );
            let key_b = (
                b.zones_serviced,
                b.current_location.manhattan_distance(&target),
            );
            key_a
                .cmp(&key_b)
                .then_with(|| drone_token(a.id).cmp(&drone_token(b.id)))
        })
}

/// A fire zone eligible for redirection: active, understaffed, and of
/// strictly higher priority weight than the event currently under
/// consideration (spec §4.1 "Priority redirection").
pub fn find_redirect_target<'a>(
    pending: &'a HashMap<u32, FireEvent>,
    current_zone: u32,
    current_weight: u32,
) -> Option<&'a FireEvent> {
    pending
        .values()
        .filter(|e| e.zone_id != current_zone)
        .filter(|e| e.severity.weight() > current_weight)
        .filter(|e| !e.is_fully_staffed())
        .max_by_key(|e| e.severity.weight())
}
