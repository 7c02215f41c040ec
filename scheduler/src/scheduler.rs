//! The scheduler's owner task (spec §4.1, §9 design note): a single
//! `SchedulerState` mutated only by the task that owns it. Inbound
//! datagrams arrive through `net::spawn_recv_loop`'s channel; every other
//! caller gets a `Vec<Effect>` back describing what to send, instead of a
//! handle to the socket itself. This mirrors how the teacher's
//! `SimulationEngine` separates its owned world state from the channel that
//! feeds it commands.

use crate::assignment::{find_redirect_target, select_best};
use crate::fleet::{DroneRecord, FleetTable};
use crate::metrics::{DropCounters, FleetSummary};
use crate::stall::detect_stalled;
use crate::zones::ZoneRegistry;
use shared::config::SimConfig;
use shared::protocol::{self, AssignmentMessage, DroneStatusMessage, FireEventMessage, InboundMessage};
use shared::types::{DroneState, FireEvent, Location};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::time::Instant;

/// A UDP datagram the caller should send. Decoupling decision logic from
/// socket I/O keeps `SchedulerState`'s methods plain and synchronously
/// testable (spec §9 design note).
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub addr: SocketAddr,
    pub text: String,
}

impl Effect {
    fn new(addr: SocketAddr, text: impl Into<String>) -> Self {
        Self {
            addr,
            text: text.into(),
        }
    }
}

pub struct SchedulerState {
    zones: ZoneRegistry,
    fleet: FleetTable,
    /// Pending fires keyed by zone id: invariant 4 (spec §3) allows at most
    /// one active fire per zone, so the zone id is already a unique key.
    pending_fires: HashMap<u32, FireEvent>,
    drop_counters: DropCounters,
    zones_cleared: u64,
    fire_source_addr: Option<SocketAddr>,
    config: SimConfig,
}

impl SchedulerState {
    pub fn new(zones: ZoneRegistry, config: SimConfig) -> Self {
        Self {
            zones,
            fleet: FleetTable::new(),
            pending_fires: HashMap::new(),
            drop_counters: DropCounters::new(),
            zones_cleared: 0,
            fire_source_addr: None,
            config,
        }
    }

    /// Decodes and dispatches one inbound datagram. Decode failures are
    /// logged and discarded per spec §7 ("Malformed message"), never
    /// propagated as an error to the caller.
    pub fn handle_datagram(&mut self, from: SocketAddr, text: &str, now: Instant) -> Vec<Effect> {
        let msg = match protocol::decode_inbound(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(%from, "discarding malformed datagram: {e}");
                return Vec::new();
            }
        };

        match msg {
            InboundMessage::FireEvent(event) => self.handle_fire_event(event, from, now),
            InboundMessage::DroneStatus(status) => self.handle_drone_status(status, text, from, now),
            InboundMessage::ZoneInfoRequest(zone_id) => {
                let center = self.zones.center_of(zone_id);
                vec![Effect::new(
                    from,
                    protocol::encode_zone_info_response(zone_id, center),
                )]
            }
            InboundMessage::ZoneInfoResponse { .. } => Vec::new(),
        }
    }

    fn handle_fire_event(
        &mut self,
        msg: FireEventMessage,
        from: SocketAddr,
        now: Instant,
    ) -> Vec<Effect> {
        self.fire_source_addr = Some(from);
        let mut effects = vec![Effect::new(from, format!("ADMITTED:{}", msg.zone_id))];

        if self.pending_fires.contains_key(&msg.zone_id) {
            tracing::debug!(zone = msg.zone_id, "duplicate fire event for active zone, ignoring");
            return effects;
        }

        let mut event = FireEvent::new(msg.time, msg.zone_id, msg.kind, msg.severity);
        event.error = msg.error;
        self.pending_fires.insert(msg.zone_id, event);

        effects.extend(self.attempt_assign(msg.zone_id, now));
        effects
    }

    fn handle_drone_status(
        &mut self,
        msg: DroneStatusMessage,
        raw_text: &str,
        from: SocketAddr,
        now: Instant,
    ) -> Vec<Effect> {
        self.fleet
            .register(DroneRecord::new_idle(msg.drone_id, Location::new(msg.x, msg.y), now));
        let drone_id = msg.drone_id;

        {
            let record = self.fleet.get_mut(drone_id).expect("just registered");
            if record.last_raw_status.as_deref() == Some(raw_text) {
                record.last_seen_at = now;
                return Vec::new();
            }
        }

        let new_state = match DroneState::from_str(&msg.state) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(drone_id, "discarding status with unrecognized state: {e}");
                return Vec::new();
            }
        };

        let mut effects = Vec::new();
        let record = self.fleet.get_mut(drone_id).expect("just registered");
        let prev_state = record.state;
        record.last_seen_at = now;
        record.addr = Some(from);
        record.current_location = Location::new(msg.x, msg.y);
        if let Some(capacity) = msg.capacity_remaining {
            record.capacity_remaining = capacity;
        }
        if new_state != prev_state {
            record.last_progress_at = now;
        }
        record.state = new_state;
        record.last_raw_status = Some(raw_text.to_string());

        if new_state == DroneState::HardShutdown && !record.hard_fault {
            record.hard_fault = true;
            if let Some(zone) = record.current_task.take() {
                if let Some(fire) = self.pending_fires.get_mut(&zone) {
                    fire.assigned_drones.remove(&drone_id);
                }
            }
            tracing::warn!(drone_id, "drone evicted after hard fault");
        }

        // Soft fault (spec §4.2, §7): the drone is only sidelined, not
        // evicted, but its mission is recalled the same way a hard fault's
        // is so the fire can be backfilled by a healthy drone. Stall
        // detection does not cover this case: `detect_stalled` only
        // monitors drones that `carries_task()`, which is false once the
        // drone has already reported `Fault`.
        if new_state == DroneState::Fault && prev_state != DroneState::Fault {
            if let Some(zone) = record.current_task.take() {
                if let Some(fire) = self.pending_fires.get_mut(&zone) {
                    fire.assigned_drones.remove(&drone_id);
                }
            }
            tracing::warn!(drone_id, "drone soft-faulted, recalling task");
        }

        // Invariant 1 (spec §3): currentTask is non-null exactly when state
        // is outside {Idle, ArrivedToBase, Fault}. A drone's own completion
        // cycle (AtLocation -> ReturningToBase -> ArrivedToBase -> Idle)
        // never runs back through the scheduler's assignment path, so the
        // record's stale task reference has to be cleared here instead.
        if matches!(new_state, DroneState::Idle | DroneState::ArrivedToBase) {
            record.current_task = None;
        }

        // A drop completes when a drone leaves the target and turns for
        // base (spec §4.2): that edge is the authoritative signal, not the
        // optional `FIRE_OUT` status field, so it survives packet loss of
        // any single annotated status line.
        if prev_state == DroneState::AtLocation && new_state == DroneState::ReturningToBase {
            if let Some(zone) = self.fleet.get(drone_id).and_then(|d| d.current_task) {
                let count = self.drop_counters.record_drop(zone);
                if let Some(fire) = self.pending_fires.get_mut(&zone) {
                    fire.drops_completed = count;
                    if fire.is_extinguished() {
                        self.drop_counters.clear(zone);
                        self.zones_cleared += 1;
                        self.pending_fires.remove(&zone);
                        if let Some(source) = self.fire_source_addr {
                            effects.push(Effect::new(source, format!("FIRE_OUT:{zone}")));
                        }
                    }
                }
            }
        }

        effects
    }

    /// Assigns one more drone to `zone_id`'s pending fire if understaffed,
    /// applying priority redirection first (spec §4.1 step 2-3).
    fn attempt_assign(&mut self, zone_id: u32, now: Instant) -> Vec<Effect> {
        let Some(fire) = self.pending_fires.get(&zone_id) else {
            return Vec::new();
        };
        if fire.is_fully_staffed() {
            return Vec::new();
        }
        let target = self.zones.center_of(zone_id);
        let current_weight = fire.severity.weight();
        let excluded = fire.assigned_drones.clone();

        let candidates = self.fleet.available_candidates(&excluded);
        let Some(best_id) = select_best(&candidates, target).map(|d| d.id) else {
            return Vec::new();
        };

        let redirect = find_redirect_target(&self.pending_fires, zone_id, current_weight)
            .map(|e| e.zone_id);
        let final_zone = redirect.unwrap_or(zone_id);
        let snapshot = self
            .pending_fires
            .get(&final_zone)
            .expect("redirect target or original zone is pending")
            .clone();

        self.pending_fires
            .get_mut(&final_zone)
            .expect("just looked up")
            .assigned_drones
            .insert(best_id);

        let final_target = self.zones.center_of(final_zone);
        let addr = {
            let record = self.fleet.get_mut(best_id).expect("selected from fleet");
            record.current_task = Some(final_zone);
            record.state = DroneState::EnRoute;
            record.target_location = Some(final_target);
            record.last_progress_at = now;
            record.addr
        };

        let Some(addr) = addr else {
            tracing::warn!(drone_id = best_id, "selected drone has no known address yet");
            return Vec::new();
        };

        let assignment = AssignmentMessage {
            event: FireEventMessage {
                time: snapshot.time.clone(),
                zone_id: final_zone,
                kind: snapshot.kind.clone(),
                severity: snapshot.severity,
                error: snapshot.error,
            },
            assigned_drone_id: best_id,
        };
        vec![Effect::new(addr, assignment.encode())]
    }

    /// One tick of the scheduler's loop (spec §4.1): backfill understaffed
    /// fires, evict stalled drones and recall their tasks, then log the
    /// fleet summary.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();

        let stalled = detect_stalled(&self.fleet, now, self.config.timing.stall_timeout);
        for drone_id in &stalled {
            if let Some(record) = self.fleet.get_mut(*drone_id) {
                tracing::warn!(drone_id, "drone stalled past timeout, recalling task");
                record.state = DroneState::Fault;
                record.last_progress_at = now;
                if let Some(zone) = record.current_task.take() {
                    if let Some(fire) = self.pending_fires.get_mut(&zone) {
                        fire.assigned_drones.remove(drone_id);
                    }
                }
            }
        }

        let understaffed: Vec<u32> = self
            .pending_fires
            .iter()
            .filter(|(_, fire)| !fire.is_fully_staffed())
            .map(|(zone_id, _)| *zone_id)
            .collect();
        for zone_id in understaffed {
            effects.extend(self.attempt_assign(zone_id, now));
        }

        self.summary().log();
        effects
    }

    pub fn summary(&self) -> FleetSummary {
        FleetSummary::compute(&self.fleet, self.pending_fires.len(), self.zones_cleared)
    }

    #[cfg(test)]
    pub fn pending_fire(&self, zone_id: u32) -> Option<&FireEvent> {
        self.pending_fires.get(&zone_id)
    }

    #[cfg(test)]
    pub fn drone(&self, id: u32) -> Option<&DroneRecord> {
        self.fleet.get(id)
    }

    #[cfg(test)]
    pub fn drop_count(&self, zone_id: u32) -> u32 {
        self.drop_counters.get(zone_id)
    }

    #[cfg(test)]
    pub fn zones_cleared(&self) -> u64 {
        self.zones_cleared
    }
}
