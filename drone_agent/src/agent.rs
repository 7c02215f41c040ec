//! Per-drone simulation owned by a single task (spec §4.2, §5, §9 owner-task
//! design note). `DroneAgent` holds all mutable state; `tick` advances it
//! against a simulated clock and `status_message` renders the wire view,
//! the same split the scheduler's `SchedulerState` uses between mutation
//! and `Effect` production.

use crate::motion::{self, PROGRESS_MILESTONES};
use crate::state::{transition, DroneEvent};
use shared::config::DroneSpec;
use shared::protocol::DroneStatusMessage;
use shared::types::{DroneState, FaultKind, Location, Severity};
use std::collections::HashMap;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct TaskInfo {
    zone_id: u32,
    severity: Severity,
    target: Location,
    scheduled_fault: Option<FaultKind>,
}

pub struct DroneAgent {
    pub id: u32,
    base: Location,
    spec: DroneSpec,
    /// Simulated-recovery delay for soft faults (spec §4.2, §7).
    recovery_delay: Duration,
    state: DroneState,
    current_location: Location,
    current_task: Option<TaskInfo>,
    queued_assignment: Option<TaskInfo>,
    zones_serviced: u32,
    capacity_remaining: f64,
    leg_origin: Location,
    leg_started_at: Instant,
    leg_duration: Duration,
    next_milestone_idx: usize,
    /// When the drone entered `Fault`, if it's currently soft-faulted;
    /// drives the simulated-recovery timer in `tick_fault`.
    fault_since: Option<Instant>,
    /// Zone centers learned via `ZONE_INFO_REQUEST`/`ZONE_INFO` (spec §6);
    /// an assignment only names a zone id, not its geometry.
    zone_cache: HashMap<u32, Location>,
    pending_assignment: Option<(u32, Severity, Option<FaultKind>)>,
}

impl DroneAgent {
    pub fn new(id: u32, base: Location, spec: DroneSpec, recovery_delay: Duration, now: Instant) -> Self {
        Self {
            id,
            base,
            spec,
            recovery_delay,
            state: DroneState::Idle,
            current_location: base,
            current_task: None,
            queued_assignment: None,
            zones_serviced: 0,
            capacity_remaining: spec.tank_capacity_l,
            leg_origin: base,
            leg_started_at: now,
            leg_duration: Duration::ZERO,
            next_milestone_idx: PROGRESS_MILESTONES.len(),
            fault_since: None,
            zone_cache: HashMap::new(),
            pending_assignment: None,
        }
    }

    pub fn state(&self) -> DroneState {
        self.state
    }

    pub fn current_task_zone(&self) -> Option<u32> {
        self.current_task.map(|t| t.zone_id)
    }

    /// Entry point for an inbound assignment datagram (spec §6: an
    /// assignment names a zone id, not its geometry). Returns `Some(zone_id)`
    /// if the caller must send a `ZONE_INFO_REQUEST` to learn the target
    /// before the agent can dispatch; `None` if a cached center let it
    /// dispatch immediately.
    pub fn receive_assignment(
        &mut self,
        zone_id: u32,
        severity: Severity,
        error: Option<FaultKind>,
        now: Instant,
    ) -> Option<u32> {
        if let Some(&center) = self.zone_cache.get(&zone_id) {
            self.handle_assignment(zone_id, severity, center, error, now);
            None
        } else {
            self.pending_assignment = Some((zone_id, severity, error));
            Some(zone_id)
        }
    }

    /// Resolves a previously requested zone center (spec §6 `ZONE_INFO`
    /// response) and dispatches the assignment it was blocking, if any.
    pub fn receive_zone_info(&mut self, zone_id: u32, center: Location, now: Instant) {
        self.zone_cache.insert(zone_id, center);
        if let Some((pending_zone, severity, error)) = self.pending_assignment {
            if pending_zone == zone_id {
                self.pending_assignment = None;
                self.handle_assignment(zone_id, severity, center, error, now);
            }
        }
    }

    /// Dispatches with an already-known target (spec §4.2 transition table:
    /// `Idle | assignment received | EnRoute`, or queued if busy).
    pub fn handle_assignment(
        &mut self,
        zone_id: u32,
        severity: Severity,
        target: Location,
        error: Option<FaultKind>,
        now: Instant,
    ) {
        let task = TaskInfo {
            zone_id,
            severity,
            target,
            scheduled_fault: error,
        };
        if self.state == DroneState::Idle {
            self.dispatch(task, now);
        } else {
            tracing::debug!(drone_id = self.id, zone_id, "busy, queueing assignment");
            self.queued_assignment = Some(task);
        }
    }

    fn dispatch(&mut self, task: TaskInfo, now: Instant) {
        self.state = transition(self.state, &DroneEvent::AssignmentReceived).unwrap_or(self.state);
        self.current_task = Some(task);
        self.begin_leg(self.current_location, task.target, now);
    }

    fn begin_leg(&mut self, from: Location, to: Location, now: Instant) {
        let distance = from.manhattan_distance(&to) as f64;
        self.leg_origin = from;
        self.leg_started_at = now;
        self.leg_duration = motion::travel_duration(distance, &self.spec);
        self.next_milestone_idx = 0;
    }

    fn leg_fraction(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.leg_started_at).as_secs_f64();
        let total = self.leg_duration.as_secs_f64();
        if total <= 0.0 {
            1.0
        } else {
            (elapsed / total).clamp(0.0, 1.0)
        }
    }

    /// Current interpolated position, for external queries and status
    /// reports mid-leg (spec §4.2 "Position is interpolated linearly").
    pub fn position(&self, now: Instant) -> Location {
        match self.state {
            DroneState::EnRoute => {
                let target = self.current_task.map(|t| t.target).unwrap_or(self.leg_origin);
                motion::interpolate(self.leg_origin, target, self.leg_fraction(now))
            }
            DroneState::ReturningToBase => {
                motion::interpolate(self.leg_origin, self.base, self.leg_fraction(now))
            }
            _ => self.current_location,
        }
    }

    /// Whether a 25/50/75% progress milestone has just been crossed,
    /// advancing the internal cursor so each milestone reports once.
    fn crossed_new_milestone(&mut self, now: Instant) -> bool {
        if self.next_milestone_idx >= PROGRESS_MILESTONES.len() {
            return false;
        }
        if self.leg_fraction(now) >= PROGRESS_MILESTONES[self.next_milestone_idx] {
            self.next_milestone_idx += 1;
            true
        } else {
            false
        }
    }

    /// The simulated-time trigger point for a mid-mission fault, per spec
    /// §4.2 "Fault injection": roughly midway through the leg in which it
    /// is meant to occur.
    fn fault_due(&self, now: Instant) -> bool {
        self.leg_fraction(now) >= 0.5
    }

    /// Advances the agent's simulated clock. Returns `true` if something
    /// observable changed (state transition or a crossed milestone) and
    /// the caller should emit a status datagram.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            DroneState::EnRoute => self.tick_en_route(now),
            DroneState::AtLocation => self.tick_at_location(now),
            DroneState::ReturningToBase => self.tick_returning(now),
            DroneState::ArrivedToBase => self.complete_task_and_go_idle(now),
            DroneState::Fault => self.tick_fault(now),
            DroneState::Idle | DroneState::HardShutdown => false,
        }
    }

    /// Simulated-recovery trigger (spec §4.2 `Fault | recovery (soft fault
    /// only) | Idle`; §7 "operator (or simulated recovery) returns drone to
    /// Idle"): once `recovery_delay` has elapsed since the fault began, the
    /// agent recovers on its own without waiting for an external signal.
    fn tick_fault(&mut self, now: Instant) -> bool {
        match self.fault_since {
            Some(since) if now.saturating_duration_since(since) >= self.recovery_delay => {
                self.recover(now)
            }
            _ => false,
        }
    }

    fn tick_en_route(&mut self, now: Instant) -> bool {
        if let Some(fault) = self.scheduled_fault_for(|f| !matches!(f, FaultKind::NozzleJam | FaultKind::DoorStuck)) {
            if self.fault_due(now) {
                return self.apply_fault(fault, now);
            }
        }
        if self.leg_fraction(now) >= 1.0 {
            self.current_location = self.current_task.map(|t| t.target).unwrap_or(self.current_location);
            self.state = transition(self.state, &DroneEvent::ArrivedAtTarget).unwrap_or(self.state);
            self.begin_leg(self.current_location, self.current_location, now);
            self.leg_duration = self.extinguish_leg_duration();
            return true;
        }
        self.crossed_new_milestone(now)
    }

    fn tick_at_location(&mut self, now: Instant) -> bool {
        if let Some(FaultKind::NozzleJam) = self.scheduled_fault_for(|f| matches!(f, FaultKind::NozzleJam)) {
            if self.fault_due(now) {
                return self.apply_fault(FaultKind::NozzleJam, now);
            }
        }
        if self.leg_fraction(now) >= 1.0 {
            let dropped = self.spec.tank_capacity_l.min(self.capacity_remaining);
            self.capacity_remaining -= dropped;
            self.state = transition(self.state, &DroneEvent::DropComplete).unwrap_or(self.state);
            let base = self.base;
            self.begin_leg(self.current_location, base, now);
            return true;
        }
        false
    }

    fn tick_returning(&mut self, now: Instant) -> bool {
        if let Some(FaultKind::DoorStuck) = self.scheduled_fault_for(|f| matches!(f, FaultKind::DoorStuck)) {
            if self.fault_due(now) {
                return self.apply_fault(FaultKind::DoorStuck, now);
            }
        }
        if self.leg_fraction(now) >= 1.0 {
            self.current_location = self.base;
            self.state = transition(self.state, &DroneEvent::ArrivedAtBase).unwrap_or(self.state);
            return true;
        }
        self.crossed_new_milestone(now)
    }

    fn complete_task_and_go_idle(&mut self, now: Instant) -> bool {
        self.state = transition(self.state, &DroneEvent::TaskComplete).unwrap_or(self.state);
        self.zones_serviced += 1;
        self.capacity_remaining = self.spec.tank_capacity_l;
        self.current_task = None;
        if let Some(next) = self.queued_assignment.take() {
            self.dispatch(next, now);
        }
        true
    }

    fn extinguish_leg_duration(&self) -> Duration {
        let severity = self.current_task.map(|t| t.severity).unwrap_or(Severity::Low);
        let remaining_need = severity.required_drones() as f64 * self.spec.tank_capacity_l;
        motion::extinguish_duration(self.capacity_remaining, remaining_need, &self.spec)
    }

    fn scheduled_fault_for(&self, matches_phase: impl Fn(&FaultKind) -> bool) -> Option<FaultKind> {
        self.current_task
            .and_then(|t| t.scheduled_fault)
            .filter(matches_phase)
    }

    fn apply_fault(&mut self, fault: FaultKind, now: Instant) -> bool {
        self.state = transition(self.state, &DroneEvent::FaultDetected(fault)).unwrap_or(self.state);
        if self.state == DroneState::HardShutdown {
            tracing::warn!(drone_id = self.id, ?fault, "hard fault, drone shutting down");
            self.current_task = None;
            self.fault_since = None;
        } else {
            tracing::warn!(drone_id = self.id, ?fault, "soft fault, awaiting recovery");
            self.fault_since = Some(now);
            if let Some(task) = self.current_task.take() {
                self.queued_assignment.get_or_insert(task);
            }
        }
        true
    }

    /// Recovery from a soft fault (spec §4.2: `Fault | recovery (soft fault
    /// only) | Idle | reset`), reachable either through `tick_fault`'s
    /// simulated-recovery timer or a direct operator-triggered call.
    pub fn recover(&mut self, now: Instant) -> bool {
        if self.state != DroneState::Fault {
            return false;
        }
        self.state = transition(self.state, &DroneEvent::Recovery).unwrap_or(self.state);
        self.fault_since = None;
        if let Some(task) = self.queued_assignment.take() {
            self.dispatch(task, now);
        }
        true
    }

    pub fn status_message(&self, now: Instant) -> DroneStatusMessage {
        let position = self.position(now);
        DroneStatusMessage {
            drone_id: self.id,
            state: self.state.to_string(),
            x: position.x,
            y: position.y,
            task: self.current_task.map(|t| (t.zone_id, t.severity)),
            fire_out: None,
            capacity_remaining: Some(self.capacity_remaining),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DroneSpec {
        DroneSpec::default()
    }

    fn recovery_delay() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn idle_drone_dispatches_on_assignment_and_heads_toward_target() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.handle_assignment(1, Severity::Low, Location::new(5, 5), None, now);
        assert_eq!(agent.state(), DroneState::EnRoute);
        assert_eq!(agent.current_task_zone(), Some(1));
    }

    #[test]
    fn full_mission_cycle_returns_to_idle_and_increments_zones_serviced() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.handle_assignment(1, Severity::Low, Location::new(5, 5), None, now);

        let mut clock = now;
        for _ in 0..2000 {
            clock += Duration::from_millis(100);
            agent.tick(clock);
            if agent.state() == DroneState::Idle {
                break;
            }
        }
        assert_eq!(agent.state(), DroneState::Idle);
        assert_eq!(agent.zones_serviced, 1);
        assert_eq!(agent.capacity_remaining, spec().tank_capacity_l);
    }

    #[test]
    fn nozzle_jam_hard_faults_drone_at_location() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.handle_assignment(6, Severity::High, Location::new(20, 20), Some(FaultKind::NozzleJam), now);

        let mut clock = now;
        let mut reached_shutdown = false;
        for _ in 0..2000 {
            clock += Duration::from_millis(100);
            agent.tick(clock);
            if agent.state() == DroneState::HardShutdown {
                reached_shutdown = true;
                break;
            }
        }
        assert!(reached_shutdown);
    }

    #[test]
    fn soft_fault_recovers_and_resumes_the_same_task() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.handle_assignment(4, Severity::Moderate, Location::new(50, 0), Some(FaultKind::DroneStuck), now);

        let mut clock = now;
        let mut faulted = false;
        for _ in 0..2000 {
            clock += Duration::from_millis(100);
            agent.tick(clock);
            if agent.state() == DroneState::Fault {
                faulted = true;
                break;
            }
        }
        assert!(faulted);
        assert!(agent.recover(clock));
        assert_eq!(agent.state(), DroneState::EnRoute);
        assert_eq!(agent.current_task_zone(), Some(4));
    }

    #[test]
    fn ticking_past_recovery_delay_recovers_without_an_explicit_recover_call() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.handle_assignment(4, Severity::Moderate, Location::new(50, 0), Some(FaultKind::DroneStuck), now);

        let mut clock = now;
        for _ in 0..2000 {
            clock += Duration::from_millis(100);
            agent.tick(clock);
            if agent.state() == DroneState::Fault {
                break;
            }
        }
        assert_eq!(agent.state(), DroneState::Fault);

        // Short of the delay, the agent stays faulted; once the delay has
        // elapsed, the next tick recovers it on its own.
        agent.tick(clock + recovery_delay() - Duration::from_millis(100));
        assert_eq!(agent.state(), DroneState::Fault);

        agent.tick(clock + recovery_delay() + Duration::from_millis(100));
        assert_eq!(agent.state(), DroneState::EnRoute);
        assert_eq!(agent.current_task_zone(), Some(4));
    }

    #[test]
    fn assignment_without_cached_center_requests_zone_info_then_dispatches() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        let request = agent.receive_assignment(3, Severity::Low, None, now);
        assert_eq!(request, Some(3));
        assert_eq!(agent.state(), DroneState::Idle);

        agent.receive_zone_info(3, Location::new(40, 40), now);
        assert_eq!(agent.state(), DroneState::EnRoute);
        assert_eq!(agent.current_task_zone(), Some(3));
    }

    #[test]
    fn second_assignment_to_a_cached_zone_skips_the_request() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.receive_zone_info(3, Location::new(40, 40), now);
        let request = agent.receive_assignment(3, Severity::Low, None, now);
        assert_eq!(request, None);
        assert_eq!(agent.state(), DroneState::EnRoute);
    }

    #[test]
    fn queued_assignment_dispatches_once_idle() {
        let now = Instant::now();
        let mut agent = DroneAgent::new(1, Location::new(0, 0), spec(), recovery_delay(), now);
        agent.handle_assignment(1, Severity::Low, Location::new(1, 1), None, now);
        agent.handle_assignment(2, Severity::Low, Location::new(2, 2), None, now);
        assert_eq!(agent.current_task_zone(), Some(1));

        let mut clock = now;
        for _ in 0..2000 {
            clock += Duration::from_millis(100);
            agent.tick(clock);
            if agent.current_task_zone() == Some(2) {
                break;
            }
        }
        assert_eq!(agent.current_task_zone(), Some(2));
    }
}
