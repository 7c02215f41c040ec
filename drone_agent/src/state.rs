//! Pure drone lifecycle transition table (spec §4.2, §9 design note:
//! "model as a tagged variant `DroneState` with a transition function
//! `(state, event) -> state`. No dynamic dispatch by class identity.").

use shared::types::{DroneState, FaultKind};

/// Inputs that drive the state machine. Plain enum, not a subclass
/// hierarchy, mirroring the §9 design note's resolution of the teacher's
/// polymorphic `determine_status` approach.
#[derive(Debug, Clone, PartialEq)]
pub enum DroneEvent {
    AssignmentReceived,
    ArrivedAtTarget,
    DropComplete,
    ArrivedAtBase,
    TaskComplete,
    FaultDetected(FaultKind),
    Recovery,
}

/// Applies one transition (spec §4.2 table). Returns `None` for an event
/// that has no defined transition from `state`, which callers treat as a
/// no-op rather than a panic.
pub fn transition(state: DroneState, event: &DroneEvent) -> Option<DroneState> {
    use DroneState::*;
    match (state, event) {
        (Idle, DroneEvent::AssignmentReceived) => Some(EnRoute),
        (EnRoute, DroneEvent::ArrivedAtTarget) => Some(AtLocation),
        (AtLocation, DroneEvent::DropComplete) => Some(ReturningToBase),
        (ReturningToBase, DroneEvent::ArrivedAtBase) => Some(ArrivedToBase),
        (ArrivedToBase, DroneEvent::TaskComplete) => Some(Idle),
        (_, DroneEvent::FaultDetected(fault)) if fault.is_hard() => Some(HardShutdown),
        (_, DroneEvent::FaultDetected(_)) => Some(Fault),
        (Fault, DroneEvent::Recovery) => Some(Idle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_drone_dispatched_on_assignment() {
        assert_eq!(
            transition(DroneState::Idle, &DroneEvent::AssignmentReceived),
            Some(DroneState::EnRoute)
        );
    }

    #[test]
    fn full_happy_path_cycle() {
        let mut state = DroneState::Idle;
        for event in [
            DroneEvent::AssignmentReceived,
            DroneEvent::ArrivedAtTarget,
            DroneEvent::DropComplete,
            DroneEvent::ArrivedAtBase,
            DroneEvent::TaskComplete,
        ] {
            state = transition(state, &event).expect("valid transition");
        }
        assert_eq!(state, DroneState::Idle);
    }

    #[test]
    fn hard_fault_always_leads_to_shutdown_regardless_of_phase() {
        let result = transition(
            DroneState::AtLocation,
            &DroneEvent::FaultDetected(FaultKind::NozzleJam),
        );
        assert_eq!(result, Some(DroneState::HardShutdown));
    }

    #[test]
    fn soft_fault_recovers_to_idle() {
        let faulted = transition(
            DroneState::EnRoute,
            &DroneEvent::FaultDetected(FaultKind::DroneStuck),
        )
        .unwrap();
        assert_eq!(faulted, DroneState::Fault);
        assert_eq!(transition(faulted, &DroneEvent::Recovery), Some(DroneState::Idle));
    }

    #[test]
    fn undefined_transition_is_a_no_op() {
        assert_eq!(transition(DroneState::Idle, &DroneEvent::ArrivedAtTarget), None);
    }
}
