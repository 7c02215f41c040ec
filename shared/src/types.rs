use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Integer (x, y) location in meters. Distance is Manhattan (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i64,
    pub y: i64,
}

impl Location {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(&self, other: &Location) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// True iff `point` lies on some shortest Manhattan path from `self` to
    /// `other`: d(self,point) + d(point,other) == d(self,other).
    pub fn path_passes_through(&self, other: &Location, point: &Location) -> bool {
        self.manhattan_distance(point) + point.manhattan_distance(other)
            == self.manhattan_distance(other)
    }
}

/// Fire severity, ordered low-to-high for priority comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    /// Required drone count for this severity (spec §3 invariant 3, §4.1).
    pub fn required_drones(&self) -> usize {
        match self {
            Severity::Low => 1,
            Severity::Moderate => 2,
            Severity::High => 3,
        }
    }

    /// Priority weight used for redirection decisions (spec §4.1).
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 10,
            Severity::Moderate => 50,
            Severity::High => 100,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = crate::DroneNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Severity::Low),
            "Moderate" => Ok(Severity::Moderate),
            "High" => Ok(Severity::High),
            other => Err(crate::DroneNetError::Protocol(format!(
                "unrecognized severity: {other}"
            ))),
        }
    }
}

/// Hardware/mission fault kinds (spec §3, §6, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    DroneStuck,
    NozzleJam,
    DoorStuck,
    ArrivalSensorFailed,
}

impl FaultKind {
    /// Soft faults are recoverable; hard faults evict the drone (spec §7,
    /// and §11 open-question resolution: ArrivalSensorFailed is soft).
    pub fn is_hard(&self) -> bool {
        matches!(self, FaultKind::NozzleJam | FaultKind::DoorStuck)
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultKind::DroneStuck => "DRONE_STUCK",
            FaultKind::NozzleJam => "NOZZLE_JAM",
            FaultKind::DoorStuck => "DOOR_STUCK",
            FaultKind::ArrivalSensorFailed => "ARRIVAL_SENSOR_FAILED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FaultKind {
    type Err = crate::DroneNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRONE_STUCK" => Ok(FaultKind::DroneStuck),
            "NOZZLE_JAM" => Ok(FaultKind::NozzleJam),
            "DOOR_STUCK" => Ok(FaultKind::DoorStuck),
            "ARRIVAL_SENSOR_FAILED" => Ok(FaultKind::ArrivalSensorFailed),
            other => Err(crate::DroneNetError::Protocol(format!(
                "unrecognized fault kind: {other}"
            ))),
        }
    }
}

/// A rectangular geographic zone. Geometry is immutable; `has_fire` and
/// `severity` are mutable and owned by the scheduler (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub top_left: Location,
    pub bottom_right: Location,
    pub has_fire: bool,
    pub severity: Option<Severity>,
}

impl Zone {
    pub fn new(id: u32, top_left: Location, bottom_right: Location) -> Self {
        Self {
            id,
            top_left,
            bottom_right,
            has_fire: false,
            severity: None,
        }
    }

    /// Componentwise midpoint (spec §3).
    pub fn center(&self) -> Location {
        Location::new(
            (self.top_left.x + self.bottom_right.x) / 2,
            (self.top_left.y + self.bottom_right.y) / 2,
        )
    }

    /// Unknown-zone fallback grid formula (spec §7).
    pub fn fallback_center(zone_id: u32) -> Location {
        let idx = zone_id.saturating_sub(1) as i64;
        Location::new((idx % 3) * 700 + 350, (idx / 3) * 600 + 300)
    }
}

/// A fire event as tracked by the scheduler (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireEvent {
    pub time: String,
    pub zone_id: u32,
    pub kind: String,
    pub severity: Severity,
    pub assigned_drones: BTreeSet<u32>,
    pub drops_completed: u32,
    pub error: Option<FaultKind>,
}

impl FireEvent {
    pub fn new(
        time: impl Into<String>,
        zone_id: u32,
        kind: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            time: time.into(),
            zone_id,
            kind: kind.into(),
            severity,
            assigned_drones: BTreeSet::new(),
            drops_completed: 0,
            error: None,
        }
    }

    pub fn required_drops(&self) -> usize {
        self.severity.required_drones()
    }

    pub fn is_extinguished(&self) -> bool {
        self.drops_completed as usize >= self.required_drops()
    }

    pub fn is_fully_staffed(&self) -> bool {
        self.assigned_drones.len() >= self.required_drops()
    }
}

/// Per-drone lifecycle state (spec §4.2). Plain tagged enum, not a subclass
/// hierarchy, per the §9 design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DroneState {
    Idle,
    EnRoute,
    AtLocation,
    ReturningToBase,
    ArrivedToBase,
    Fault,
    HardShutdown,
}

impl DroneState {
    /// Invariant 1 (spec §3): currentTask is non-null exactly when state is
    /// outside {Idle, ArrivedToBase, Fault}. HardShutdown also carries no
    /// task: the drone has been evicted from the fleet.
    pub fn carries_task(&self) -> bool {
        matches!(
            self,
            DroneState::EnRoute | DroneState::AtLocation | DroneState::ReturningToBase
        )
    }

    pub fn is_available_for_assignment(&self) -> bool {
        matches!(self, DroneState::Idle)
    }
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DroneState::Idle => "IDLE",
            DroneState::EnRoute => "EN_ROUTE",
            DroneState::AtLocation => "AT_LOCATION",
            DroneState::ReturningToBase => "RETURNING_TO_BASE",
            DroneState::ArrivedToBase => "ARRIVED_TO_BASE",
            DroneState::Fault => "FAULT",
            DroneState::HardShutdown => "HARD_SHUTDOWN",
        };
        write!(f, "{s}")
    }
}

impl FromStr for DroneState {
    type Err = crate::DroneNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(DroneState::Idle),
            "EN_ROUTE" => Ok(DroneState::EnRoute),
            "AT_LOCATION" => Ok(DroneState::AtLocation),
            "RETURNING_TO_BASE" => Ok(DroneState::ReturningToBase),
            "ARRIVED_TO_BASE" => Ok(DroneState::ArrivedToBase),
            "FAULT" => Ok(DroneState::Fault),
            "HARD_SHUTDOWN" => Ok(DroneState::HardShutdown),
            other => Err(crate::DroneNetError::Protocol(format!(
                "unrecognized drone state: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Location::new(0, 0);
        let b = Location::new(3, 4);
        assert_eq!(a.manhattan_distance(&b), 7);
        assert_eq!(b.manhattan_distance(&a), 7);
    }

    #[test]
    fn on_path_detects_colinear_manhattan_points() {
        let a = Location::new(0, 0);
        let b = Location::new(10, 10);
        let midpoint = Location::new(5, 5);
        let off_path = Location::new(20, 20);
        assert!(a.path_passes_through(&b, &midpoint));
        assert!(!a.path_passes_through(&b, &off_path));
    }

    #[test]
    fn zone_center_is_componentwise_midpoint() {
        let zone = Zone::new(1, Location::new(0, 0), Location::new(10, 10));
        assert_eq!(zone.center(), Location::new(5, 5));
    }

    #[test]
    fn fallback_center_matches_spec_grid_formula() {
        assert_eq!(Zone::fallback_center(1), Location::new(350, 300));
        assert_eq!(Zone::fallback_center(4), Location::new(350, 900));
    }

    #[test]
    fn severity_round_trips_through_display_and_fromstr() {
        for s in [Severity::Low, Severity::Moderate, Severity::High] {
            let parsed: Severity = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn fault_kind_hard_soft_classification() {
        assert!(FaultKind::NozzleJam.is_hard());
        assert!(FaultKind::DoorStuck.is_hard());
        assert!(!FaultKind::DroneStuck.is_hard());
        assert!(!FaultKind::ArrivalSensorFailed.is_hard());
    }

    #[test]
    fn required_drops_matches_severity_table() {
        assert_eq!(Severity::Low.required_drones(), 1);
        assert_eq!(Severity::Moderate.required_drones(), 2);
        assert_eq!(Severity::High.required_drones(), 3);
    }
}
