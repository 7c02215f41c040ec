pub mod assignment;
pub mod fleet;
pub mod metrics;
pub mod scheduler;
pub mod stall;
pub mod zones;

pub use fleet::{DroneRecord, FleetTable};
pub use metrics::FleetSummary;
pub use scheduler::{Effect, SchedulerState};
pub use zones::ZoneRegistry;
