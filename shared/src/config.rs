use crate::DroneNetResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port layout, matching spec §6: scheduler inbound, FireSource inbound, and
/// the `7000 + 100*k + offset` formula for drone `k`'s inbound port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortConfig {
    pub scheduler_port: u16,
    pub fire_source_port: u16,
    pub drone_port_base: u16,
}

impl PortConfig {
    pub fn drone_port(&self, drone_id: u32) -> u16 {
        self.drone_port_base + 100 * drone_id as u16 + 1
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            scheduler_port: 6001,
            fire_source_port: 5001,
            drone_port_base: 7000,
        }
    }
}

/// Timing knobs from spec §4.1 / §5: tick interval, stall timeout, status
/// emission interval, socket receive timeout, and source-side ack/retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingConfig {
    pub tick_interval: Duration,
    pub stall_timeout: Duration,
    pub status_interval: Duration,
    pub socket_recv_timeout: Duration,
    pub ack_timeout: Duration,
    pub resend_attempts: u32,
    /// How long a soft-faulted drone waits before simulated recovery
    /// (spec §4.2 `Fault | recovery (soft fault only) | Idle`; §7 "operator
    /// (or simulated recovery) returns drone to Idle").
    pub recovery_delay: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            stall_timeout: Duration::from_secs(30),
            status_interval: Duration::from_secs(1),
            socket_recv_timeout: Duration::from_secs(1),
            ack_timeout: Duration::from_secs(2),
            resend_attempts: 3,
            recovery_delay: Duration::from_secs(5),
        }
    }
}

/// Drone hardware constants from spec §4.1 (DroneSpec).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DroneSpec {
    pub max_speed_mps: f64,
    pub acceleration_mps2: f64,
    pub tank_capacity_l: f64,
    pub flow_rate_lps: f64,
}

impl Default for DroneSpec {
    fn default() -> Self {
        Self {
            max_speed_mps: 5.0,
            acceleration_mps2: 2.5,
            tank_capacity_l: 10.0,
            flow_rate_lps: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimConfig {
    pub ports: PortConfig,
    pub timing: TimingConfig,
    pub drone_spec: DroneSpec,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ports: PortConfig::default(),
            timing: TimingConfig::default(),
            drone_spec: DroneSpec::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from the environment, falling back to defaults.
    /// Mirrors the teacher's `AgroConfig::load` pattern: `dotenvy` first,
    /// then `env::var(..).unwrap_or_else(..).parse().unwrap_or(default)`.
    pub fn load() -> DroneNetResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = SimConfig::default();

        if let Ok(v) = std::env::var("SCHEDULER_PORT") {
            config.ports.scheduler_port = v
                .parse()
                .map_err(|_| crate::DroneNetError::Config(format!("invalid SCHEDULER_PORT: {v}")))?;
        }
        if let Ok(v) = std::env::var("FIRE_SOURCE_PORT") {
            config.ports.fire_source_port = v.parse().map_err(|_| {
                crate::DroneNetError::Config(format!("invalid FIRE_SOURCE_PORT: {v}"))
            })?;
        }
        if let Ok(v) = std::env::var("DRONE_PORT_BASE") {
            config.ports.drone_port_base = v.parse().map_err(|_| {
                crate::DroneNetError::Config(format!("invalid DRONE_PORT_BASE: {v}"))
            })?;
        }
        if let Ok(v) = std::env::var("STALL_TIMEOUT_SECS") {
            let secs: u64 = v.parse().map_err(|_| {
                crate::DroneNetError::Config(format!("invalid STALL_TIMEOUT_SECS: {v}"))
            })?;
            config.timing.stall_timeout = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("TICK_INTERVAL_MS") {
            let ms: u64 = v.parse().map_err(|_| {
                crate::DroneNetError::Config(format!("invalid TICK_INTERVAL_MS: {v}"))
            })?;
            config.timing.tick_interval = Duration::from_millis(ms);
        }
        if let Ok(v) = std::env::var("RECOVERY_DELAY_SECS") {
            let secs: u64 = v.parse().map_err(|_| {
                crate::DroneNetError::Config(format!("invalid RECOVERY_DELAY_SECS: {v}"))
            })?;
            config.timing.recovery_delay = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
