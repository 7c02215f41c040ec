//! Manhattan, acceleration-ramped motion model (spec §4.2 "Motion model"),
//! adapted from the teacher's `DroneSimulator::update` continuous 3D physics
//! to this system's integer 2D geometry and simulated-clock time.

use shared::config::DroneSpec;
use shared::types::Location;
use std::time::Duration;

/// Time to travel `distance` meters given an acceleration ramp up to
/// `max_speed`, per spec §4.2: "Effective speed reaches maxSpeed after an
/// acceleration ramp of `maxSpeed/acceleration` seconds."
pub fn travel_duration(distance_m: f64, spec: &DroneSpec) -> Duration {
    if distance_m <= 0.0 {
        return Duration::ZERO;
    }
    let ramp_time = spec.max_speed_mps / spec.acceleration_mps2;
    let ramp_distance = 0.5 * spec.max_speed_mps * ramp_time;

    let seconds = if distance_m <= ramp_distance {
        (2.0 * distance_m / spec.acceleration_mps2).sqrt()
    } else {
        ramp_time + (distance_m - ramp_distance) / spec.max_speed_mps
    };
    Duration::from_secs_f64(seconds)
}

/// Duration of one extinguishing pass (spec §4.2 "Extinguishing"):
/// `min(tankCapacity, remainingNeed) / flowRate` seconds.
pub fn extinguish_duration(capacity_remaining: f64, remaining_need_l: f64, spec: &DroneSpec) -> Duration {
    let litres = capacity_remaining.min(remaining_need_l).max(0.0);
    Duration::from_secs_f64(litres / spec.flow_rate_lps)
}

/// Linear interpolation between `from` and `to` at `fraction` ∈ [0, 1],
/// used for external position queries and the 25/50/75% progress reports.
pub fn interpolate(from: Location, to: Location, fraction: f64) -> Location {
    let fraction = fraction.clamp(0.0, 1.0);
    Location::new(
        from.x + ((to.x - from.x) as f64 * fraction).round() as i64,
        from.y + ((to.y - from.y) as f64 * fraction).round() as i64,
    )
}

/// The progress milestones the agent announces mid-flight (spec §4.2).
pub const PROGRESS_MILESTONES: [f64; 3] = [0.25, 0.5, 0.75];

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DroneSpec {
        DroneSpec::default()
    }

    #[test]
    fn short_hop_never_reaches_max_speed() {
        let d = travel_duration(1.0, &spec());
        // sqrt(2*1/2.5) ~= 0.894s, well under the 2s ramp-to-max time.
        assert!(d.as_secs_f64() < spec().max_speed_mps / spec().acceleration_mps2);
    }

    #[test]
    fn long_trip_includes_ramp_then_cruise() {
        let spec = spec();
        let ramp_time = spec.max_speed_mps / spec.acceleration_mps2;
        let ramp_distance = 0.5 * spec.max_speed_mps * ramp_time;
        let d = travel_duration(ramp_distance + 100.0, &spec);
        let expected = ramp_time + 100.0 / spec.max_speed_mps;
        assert!((d.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn extinguish_duration_matches_spec_example() {
        // A full 10L tank against an unmet need, at 2 L/s, takes 5s (S1).
        let d = extinguish_duration(10.0, 10.0, &spec());
        assert_eq!(d, Duration::from_secs(5));
    }

    #[test]
    fn interpolation_reaches_target_at_fraction_one() {
        let from = Location::new(0, 0);
        let to = Location::new(10, 20);
        assert_eq!(interpolate(from, to, 0.0), from);
        assert_eq!(interpolate(from, to, 1.0), to);
        assert_eq!(interpolate(from, to, 0.5), Location::new(5, 10));
    }
}
