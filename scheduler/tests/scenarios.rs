//! Black-box scenario tests driven only through `SchedulerState`'s public
//! surface (datagram in, effects/summary out), mirroring the named
//! end-to-end scenarios used to validate this system.

use scheduler::SchedulerState;
use shared::config::SimConfig;
use shared::types::{Location, Zone};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::time::Instant;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

fn status(id: u32, state: &str, x: i64, y: i64) -> String {
    format!("drone{id} {state} {x} {y}")
}

fn fixture_with_zones(zones: &[(u32, (i64, i64), (i64, i64))]) -> SchedulerState {
    let mut registry = scheduler::ZoneRegistry::new();
    for &(id, min, max) in zones {
        registry.insert(Zone::new(
            id,
            Location::new(min.0, min.1),
            Location::new(max.0, max.1),
        ));
    }
    SchedulerState::new(registry, SimConfig::default())
}

/// S1 — Low-severity single drone: one drone, one low fire, one dispatch.
#[test]
fn s1_low_severity_dispatches_single_drone_and_acks() {
    let mut sched = fixture_with_zones(&[(1, (0, 0), (10, 10))]);
    let now = Instant::now();

    sched.handle_datagram(addr(7101), &status(1, "IDLE", 0, 0), now);
    let effects = sched.handle_datagram(addr(5001), "14:03:15 1 FIRE_DETECTED Low", now);

    assert!(effects.iter().any(|e| e.text == "ADMITTED:1"));
    let assigned_to_drone1 = effects
        .iter()
        .any(|e| e.addr == addr(7101) && e.text.contains(" 1 FIRE_DETECTED Low"));
    assert!(assigned_to_drone1, "drone1 should receive the assignment: {effects:?}");

    let summary = sched.summary();
    assert_eq!(summary.pending_fires, 1);
    assert_eq!(summary.en_route, 1);
}

/// S2 — High severity needs three drones, staffed one per tick.
#[test]
fn s2_high_severity_staffs_three_drones_across_ticks() {
    let mut sched = fixture_with_zones(&[(1, (0, 0), (20, 20))]);
    let now = Instant::now();

    for (id, (x, y)) in [(1u32, (0, 0)), (2, (10, 10)), (3, (20, 20))] {
        sched.handle_datagram(addr(7000 + 100 * id as u16 + 1), &status(id, "IDLE", x, y), now);
    }

    sched.handle_datagram(addr(5001), "14:03:15 1 FIRE_DETECTED High", now);
    sched.tick(now);
    sched.tick(now);

    let summary = sched.summary();
    assert_eq!(summary.en_route, 3);
    assert_eq!(summary.pending_fires, 1);
}

/// S4 — Hard fault eviction: a drone that hard-faults at the target is
/// never reselected, and understaffed fires stay pending with no spare
/// drones left.
#[test]
fn s4_hard_fault_evicts_drone_permanently() {
    let mut sched = fixture_with_zones(&[(6, (0, 0), (10, 10))]);
    let now = Instant::now();

    sched.handle_datagram(addr(7101), &status(1, "IDLE", 0, 0), now);
    sched.handle_datagram(addr(5001), "14:10:45 6 FIRE_DETECTED High NOZZLE_JAM", now);

    sched.handle_datagram(addr(7101), &status(1, "AT_LOCATION", 5, 5), now);
    sched.handle_datagram(addr(7101), &status(1, "HARD_SHUTDOWN", 5, 5), now);

    // No other drones known: the tick can't backfill, and the evicted
    // drone must not be reselected on any future tick either.
    sched.tick(now);
    sched.tick(now);

    let summary = sched.summary();
    assert_eq!(summary.hard_shutdown, 1);
    assert_eq!(summary.pending_fires, 1, "high-severity fire stays open, understaffed");
}

/// S5 — Priority redirection: a lone available drone is sent to the
/// higher-severity zone even though it sits closer to the lower one.
#[test]
fn s5_priority_redirection_prefers_higher_severity() {
    let mut sched = fixture_with_zones(&[(2, (0, 0), (10, 10)), (5, (1000, 1000), (1010, 1010))]);
    let now = Instant::now();

    sched.handle_datagram(addr(5001), "14:00:00 2 FIRE_DETECTED Low", now);
    sched.handle_datagram(addr(5001), "14:00:05 5 FIRE_DETECTED High", now);

    // Drone sits at (1,1), next to zone 2's center but far from zone 5's.
    sched.handle_datagram(addr(7101), &status(1, "IDLE", 1, 1), now);
    sched.tick(now);

    assert_eq!(sched.summary().en_route, 1);
}
