//! HoldStack queries and compaction against a per-tick traffic view

mod common;

use common::*;
use glam::DVec2;
use hold_dispatch_core::models::route::{Leg, TurnDirection, WaypointId};
use hold_dispatch_core::{Airspace, ClearanceQueue, HoldPattern, HoldStack, StackId, Traffic};

fn stack() -> HoldStack {
    HoldStack::new(
        StackId(0),
        LEFT_NAME,
        WaypointId(300),
        DVec2::new(-6.0, -8.0),
        HoldPattern::new(FLOOR_FT, 43, 5, TurnDirection::Left, INTERVAL_FT),
    )
}

#[test]
fn test_stacks_built_from_config() {
    let (scheduler, airspace) = scheduler();
    let left = scheduler.stack(LEFT).unwrap();
    let right = scheduler.stack(RIGHT).unwrap();

    assert_eq!(left.name(), LEFT_NAME);
    assert_eq!(right.name(), RIGHT_NAME);
    assert_eq!(left.pattern().turn_direction, TurnDirection::Left);
    assert_eq!(right.pattern().inbound_course_deg, 353);
    assert_eq!(left.interval_ft(), INTERVAL_FT);
    assert_ne!(left.fix(), right.fix());
    assert_eq!(airspace.waypoint_position(left.fix()), Some(left.fix_position()));
    assert_eq!(scheduler.stack_by_name(RIGHT_NAME).unwrap().id(), RIGHT);
}

#[test]
fn test_release_legs_carry_speed_and_altitude_limits() {
    let (fix_leg, hold_leg) = stack().release_legs();

    match fix_leg {
        Leg::Waypoint(wpt) => {
            assert_eq!(wpt.wpt_id, WaypointId(300));
            assert_eq!(wpt.min_alt_ft, Some(FLOOR_FT));
            assert_eq!(wpt.max_spd_kts, Some(250));
            assert!(wpt.spd_restr_active);
        }
        other => panic!("expected waypoint leg, got {other:?}"),
    }
    match hold_leg {
        Leg::Hold(hold) => {
            assert_eq!(hold.max_spd_lower_kts, 230);
            assert_eq!(hold.max_spd_higher_kts, 240);
            assert_eq!(hold.leg_dist_nm, 5);
        }
        other => panic!("expected hold leg, got {other:?}"),
    }
}

#[test]
fn test_queries_see_clearances_queued_this_tick() {
    let mut stack = stack();
    let aircraft = vec![arrival("A", &[ENTRY], 11000)];
    let mut queue = ClearanceQueue::new();
    queue.push("A", aircraft[0].latest_clearance.with_cleared_alt(7000), 0);
    let traffic = Traffic::new(&aircraft, &mut queue);

    stack.add_pending_entry("A");
    assert_eq!(stack.highest_pending_or_active_altitude(&traffic), Some(7000));
}

#[test]
fn test_pending_push_down_composes_with_queued_clearance() {
    let mut stack = stack();
    let aircraft = vec![arrival("A", &[ENTRY, LEVEX], 11000), arrival("B", &[ENTRY, LEVEX], 13000)];
    let mut queue = ClearanceQueue::new();
    queue.push("A", aircraft[0].latest_clearance.with_cleared_alt(9000), 0);
    stack.add_pending_entry("A");
    stack.add_pending_entry("B");

    let moved = {
        let mut traffic = Traffic::new(&aircraft, &mut queue);
        stack.push_all_pending_down_one_layer(&mut traffic)
    };

    assert_eq!(moved, 2);
    assert_eq!(queue.latest_for("A").unwrap().cleared_alt_ft, 7000);
    assert_eq!(queue.latest_for("B").unwrap().cleared_alt_ft, 11000);
    assert_eq!(queue.latest_for("B").unwrap().route, aircraft[1].latest_clearance.route);
}

#[test]
fn test_push_down_never_breaches_floor() {
    let mut stack = stack();
    let aircraft = vec![arrival("LOW", &[ENTRY], 6000)];
    let mut queue = ClearanceQueue::new();
    stack.add_pending_entry("LOW");

    let moved = {
        let mut traffic = Traffic::new(&aircraft, &mut queue);
        stack.push_all_pending_down_one_layer(&mut traffic)
    };

    assert_eq!(moved, 0);
    assert!(queue.is_empty());
}

#[test]
fn test_missing_aircraft_skipped() {
    let mut stack = stack();
    let aircraft = vec![arrival("HERE", &[ENTRY], 9000)];
    let mut queue = ClearanceQueue::new();
    stack.add_active("GONE");
    stack.add_active("HERE");

    let traffic = Traffic::new(&aircraft, &mut queue);
    assert_eq!(stack.highest_active_altitude(&traffic), Some(9000));

    stack.sort_active_by_cleared_altitude(&traffic);
    assert_eq!(stack.first_active().unwrap().callsign, "HERE");
}

#[test]
fn test_remove_active_by_callsign() {
    let mut stack = stack();
    stack.add_active("A");
    stack.add_active("B");

    assert!(stack.remove_active("A"));
    assert!(!stack.remove_active("A"));
    assert!(stack.contains("B"));
    assert!(!stack.is_pending("B"));
    assert!(stack.is_active("B"));
}
