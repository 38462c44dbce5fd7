//! Hold entry confirmation and slot swapping
//!
//! An aircraft becomes InHold once the route it is actually flying is the
//! hold leg alone. It then settles as low as free layers allow, swapping
//! slots with far-away pending aircraft one layer below.

mod common;

use common::*;
use glam::DVec2;
use hold_dispatch_core::{Event, HoldState};

/// Classify everything in `aircraft`, then deliver the clearances
fn classify_all(
    scheduler: &mut hold_dispatch_core::HoldAndDispatch,
    airspace: &hold_dispatch_core::StaticAirspace,
    aircraft: &mut [hold_dispatch_core::Aircraft],
) {
    let (result, _) = step(scheduler, airspace, aircraft);
    assert_eq!(result.num_classified, aircraft.len());
}

#[test]
fn test_not_confirmed_while_still_routing_to_fix() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![arrival("SIA1", &[ENTRY, LEVEX, DOGGO], 11000)];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    // Latest clearance has the hold, but the aircraft still flies the old route
    let (result, _) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_entered_hold, 0);
    assert_eq!(scheduler.membership("SIA1").unwrap().state, HoldState::PendingEnterHold);
}

#[test]
fn test_confirmed_when_flying_only_the_hold_leg() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![arrival("SIA1", &[ENTRY, LEVEX, DOGGO], 11000)];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    let left = scheduler.stack(LEFT).unwrap().clone();
    arrive_at_hold(&mut aircraft[0], &left);
    // Keep it above the release band so it stays in the hold
    aircraft[0].altitude_ft = 9000.0;
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_entered_hold, 1);
    assert_eq!(result.num_swaps, 0);
    assert!(issued.is_empty(), "already at its ideal altitude");

    let left = scheduler.stack(LEFT).unwrap();
    assert!(left.pending().is_empty());
    assert_eq!(left.active().len(), 1);
    assert_eq!(left.active()[0].callsign, "SIA1");
    assert_eq!(scheduler.membership("SIA1").unwrap().state, HoldState::InHold);
    assert_eq!(scheduler.event_log().events_of_type("EnteredHold").len(), 1);
}

#[test]
fn test_exactly_one_swap_with_far_pending_aircraft_below() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![
        arrival("LOWER", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("UPPER", &[ENTRY, LEVEX, DOGGO], 13000),
    ];
    classify_all(&mut scheduler, &airspace, &mut aircraft);
    assert_eq!(find(&aircraft, "UPPER").latest_clearance.cleared_alt_ft, 7000);

    // UPPER overtakes LOWER and reaches the hold first; LOWER is still far out
    let left = scheduler.stack(LEFT).unwrap().clone();
    arrive_at_hold(find_mut(&mut aircraft, "UPPER"), &left);
    find_mut(&mut aircraft, "UPPER").altitude_ft = 7000.0;
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_swaps, 1);
    assert_eq!(issued.latest_for("UPPER").unwrap().cleared_alt_ft, FLOOR_FT);
    assert_eq!(issued.latest_for("LOWER").unwrap().cleared_alt_ft, FLOOR_FT + INTERVAL_FT);
    // Routes are untouched by a swap
    assert_eq!(
        issued.latest_for("LOWER").unwrap().route,
        find(&aircraft, "LOWER").latest_clearance.route
    );

    let swaps = scheduler.event_log().events_of_type("AltitudeSwap");
    assert_eq!(swaps.len(), 1);
    match swaps[0] {
        Event::AltitudeSwap {
            entering, pending, ..
        } => {
            assert_eq!(entering, "UPPER");
            assert_eq!(pending, "LOWER");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_zero_swaps_without_pending_aircraft_below() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![
        arrival("LOWER", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("UPPER", &[ENTRY, LEVEX, DOGGO], 13000),
    ];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    // LOWER leaves the simulation before UPPER reaches the hold
    aircraft.retain(|ac| ac.callsign != "LOWER");
    let left = scheduler.stack(LEFT).unwrap().clone();
    arrive_at_hold(&mut aircraft[0], &left);
    aircraft[0].altitude_ft = 7000.0;
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_departed, 1);
    assert_eq!(result.num_swaps, 0);
    assert!(issued.is_empty());
    assert_eq!(scheduler.stack(LEFT).unwrap().active()[0].callsign, "UPPER");
}

#[test]
fn test_zero_swaps_when_pending_aircraft_is_too_close() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![
        arrival("LOWER", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("UPPER", &[ENTRY, LEVEX, DOGGO], 13000),
    ];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    let left = scheduler.stack(LEFT).unwrap().clone();
    // LOWER is on its last two legs, 2 nm from the fix
    {
        let lower = find_mut(&mut aircraft, "LOWER");
        let (fix_leg, hold_leg) = left.release_legs();
        lower.latest_clearance.route = hold_dispatch_core::Route::from_legs(vec![fix_leg, hold_leg]);
        lower.position = left.fix_position() + DVec2::new(0.0, -2.0);
    }
    arrive_at_hold(find_mut(&mut aircraft, "UPPER"), &left);
    find_mut(&mut aircraft, "UPPER").altitude_ft = 7000.0;
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_entered_hold, 1);
    assert_eq!(result.num_swaps, 0);
    assert!(issued.latest_for("UPPER").is_none());
    assert!(scheduler.stack(LEFT).unwrap().is_pending("LOWER"));
}

#[test]
fn test_arrival_after_refused_swap_goes_above_active_aircraft() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![
        arrival("LOWER", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("UPPER", &[ENTRY, LEVEX, DOGGO], 13000),
    ];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    // UPPER enters at 7000 over LOWER, which is too close to swap
    let left = scheduler.stack(LEFT).unwrap().clone();
    {
        let lower = find_mut(&mut aircraft, "LOWER");
        let (fix_leg, hold_leg) = left.release_legs();
        lower.latest_clearance.route = hold_dispatch_core::Route::from_legs(vec![fix_leg, hold_leg]);
        lower.position = left.fix_position() + DVec2::new(0.0, -2.0);
    }
    arrive_at_hold(find_mut(&mut aircraft, "UPPER"), &left);
    find_mut(&mut aircraft, "UPPER").altitude_ft = 7000.0;
    let (result, _) = step(&mut scheduler, &airspace, &mut aircraft);
    assert_eq!(result.num_swaps, 0);

    aircraft.push(arrival("THIRD", &[ENTRY, LEVEX, DOGGO], 13000));
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);
    assert_eq!(result.num_classified, 1);
    assert_eq!(issued.latest_for("THIRD").unwrap().cleared_alt_ft, 9000);

    arrive_at_hold(find_mut(&mut aircraft, "THIRD"), &left);
    let (result, _) = step(&mut scheduler, &airspace, &mut aircraft);
    assert_eq!(result.num_entered_hold, 1);

    let layers: Vec<i32> = scheduler
        .stack(LEFT)
        .unwrap()
        .active()
        .iter()
        .map(|e| find(&aircraft, &e.callsign).latest_clearance.cleared_alt_ft)
        .collect();
    assert_eq!(layers, vec![7000, 9000]);
    assert!(scheduler.invariant_violations().is_empty());
    assert!(scheduler.event_log().events_of_type("InvariantViolation").is_empty());
}

#[test]
fn test_swaps_chain_down_through_several_layers() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![
        arrival("P5", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("P7", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("E9", &[ENTRY, LEVEX, DOGGO], 13000),
    ];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    let left = scheduler.stack(LEFT).unwrap().clone();
    arrive_at_hold(find_mut(&mut aircraft, "E9"), &left);
    find_mut(&mut aircraft, "E9").altitude_ft = 9000.0;
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_swaps, 2);
    assert_eq!(issued.latest_for("E9").unwrap().cleared_alt_ft, 5000);
    assert_eq!(issued.latest_for("P7").unwrap().cleared_alt_ft, 9000);
    assert_eq!(issued.latest_for("P5").unwrap().cleared_alt_ft, 7000);
}

#[test]
fn test_entering_aircraft_never_climbs() {
    let (mut scheduler, airspace) = scheduler();
    let mut aircraft = vec![
        arrival("FIRST", &[ENTRY, LEVEX, DOGGO], 13000),
        arrival("SECOND", &[ENTRY, LEVEX, DOGGO], 13000),
    ];
    classify_all(&mut scheduler, &airspace, &mut aircraft);

    // SECOND enters first and drops to the floor via a swap, FIRST now at 7000
    let left = scheduler.stack(LEFT).unwrap().clone();
    arrive_at_hold(find_mut(&mut aircraft, "SECOND"), &left);
    find_mut(&mut aircraft, "SECOND").altitude_ft = 7000.0;
    step(&mut scheduler, &airspace, &mut aircraft);
    assert_eq!(find(&aircraft, "FIRST").latest_clearance.cleared_alt_ft, 7000);

    // FIRST enters: ideal is one layer above SECOND, which is where it already is
    arrive_at_hold(find_mut(&mut aircraft, "FIRST"), &left);
    find_mut(&mut aircraft, "FIRST").altitude_ft = 7000.0;
    find_mut(&mut aircraft, "SECOND").altitude_ft = 5800.0;
    let (result, issued) = step(&mut scheduler, &airspace, &mut aircraft);

    assert_eq!(result.num_entered_hold, 1);
    assert_eq!(result.num_swaps, 0);
    assert!(issued.is_empty());
    let order: Vec<&str> = scheduler
        .stack(LEFT)
        .unwrap()
        .active()
        .iter()
        .map(|e| e.callsign.as_str())
        .collect();
    assert_eq!(order, vec!["SECOND", "FIRST"]);
}
