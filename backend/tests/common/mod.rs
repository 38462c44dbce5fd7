//! Shared fixtures for scheduler integration tests
//!
//! Airspace: MENNU (merge point) at the origin, ILS 02L course 020, and the
//! six arrival fixes used by the four entry rules. Two stacks: LEFT (rule
//! LEVEX-DOGGO) and RIGHT (GINON-DOGGO, MUDUP-SANTA, PUSOB-SANTA).

#![allow(dead_code)]

use glam::DVec2;
use hold_dispatch_core::airspace::wake::WakeCategory;
use hold_dispatch_core::dispatch::config::{
    ApproachConfig, DispatchConfig, DispatchParams, EntryAction, EntryRule, HoldStackConfig,
};
use hold_dispatch_core::models::route::{Leg, Route, TurnDirection, WaypointId, WaypointLeg};
use hold_dispatch_core::{
    Aircraft, AircraftPerf, ClearanceQueue, ClearanceState, HoldAndDispatch, HoldStack, StackId,
    StaticAirspace, TickResult,
};

pub const MENNU: u16 = 1;
pub const DOGGO: u16 = 15;
pub const MUDUP: u16 = 29;
pub const SANTA: u16 = 31;
pub const PUSOB: u16 = 34;
pub const LEVEX: u16 = 143;
pub const GINON: u16 = 146;
/// Unrelated fix used as a route prefix
pub const ENTRY: u16 = 200;

pub const LEFT: StackId = StackId(0);
pub const RIGHT: StackId = StackId(1);
pub const LEFT_NAME: &str = "ILS-02L-LEFT-HOLD";
pub const RIGHT_NAME: &str = "ILS-02L-RIGHT-HOLD";

pub const FLOOR_FT: i32 = 5000;
pub const INTERVAL_FT: i32 = 2000;

// ============================================================================
// Airspace and config
// ============================================================================

pub fn airspace() -> StaticAirspace {
    StaticAirspace::new()
        .with_waypoint(MENNU, "MENNU", DVec2::ZERO)
        .with_waypoint(DOGGO, "DOGGO", DVec2::new(-12.0, -18.0))
        .with_waypoint(MUDUP, "MUDUP", DVec2::new(30.0, -10.0))
        .with_waypoint(SANTA, "SANTA", DVec2::new(15.0, -15.0))
        .with_waypoint(PUSOB, "PUSOB", DVec2::new(35.0, -30.0))
        .with_waypoint(LEVEX, "LEVEX", DVec2::new(-30.0, -35.0))
        .with_waypoint(GINON, "GINON", DVec2::new(-5.0, -45.0))
        .with_waypoint(ENTRY, "ENTRY", DVec2::new(0.0, -80.0))
}

fn rule(second_last: &str, last: &str, stack: &str, action: EntryAction, clear: bool) -> EntryRule {
    EntryRule {
        second_last: second_last.to_string(),
        last: last.to_string(),
        stack: stack.to_string(),
        action,
        clear_speed_restriction: clear,
    }
}

pub fn config() -> DispatchConfig {
    DispatchConfig {
        merge_waypoint: "MENNU".to_string(),
        approach: ApproachConfig {
            name: "ILS 02L".to_string(),
            course_deg: 20.0,
            transition: "vectors".to_string(),
            intercept_altitude_ft: 3500,
            route: route(&[MENNU]),
        },
        stacks: vec![
            HoldStackConfig {
                name: LEFT_NAME.to_string(),
                bearing_offset_deg: 20.0,
                distance_nm: 10.0,
                min_altitude_ft: FLOOR_FT,
                inbound_course_deg: 43,
                leg_distance_nm: 5,
                turn_direction: TurnDirection::Left,
            },
            HoldStackConfig {
                name: RIGHT_NAME.to_string(),
                bearing_offset_deg: -30.0,
                distance_nm: 10.0,
                min_altitude_ft: FLOOR_FT,
                inbound_course_deg: 353,
                leg_distance_nm: 5,
                turn_direction: TurnDirection::Right,
            },
        ],
        entry_rules: vec![
            rule("LEVEX", "DOGGO", LEFT_NAME, EntryAction::ReplaceLast, false),
            rule("GINON", "DOGGO", RIGHT_NAME, EntryAction::ReplaceLast, false),
            rule("MUDUP", "SANTA", RIGHT_NAME, EntryAction::ReplaceLast, true),
            rule("PUSOB", "SANTA", RIGHT_NAME, EntryAction::Append, true),
        ],
        params: DispatchParams::default(),
    }
}

pub fn scheduler() -> (HoldAndDispatch, StaticAirspace) {
    let mut airspace = airspace();
    let scheduler = HoldAndDispatch::new(config(), &mut airspace).expect("fixture config is valid");
    (scheduler, airspace)
}

// ============================================================================
// Routes and aircraft
// ============================================================================

/// Route of plain waypoint legs, each with an active 250 kt restriction
pub fn route(ids: &[u16]) -> Route {
    ids.iter()
        .map(|&id| Leg::Waypoint(WaypointLeg::new(WaypointId(id)).with_max_speed(250)))
        .collect()
}

pub fn perf(wake_category: WakeCategory, app_spd_kts: i16) -> AircraftPerf {
    AircraftPerf {
        wake_category,
        recat: None,
        app_spd_kts,
    }
}

/// Medium jet far to the south, northbound at 250 kt, flying `route`
pub fn arrival(callsign: &str, route_ids: &[u16], cleared_alt_ft: i32) -> Aircraft {
    let clearance = ClearanceState::new(route(route_ids), cleared_alt_ft, 250);
    Aircraft {
        callsign: callsign.to_string(),
        perf: perf(WakeCategory::Medium, 140),
        position: DVec2::new(0.0, -80.0),
        ground_track_kts: DVec2::new(0.0, 250.0),
        true_airspeed_kts: 250.0,
        altitude_ft: cleared_alt_ft as f64,
        acting_clearance: clearance.clone(),
        latest_clearance: clearance,
        localizer_captured: false,
    }
}

/// Aircraft established in `stack`'s hold at `altitude_ft`
pub fn holding(callsign: &str, stack: &HoldStack, altitude_ft: i32) -> Aircraft {
    let (_, hold_leg) = stack.release_legs();
    let clearance = ClearanceState::new(Route::from_legs(vec![hold_leg]), altitude_ft, 230);
    Aircraft {
        callsign: callsign.to_string(),
        perf: perf(WakeCategory::Medium, 140),
        position: stack.fix_position(),
        ground_track_kts: DVec2::new(0.0, 230.0),
        true_airspeed_kts: 230.0,
        altitude_ft: altitude_ft as f64,
        acting_clearance: clearance.clone(),
        latest_clearance: clearance,
        localizer_captured: false,
    }
}

/// Deliver every queued clearance the way the surrounding simulation does:
/// it becomes the aircraft's latest clearance
pub fn deliver(aircraft: &mut [Aircraft], queue: &mut ClearanceQueue) {
    for request in queue.drain() {
        if let Some(ac) = aircraft.iter_mut().find(|ac| ac.callsign == request.callsign) {
            ac.latest_clearance = request.clearance;
        }
    }
}

/// Make the latest clearance the acting one and fly the aircraft to its
/// cleared altitude
pub fn settle(aircraft: &mut Aircraft) {
    aircraft.acting_clearance = aircraft.latest_clearance.clone();
    aircraft.altitude_ft = aircraft.latest_clearance.cleared_alt_ft as f64;
}

/// Put an already-classified aircraft in its hold: acting route becomes the
/// hold leg alone, position at the fix
pub fn arrive_at_hold(aircraft: &mut Aircraft, stack: &HoldStack) {
    let (_, hold_leg) = stack.release_legs();
    aircraft.latest_clearance.route = Route::from_legs(vec![hold_leg]);
    aircraft.acting_clearance = aircraft.latest_clearance.clone();
    aircraft.position = stack.fix_position();
}

/// One tick followed by delivery of everything it queued
pub fn step(
    scheduler: &mut HoldAndDispatch,
    airspace: &StaticAirspace,
    aircraft: &mut [Aircraft],
) -> (TickResult, ClearanceQueue) {
    let mut queue = ClearanceQueue::new();
    let result = scheduler.update(aircraft, airspace, &mut queue);
    let issued = queue.clone();
    deliver(aircraft, &mut queue);
    (result, issued)
}

pub fn find<'a>(aircraft: &'a [Aircraft], callsign: &str) -> &'a Aircraft {
    aircraft
        .iter()
        .find(|ac| ac.callsign == callsign)
        .unwrap_or_else(|| panic!("{callsign} not in fixture"))
}

pub fn find_mut<'a>(aircraft: &'a mut [Aircraft], callsign: &str) -> &'a mut Aircraft {
    aircraft
        .iter_mut()
        .find(|ac| ac.callsign == callsign)
        .unwrap_or_else(|| panic!("{callsign} not in fixture"))
}
