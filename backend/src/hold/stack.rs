//! A single holding stack
//!
//! # Membership
//!
//! - **pending**: assigned to this stack and routed toward its fix, not yet
//!   established. Insertion order is kept; it drives the swap search.
//! - **active**: established in the hold. Kept sorted by cleared altitude
//!   (re-sorted every tick by the scheduler), so the first entry is the
//!   lowest aircraft and the next one to leave.
//!
//! Aircraft are referenced by callsign only. Altitude queries read the
//! latest clearance through [`Traffic`], which includes intents already
//! queued this tick.
//!
//! # Failure semantics
//!
//! Nothing here fails. Empty collections answer `None`; aircraft missing
//! from the tick's traffic are skipped.

use crate::airspace::Airspace;
use crate::core::time::TickClock;
use crate::hold::StackId;
use crate::models::route::{HoldLeg, Leg, TurnDirection, WaypointId, WaypointLeg};
use crate::models::traffic::Traffic;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Aircraft established in the hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldEntry {
    pub callsign: String,
    /// Stack tick at which the aircraft was accepted into the hold
    pub tick_entered: u64,
}

/// Static shape of a holding pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldPattern {
    pub min_altitude_ft: i32,
    pub inbound_course_deg: i16,
    pub leg_distance_nm: u8,
    pub turn_direction: TurnDirection,
    /// Vertical spacing between stacked aircraft
    pub interval_ft: i32,
    pub fix_leg_max_speed_kts: i16,
    pub max_speed_lower_kts: i16,
    pub max_speed_higher_kts: i16,
}

impl HoldPattern {
    /// Pattern with the standard 250/230/240 kt speed limits
    pub fn new(
        min_altitude_ft: i32,
        inbound_course_deg: i16,
        leg_distance_nm: u8,
        turn_direction: TurnDirection,
        interval_ft: i32,
    ) -> Self {
        Self {
            min_altitude_ft,
            inbound_course_deg,
            leg_distance_nm,
            turn_direction,
            interval_ft,
            fix_leg_max_speed_kts: 250,
            max_speed_lower_kts: 230,
            max_speed_higher_kts: 240,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HoldStack {
    id: StackId,
    name: String,
    fix: WaypointId,
    fix_position: DVec2,
    pattern: HoldPattern,
    fix_leg: Leg,
    hold_leg: Leg,
    active: Vec<HoldEntry>,
    pending: Vec<String>,
    clock: TickClock,
}

impl HoldStack {
    /// Build a stack around an already-registered fix
    ///
    /// The route legs handed to assigned aircraft are computed here, once.
    pub fn new(id: StackId, name: &str, fix: WaypointId, fix_position: DVec2, pattern: HoldPattern) -> Self {
        let fix_leg = Leg::Waypoint(
            WaypointLeg::new(fix)
                .with_altitude_window(Some(pattern.min_altitude_ft), None)
                .with_max_speed(pattern.fix_leg_max_speed_kts),
        );
        let hold_leg = Leg::Hold(HoldLeg {
            wpt_id: fix,
            max_alt_ft: None,
            min_alt_ft: Some(pattern.min_altitude_ft),
            max_spd_lower_kts: pattern.max_speed_lower_kts,
            max_spd_higher_kts: pattern.max_speed_higher_kts,
            inbound_hdg: pattern.inbound_course_deg,
            leg_dist_nm: pattern.leg_distance_nm,
            turn_dir: pattern.turn_direction,
        });

        Self {
            id,
            name: name.to_string(),
            fix,
            fix_position,
            pattern,
            fix_leg,
            hold_leg,
            active: Vec::new(),
            pending: Vec::new(),
            clock: TickClock::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> StackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fix(&self) -> WaypointId {
        self.fix
    }

    pub fn fix_position(&self) -> DVec2 {
        self.fix_position
    }

    pub fn pattern(&self) -> &HoldPattern {
        &self.pattern
    }

    pub fn min_altitude_ft(&self) -> i32 {
        self.pattern.min_altitude_ft
    }

    pub fn interval_ft(&self) -> i32 {
        self.pattern.interval_ft
    }

    pub fn current_tick(&self) -> u64 {
        self.clock.current_tick()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn active(&self) -> &[HoldEntry] {
        &self.active
    }

    pub fn is_pending(&self, callsign: &str) -> bool {
        self.pending.iter().any(|cs| cs == callsign)
    }

    pub fn is_active(&self, callsign: &str) -> bool {
        self.active.iter().any(|e| e.callsign == callsign)
    }

    pub fn contains(&self, callsign: &str) -> bool {
        self.is_pending(callsign) || self.is_active(callsign)
    }

    // ========================================================================
    // Pending entry
    // ========================================================================

    /// No-op if already pending
    pub fn add_pending_entry(&mut self, callsign: &str) {
        if !self.is_pending(callsign) {
            self.pending.push(callsign.to_string());
        }
    }

    /// Returns whether the aircraft was pending
    pub fn remove_pending_entry(&mut self, callsign: &str) -> bool {
        match self.pending.iter().position(|cs| cs == callsign) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Highest cleared altitude among pending aircraft if there are any,
    /// otherwise among active aircraft
    pub fn highest_pending_or_active_altitude(&self, traffic: &Traffic) -> Option<i32> {
        if self.pending.is_empty() {
            return self.highest_active_altitude(traffic);
        }
        self.pending
            .iter()
            .filter_map(|cs| traffic.cleared_altitude(cs))
            .max()
    }

    /// First pending aircraft, in insertion order, cleared exactly one
    /// interval below `current_alt_ft` and still at least `min_distance_nm`
    /// from the hold fix along its route
    ///
    /// The scan gives up at the first pending aircraft with fewer than two
    /// legs left: it has essentially arrived and the ones behind it are not
    /// considered.
    pub fn find_swappable_lower_pending_aircraft(
        &self,
        current_alt_ft: i32,
        min_distance_nm: f64,
        traffic: &Traffic,
        airspace: &dyn Airspace,
    ) -> Option<&str> {
        let target_alt = current_alt_ft - self.pattern.interval_ft;
        for callsign in &self.pending {
            let (Some(aircraft), Some(clearance)) =
                (traffic.get(callsign), traffic.latest_clearance(callsign))
            else {
                continue;
            };
            if clearance.route.len() < 2 {
                return None;
            }
            if clearance.cleared_alt_ft != target_alt {
                continue;
            }
            if airspace.distance_to_go_nm(aircraft.position, &clearance.route) >= min_distance_nm {
                return Some(callsign);
            }
        }
        None
    }

    // ========================================================================
    // Active
    // ========================================================================

    /// Accept into the hold, stamped with the current stack tick
    pub fn add_active(&mut self, callsign: &str) {
        self.active.push(HoldEntry {
            callsign: callsign.to_string(),
            tick_entered: self.clock.current_tick(),
        });
    }

    pub fn first_active(&self) -> Option<&HoldEntry> {
        self.active.first()
    }

    pub fn remove_first_active(&mut self) -> Option<HoldEntry> {
        if self.active.is_empty() {
            None
        } else {
            Some(self.active.remove(0))
        }
    }

    /// Returns whether the aircraft was active
    pub fn remove_active(&mut self, callsign: &str) -> bool {
        match self.active.iter().position(|e| e.callsign == callsign) {
            Some(index) => {
                self.active.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn highest_active_altitude(&self, traffic: &Traffic) -> Option<i32> {
        self.active
            .iter()
            .filter_map(|e| traffic.cleared_altitude(&e.callsign))
            .max()
    }

    /// Stable sort by cleared altitude, lowest first
    ///
    /// Ties keep their previous relative order. Aircraft missing from the
    /// tick's traffic sort last.
    pub fn sort_active_by_cleared_altitude(&mut self, traffic: &Traffic) {
        self.active
            .sort_by_key(|e| traffic.cleared_altitude(&e.callsign).unwrap_or(i32::MAX));
    }

    pub fn advance_tick(&mut self) {
        self.clock.advance_tick();
    }

    /// Fix-approach leg and hold leg every assigned aircraft flies
    pub fn release_legs(&self) -> (Leg, Leg) {
        (self.fix_leg.clone(), self.hold_leg.clone())
    }

    // ========================================================================
    // Compaction
    // ========================================================================

    /// Re-clear every active aircraft one interval lower, route unchanged
    ///
    /// Returns the number of aircraft re-cleared.
    pub fn push_all_active_down_one_layer(&self, traffic: &mut Traffic) -> usize {
        self.push_down(self.active.iter().map(|e| e.callsign.as_str()), traffic)
    }

    /// Re-clear every pending aircraft one interval lower, route unchanged
    pub fn push_all_pending_down_one_layer(&self, traffic: &mut Traffic) -> usize {
        self.push_down(self.pending.iter().map(String::as_str), traffic)
    }

    fn push_down<'s>(&self, callsigns: impl Iterator<Item = &'s str>, traffic: &mut Traffic) -> usize {
        let mut moved = 0;
        for callsign in callsigns {
            let Some(latest) = traffic.latest_clearance(callsign) else {
                continue;
            };
            let lowered = latest.cleared_alt_ft - self.pattern.interval_ft;
            if lowered < self.pattern.min_altitude_ft {
                warn!(
                    callsign,
                    stack = %self.name,
                    cleared_alt_ft = latest.cleared_alt_ft,
                    "compaction would breach stack floor, keeping altitude"
                );
                continue;
            }
            let clearance = latest.with_cleared_alt(lowered);
            traffic.issue(callsign, clearance);
            moved += 1;
        }
        moved
    }

    // ========================================================================
    // Checkpoint support
    // ========================================================================

    pub(crate) fn restore_contents(&mut self, tick: u64, active: Vec<HoldEntry>, pending: Vec<String>) {
        self.clock = TickClock::starting_at(tick);
        self.active = active;
        self.pending = pending;
    }
}
