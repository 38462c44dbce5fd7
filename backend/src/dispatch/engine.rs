//! Hold-and-dispatch scheduler
//!
//! Drives arrivals through `(unseen) -> PendingEnterHold -> InHold ->
//! ExitedHold` once per simulation tick. The scheduler owns the stacks and
//! the membership table; aircraft belong to the surrounding simulation and
//! are only ever changed by queueing clearance intents.
//!
//! # Tick Loop
//!
//! ```text
//! 1. Prune tracked aircraft that left the simulation
//! 2. Per aircraft, in supplied order:
//!    - unseen: classify by route suffix, assign slot, queue rewritten route
//!    - pending: confirm hold entry once flying only the hold leg, swap slots
//! 3. Clear the dispatch cursor once its aircraft is on the localizer
//! 4. Per stack: sort active by cleared altitude, pick eligible lowest, advance
//! 5. Oldest eligible across stacks goes through the spacing gate
//! 6. Release: approach clearance, compact stack one layer down
//! ```
//!
//! `update` never fails. Per-aircraft problems are logged and skipped; a
//! broken internal invariant is reported loudly and the tick continues.

use crate::airspace::Airspace;
use crate::core::geometry::offset_by_bearing;
use crate::core::time::TickClock;
use crate::dispatch::config::{DispatchConfig, EntryAction};
use crate::dispatch::entry::EntryRuleSet;
use crate::dispatch::spacing::{self, SpacingDecision};
use crate::hold::{HoldPattern, HoldStack, StackId};
use crate::models::aircraft::Aircraft;
use crate::models::event::{Event, EventLog};
use crate::models::membership::{HoldState, Membership, MembershipTable};
use crate::models::traffic::{ClearanceQueue, Traffic};
use glam::DVec2;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, error, info, warn};

// ============================================================================
// Errors and results
// ============================================================================

/// Construction, configuration and restore failures
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown waypoint: {0}")]
    UnknownWaypoint(String),

    #[error("unknown holding stack: {0}")]
    UnknownStack(String),

    #[error("duplicate holding stack: {0}")]
    DuplicateStack(String),

    #[error("entry rule {second_last} -> {last} is defined twice")]
    DuplicateEntryRule { second_last: String, last: String },

    #[error("snapshot was taken with a different config (expected {expected}, got {actual})")]
    ConfigMismatch { expected: String, actual: String },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Summary of one `update` call
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickResult {
    pub tick: u64,

    /// Aircraft assigned to a stack this tick
    pub num_classified: usize,

    /// Aircraft confirmed established in a hold
    pub num_entered_hold: usize,

    pub num_swaps: usize,

    /// Aircraft cleared for the approach, if any
    pub released: Option<String>,

    /// Spacing evaluation of this tick's release candidate
    pub spacing: Option<SpacingDecision>,

    /// Aircraft skipped because no entry rule matched their route
    pub num_unmatched: usize,

    pub num_departed: usize,
}

// ============================================================================
// Scheduler
// ============================================================================

pub struct HoldAndDispatch {
    config: DispatchConfig,
    stacks: Vec<HoldStack>,
    entry_rules: EntryRuleSet,
    memberships: MembershipTable,
    /// Most recently released aircraft, the spacing reference for the next
    last_dispatched: Option<String>,
    merge_point: DVec2,
    clock: TickClock,
    event_log: EventLog,
    /// Route renderings already reported as unmatched
    reported_unmatched: HashSet<String>,
}

impl HoldAndDispatch {
    /// Build the scheduler, registering one synthetic hold fix per stack
    ///
    /// Each fix sits `distance_nm` from the merge waypoint on bearing
    /// `approach course + 180 + bearing_offset_deg`.
    ///
    /// # Errors
    ///
    /// Configuration validation failures, and [`DispatchError::UnknownWaypoint`]
    /// when the merge waypoint or an entry-rule fix is not in the airspace.
    pub fn new(config: DispatchConfig, airspace: &mut dyn Airspace) -> Result<Self, DispatchError> {
        config.validate()?;

        let merge_point = airspace
            .waypoint_id(&config.merge_waypoint)
            .and_then(|id| airspace.waypoint_position(id))
            .ok_or_else(|| DispatchError::UnknownWaypoint(config.merge_waypoint.clone()))?;

        let params = &config.params;
        let reciprocal = config.approach.course_deg + 180.0;
        let mut stacks = Vec::with_capacity(config.stacks.len());
        for (index, stack_config) in config.stacks.iter().enumerate() {
            let fix_position = offset_by_bearing(
                merge_point,
                reciprocal + stack_config.bearing_offset_deg,
                stack_config.distance_nm,
            );
            let fix = airspace.register_waypoint(&stack_config.name, fix_position).ok_or_else(|| {
                DispatchError::InvalidConfig(format!("no free fix id for hold {}", stack_config.name))
            })?;
            let pattern = HoldPattern {
                min_altitude_ft: stack_config.min_altitude_ft,
                inbound_course_deg: stack_config.inbound_course_deg,
                leg_distance_nm: stack_config.leg_distance_nm,
                turn_direction: stack_config.turn_direction,
                interval_ft: params.hold_altitude_interval_ft,
                fix_leg_max_speed_kts: params.fix_leg_max_speed_kts,
                max_speed_lower_kts: params.hold_max_speed_lower_kts,
                max_speed_higher_kts: params.hold_max_speed_higher_kts,
            };
            debug!(
                stack = %stack_config.name,
                x_nm = fix_position.x,
                y_nm = fix_position.y,
                "registered hold fix"
            );
            stacks.push(HoldStack::new(
                StackId(index),
                &stack_config.name,
                fix,
                fix_position,
                pattern,
            ));
        }

        let entry_rules = EntryRuleSet::resolve(&config, airspace)?;

        Ok(Self {
            config,
            stacks,
            entry_rules,
            memberships: MembershipTable::new(),
            last_dispatched: None,
            merge_point,
            clock: TickClock::new(),
            event_log: EventLog::new(),
            reported_unmatched: HashSet::new(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn stacks(&self) -> &[HoldStack] {
        &self.stacks
    }

    pub fn stack(&self, id: StackId) -> Option<&HoldStack> {
        self.stacks.get(id.0)
    }

    pub fn stack_by_name(&self, name: &str) -> Option<&HoldStack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    pub fn memberships(&self) -> &MembershipTable {
        &self.memberships
    }

    pub fn membership(&self, callsign: &str) -> Option<&Membership> {
        self.memberships.get(callsign)
    }

    pub fn last_dispatched(&self) -> Option<&str> {
        self.last_dispatched.as_deref()
    }

    pub fn merge_point(&self) -> DVec2 {
        self.merge_point
    }

    pub fn current_tick(&self) -> u64 {
        self.clock.current_tick()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Run one scheduling step over this tick's aircraft
    ///
    /// Clearance intents are pushed into `queue`; nothing else outside the
    /// scheduler is changed.
    pub fn update(
        &mut self,
        aircraft: &[Aircraft],
        airspace: &dyn Airspace,
        queue: &mut ClearanceQueue,
    ) -> TickResult {
        let tick = self.clock.current_tick();
        let mut result = TickResult {
            tick,
            ..TickResult::default()
        };
        let mut traffic = Traffic::new(aircraft, queue);

        // STEP 1: forget aircraft that left
        self.prune_departed(&traffic, &mut result);

        // STEP 2: classification and hold entry
        for ac in traffic.aircraft() {
            match self.memberships.get(&ac.callsign).copied() {
                None => self.classify(ac, &mut traffic, &mut result),
                Some(Membership {
                    state: HoldState::PendingEnterHold,
                    stack: Some(stack),
                }) => self.confirm_hold_entry(ac, stack, &mut traffic, airspace, &mut result),
                Some(_) => {}
            }
        }

        // STEP 3: the last release stops constraining once established
        self.clear_cursor_if_established(&traffic);

        // STEP 4-6: selection, spacing, release
        if let Some(stack_index) = self.select_release_stack(&traffic) {
            self.try_release(stack_index, &mut traffic, airspace, &mut result);
        }

        self.check_invariants(&traffic);
        self.clock.advance_tick();
        result
    }

    fn prune_departed(&mut self, traffic: &Traffic, result: &mut TickResult) {
        let tick = self.clock.current_tick();
        let departed: Vec<(String, Membership)> = self
            .memberships
            .iter()
            .filter(|(cs, _)| !traffic.contains(cs))
            .map(|(cs, m)| (cs.clone(), *m))
            .collect();

        for (callsign, membership) in departed {
            if let Some(stack) = membership.stack.and_then(|id| self.stacks.get_mut(id.0)) {
                stack.remove_pending_entry(&callsign);
                stack.remove_active(&callsign);
            }
            self.memberships.remove(&callsign);
            if self.last_dispatched.as_deref() == Some(callsign.as_str()) {
                self.last_dispatched = None;
            }
            debug!(callsign = %callsign, state = ?membership.state, "aircraft departed");
            self.event_log.log(Event::AircraftDeparted { tick, callsign });
            result.num_departed += 1;
        }
    }

    /// Assign an unseen aircraft to a stack and slot
    fn classify(&mut self, aircraft: &Aircraft, traffic: &mut Traffic, result: &mut TickResult) {
        let tick = self.clock.current_tick();
        let callsign = aircraft.callsign.as_str();
        let Some(latest) = traffic.latest_clearance(callsign).cloned() else {
            return;
        };
        if latest.route.len() < 2 {
            return;
        }

        let Some(rule) = self.entry_rules.match_route(&latest.route).cloned() else {
            let rendered = latest.route.to_string();
            if self.reported_unmatched.insert(rendered.clone()) {
                warn!(callsign, route = %rendered, "route matches no hold entry, skipping");
                self.event_log.log(Event::UnmatchedRoute {
                    tick,
                    callsign: callsign.to_string(),
                    route: rendered,
                });
            }
            result.num_unmatched += 1;
            return;
        };

        let Some(stack) = self.stacks.get_mut(rule.stack.0) else {
            self.report_violation(format!("entry rule points at missing {}", rule.stack));
            return;
        };

        if let Err(err) = self.memberships.track_pending(callsign, rule.stack) {
            let detail = err.to_string();
            error!(callsign, %detail, "membership invariant violated");
            self.event_log.log(Event::InvariantViolation { tick, detail });
            return;
        }

        // Above every claimed layer, including actives left above a pending
        // aircraft by a refused swap
        let new_alt = stack
            .highest_pending_or_active_altitude(traffic)
            .max(stack.highest_active_altitude(traffic))
            .map_or(stack.min_altitude_ft(), |alt| alt + stack.interval_ft())
            .max(stack.min_altitude_ft());

        let mut clearance = latest.with_route(rule.rewrite(&latest.route, stack.release_legs()));
        clearance.cleared_alt_ft = new_alt;
        clearance.deactivate_all_alt_restrictions();
        traffic.issue(callsign, clearance);
        stack.add_pending_entry(callsign);

        debug!(
            callsign,
            stack = %stack.name(),
            cleared_alt_ft = new_alt,
            action = ?rule.action,
            "classified into holding stack"
        );
        self.event_log.log(Event::Classified {
            tick,
            callsign: callsign.to_string(),
            stack: stack.name().to_string(),
            cleared_alt_ft: new_alt,
            appended: rule.action == EntryAction::Append,
        });
        result.num_classified += 1;
    }

    /// Move a pending aircraft into the hold once it flies only the hold leg
    fn confirm_hold_entry(
        &mut self,
        aircraft: &Aircraft,
        stack_id: StackId,
        traffic: &mut Traffic,
        airspace: &dyn Airspace,
        result: &mut TickResult,
    ) {
        if !aircraft.acting_clearance.route.is_only_hold() {
            return;
        }

        let tick = self.clock.current_tick();
        let callsign = aircraft.callsign.as_str();
        let swap_min_nm = self.config.params.swap_min_remaining_nm;

        if let Err(err) = self.memberships.transition(callsign, HoldState::InHold) {
            self.report_violation(err.to_string());
            return;
        }
        let Some(stack) = self.stacks.get_mut(stack_id.0) else {
            self.report_violation(format!("{} bound to missing {}", callsign, stack_id));
            return;
        };
        let Some(latest) = traffic.latest_clearance(callsign).cloned() else {
            return;
        };

        stack.remove_pending_entry(callsign);

        let interval = stack.interval_ft();
        let floor = stack.min_altitude_ft();
        let ideal_alt = stack
            .highest_active_altitude(traffic)
            .map_or(floor, |alt| alt + interval)
            .max(floor)
            .min(latest.cleared_alt_ft);

        let mut current_alt = latest.cleared_alt_ft;
        let mut swap_events = Vec::new();
        while current_alt > ideal_alt {
            let Some(other) = stack
                .find_swappable_lower_pending_aircraft(current_alt, swap_min_nm, traffic, airspace)
                .map(str::to_string)
            else {
                break;
            };
            let Some(other_latest) = traffic.latest_clearance(&other).cloned() else {
                break;
            };

            traffic.issue(&other, other_latest.with_cleared_alt(current_alt));
            traffic.issue(callsign, latest.with_cleared_alt(current_alt - interval));

            debug!(
                entering = callsign,
                pending = %other,
                from_alt_ft = current_alt,
                to_alt_ft = current_alt - interval,
                "swapped hold slots"
            );
            swap_events.push(Event::AltitudeSwap {
                tick,
                stack: stack.name().to_string(),
                entering: callsign.to_string(),
                pending: other,
                entering_alt_ft: current_alt - interval,
                pending_alt_ft: current_alt,
            });
            current_alt -= interval;
        }

        stack.add_active(callsign);
        info!(callsign, stack = %stack.name(), cleared_alt_ft = current_alt, "entered hold");

        result.num_swaps += swap_events.len();
        result.num_entered_hold += 1;
        let entered = Event::EnteredHold {
            tick,
            callsign: callsign.to_string(),
            stack: stack.name().to_string(),
            cleared_alt_ft: current_alt,
        };
        for event in swap_events {
            self.event_log.log(event);
        }
        self.event_log.log(entered);
    }

    fn clear_cursor_if_established(&mut self, traffic: &Traffic) {
        let Some(leader) = self.last_dispatched.as_deref() else {
            return;
        };
        let cleared = traffic.get(leader).map_or(true, |ac| ac.localizer_captured);
        if cleared {
            debug!(callsign = leader, "previous release no longer constrains spacing");
            self.event_log.log(Event::LeaderCleared {
                tick: self.clock.current_tick(),
                callsign: leader.to_string(),
            });
            self.last_dispatched = None;
        }
    }

    /// Stack holding the longest-held eligible aircraft
    ///
    /// Every stack is re-sorted and has its tick advanced, eligible or not.
    fn select_release_stack(&mut self, traffic: &Traffic) -> Option<usize> {
        let band_ft = self.config.params.release_altitude_band_ft as f64;
        let mut best: Option<(usize, u64)> = None;

        for (index, stack) in self.stacks.iter_mut().enumerate() {
            stack.sort_active_by_cleared_altitude(traffic);
            if let Some(first) = stack.first_active() {
                let near_floor = traffic
                    .get(&first.callsign)
                    .is_some_and(|ac| ac.altitude_ft - stack.min_altitude_ft() as f64 <= band_ft);
                let older = best.map_or(true, |(_, entered)| first.tick_entered < entered);
                if near_floor && older {
                    best = Some((index, first.tick_entered));
                }
            }
            stack.advance_tick();
        }

        best.map(|(index, _)| index)
    }

    fn try_release(
        &mut self,
        stack_index: usize,
        traffic: &mut Traffic,
        airspace: &dyn Airspace,
        result: &mut TickResult,
    ) {
        let tick = self.clock.current_tick();
        let Some(candidate) = self.stacks[stack_index]
            .first_active()
            .and_then(|entry| traffic.get(&entry.callsign))
        else {
            return;
        };
        let leader = self.last_dispatched.as_deref().and_then(|cs| traffic.get(cs));

        let decision = spacing::evaluate(candidate, leader, self.merge_point, airspace, &self.config.params);
        let permitted = decision.permits_release();
        if let SpacingDecision::Insufficient {
            leader,
            gap_nm,
            required_nm,
        } = &decision
        {
            debug!(
                callsign = %candidate.callsign,
                leader = %leader,
                gap_nm,
                required_nm,
                "holding for spacing"
            );
            self.event_log.log(Event::SpacingHeld {
                tick,
                callsign: candidate.callsign.clone(),
                leader: leader.clone(),
                gap_nm: *gap_nm,
                required_nm: *required_nm,
            });
        }
        result.spacing = Some(decision);
        if !permitted {
            return;
        }

        let callsign = candidate.callsign.clone();
        let Some(latest) = traffic.latest_clearance(&callsign).cloned() else {
            return;
        };
        let approach = &self.config.approach;
        let mut clearance = latest.with_route(approach.route.clone());
        clearance.cleared_alt_ft = approach.intercept_altitude_ft;
        clearance.cleared_app = Some(approach.name.clone());
        clearance.cleared_trans = Some(approach.transition.clone());
        traffic.issue(&callsign, clearance);

        let stack = &mut self.stacks[stack_index];
        stack.remove_first_active();
        let active_moved = stack.push_all_active_down_one_layer(traffic);
        let pending_moved = stack.push_all_pending_down_one_layer(traffic);
        let stack_name = stack.name().to_string();

        info!(
            callsign = %callsign,
            stack = %stack_name,
            active_moved,
            pending_moved,
            "released from hold"
        );

        if let Err(err) = self.memberships.transition(&callsign, HoldState::ExitedHold) {
            self.report_violation(err.to_string());
        }
        self.event_log.log(Event::Released {
            tick,
            callsign: callsign.clone(),
            stack: stack_name,
        });
        self.last_dispatched = Some(callsign.clone());
        result.released = Some(callsign);
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Describe every way stack contents and memberships disagree
    ///
    /// Empty when the scheduler is consistent: each callsign sits in at most
    /// one stack collection, and that collection matches its membership.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen: HashMap<&str, (StackId, HoldState)> = HashMap::new();

        for stack in &self.stacks {
            let pending = stack.pending().iter().map(|cs| (cs.as_str(), HoldState::PendingEnterHold));
            let active = stack.active().iter().map(|e| (e.callsign.as_str(), HoldState::InHold));
            for (callsign, state) in pending.chain(active) {
                if let Some((other, _)) = seen.insert(callsign, (stack.id(), state)) {
                    problems.push(format!("{} appears in both {} and {}", callsign, other, stack.id()));
                }
                let expected = Membership {
                    state,
                    stack: Some(stack.id()),
                };
                if self.memberships.get(callsign) != Some(&expected) {
                    problems.push(format!(
                        "{} is {:?} in {} but membership says {:?}",
                        callsign,
                        state,
                        stack.id(),
                        self.memberships.get(callsign)
                    ));
                }
            }
        }

        for (callsign, membership) in self.memberships.iter() {
            if membership.state != HoldState::ExitedHold && !seen.contains_key(callsign.as_str()) {
                problems.push(format!("{} is {:?} but in no stack", callsign, membership.state));
            }
        }

        problems
    }

    /// Active aircraft of one stack sharing a cleared altitude
    ///
    /// Needs the tick's traffic because cleared altitudes live in the
    /// aircraft clearances, not in the stacks.
    pub fn layer_violations(&self, traffic: &Traffic) -> Vec<String> {
        let mut problems = Vec::new();
        for stack in &self.stacks {
            let mut layers: HashMap<i32, &str> = HashMap::new();
            for entry in stack.active() {
                let Some(alt) = traffic.cleared_altitude(&entry.callsign) else {
                    continue;
                };
                if let Some(other) = layers.insert(alt, entry.callsign.as_str()) {
                    problems.push(format!(
                        "{} and {} share {} ft in {}",
                        other,
                        entry.callsign,
                        alt,
                        stack.name()
                    ));
                }
            }
        }
        problems
    }

    fn check_invariants(&mut self, traffic: &Traffic) {
        let mut problems = self.invariant_violations();
        problems.extend(self.layer_violations(traffic));
        for detail in problems {
            self.report_violation(detail);
        }
    }

    fn report_violation(&mut self, detail: String) {
        error!(tick = self.clock.current_tick(), %detail, "scheduler invariant violated");
        self.event_log.log(Event::InvariantViolation {
            tick: self.clock.current_tick(),
            detail,
        });
    }

    // ========================================================================
    // Checkpoint support
    // ========================================================================

    pub(crate) fn stacks_mut(&mut self) -> &mut [HoldStack] {
        &mut self.stacks
    }

    pub(crate) fn restore_runtime(
        &mut self,
        tick: u64,
        memberships: MembershipTable,
        last_dispatched: Option<String>,
        reported_unmatched: Vec<String>,
    ) {
        self.clock = TickClock::starting_at(tick);
        self.memberships = memberships;
        self.last_dispatched = last_dispatched;
        self.reported_unmatched = reported_unmatched.into_iter().collect();
    }

    /// Unmatched route renderings already warned about, sorted
    pub(crate) fn reported_unmatched(&self) -> Vec<String> {
        let mut routes: Vec<String> = self.reported_unmatched.iter().cloned().collect();
        routes.sort();
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airspace::StaticAirspace;
    use crate::dispatch::config::{ApproachConfig, EntryRule, HoldStackConfig};
    use crate::models::route::{Route, TurnDirection};

    fn config() -> DispatchConfig {
        DispatchConfig {
            merge_waypoint: "MERGE".to_string(),
            approach: ApproachConfig {
                name: "ILS 02L".to_string(),
                course_deg: 0.0,
                transition: "vectors".to_string(),
                intercept_altitude_ft: 3500,
                route: Route::new(),
            },
            stacks: vec![HoldStackConfig {
                name: "SOUTH".to_string(),
                bearing_offset_deg: 0.0,
                distance_nm: 10.0,
                min_altitude_ft: 5000,
                inbound_course_deg: 0,
                leg_distance_nm: 5,
                turn_direction: TurnDirection::Right,
            }],
            entry_rules: vec![EntryRule {
                second_last: "ALPHA".to_string(),
                last: "BRAVO".to_string(),
                stack: "SOUTH".to_string(),
                action: EntryAction::ReplaceLast,
                clear_speed_restriction: false,
            }],
            params: Default::default(),
        }
    }

    fn airspace() -> StaticAirspace {
        StaticAirspace::new()
            .with_waypoint(1, "MERGE", DVec2::ZERO)
            .with_waypoint(2, "ALPHA", DVec2::new(0.0, -40.0))
            .with_waypoint(3, "BRAVO", DVec2::new(0.0, -20.0))
    }

    #[test]
    fn test_hold_fix_placed_on_reciprocal_course() {
        let mut airspace = airspace();
        let scheduler = HoldAndDispatch::new(config(), &mut airspace).unwrap();
        let fix = scheduler.stacks()[0].fix_position();

        assert!(fix.x.abs() < 1e-9);
        assert!((fix.y + 10.0).abs() < 1e-9);
        assert_eq!(airspace.waypoint_id("SOUTH"), Some(scheduler.stacks()[0].fix()));
    }

    #[test]
    fn test_unknown_merge_waypoint_rejected() {
        let mut airspace = StaticAirspace::new();
        assert!(matches!(
            HoldAndDispatch::new(config(), &mut airspace),
            Err(DispatchError::UnknownWaypoint(name)) if name == "MERGE"
        ));
    }

    #[test]
    fn test_empty_tick_advances_clock() {
        let mut airspace = airspace();
        let mut scheduler = HoldAndDispatch::new(config(), &mut airspace).unwrap();
        let mut queue = ClearanceQueue::new();

        let first = scheduler.update(&[], &airspace, &mut queue);
        let second = scheduler.update(&[], &airspace, &mut queue);

        assert_eq!(first.tick, 0);
        assert_eq!(second.tick, 1);
        assert!(queue.is_empty());
        assert!(scheduler.invariant_violations().is_empty());
    }
}
