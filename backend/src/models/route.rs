//! Route legs and routes
//!
//! A route is an ordered list of legs held by value. Every rewrite the
//! scheduler performs copies the route, edits the copy and queues the copy
//! inside a new clearance; nothing aliases legs across aircraft.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a navigation fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WaypointId(pub u16);

impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Turn direction for holds and vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    /// Shortest direction
    #[default]
    Default,
    Left,
    Right,
}

/// Direct-to-fix leg with optional restrictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointLeg {
    pub wpt_id: WaypointId,
    pub max_alt_ft: Option<i32>,
    pub min_alt_ft: Option<i32>,
    pub max_spd_kts: Option<i16>,
    pub leg_active: bool,
    pub alt_restr_active: bool,
    pub spd_restr_active: bool,
}

impl WaypointLeg {
    /// Unrestricted leg to `wpt_id`
    pub fn new(wpt_id: WaypointId) -> Self {
        Self {
            wpt_id,
            max_alt_ft: None,
            min_alt_ft: None,
            max_spd_kts: None,
            leg_active: true,
            alt_restr_active: true,
            spd_restr_active: true,
        }
    }

    pub fn with_altitude_window(mut self, min_alt_ft: Option<i32>, max_alt_ft: Option<i32>) -> Self {
        self.min_alt_ft = min_alt_ft;
        self.max_alt_ft = max_alt_ft;
        self
    }

    pub fn with_max_speed(mut self, max_spd_kts: i16) -> Self {
        self.max_spd_kts = Some(max_spd_kts);
        self
    }
}

/// Racetrack hold flown repeatedly around a fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldLeg {
    pub wpt_id: WaypointId,
    pub max_alt_ft: Option<i32>,
    pub min_alt_ft: Option<i32>,
    /// Speed limit at or below the lower holding speed band
    pub max_spd_lower_kts: i16,
    /// Speed limit above the lower holding speed band
    pub max_spd_higher_kts: i16,
    pub inbound_hdg: i16,
    pub leg_dist_nm: u8,
    pub turn_dir: TurnDirection,
}

/// Fly a heading until further instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorLeg {
    pub heading: i16,
    pub turn_dir: TurnDirection,
}

/// One element of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Leg {
    Waypoint(WaypointLeg),
    Hold(HoldLeg),
    Vector(VectorLeg),
    /// Gap in the route; the aircraft continues present heading
    Discontinuity,
}

impl Leg {
    /// Fix referenced by a waypoint leg; other legs have none for suffix matching
    pub fn waypoint_id(&self) -> Option<WaypointId> {
        match self {
            Leg::Waypoint(leg) => Some(leg.wpt_id),
            _ => None,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Leg::Hold(_))
    }

    pub fn as_waypoint_mut(&mut self) -> Option<&mut WaypointLeg> {
        match self {
            Leg::Waypoint(leg) => Some(leg),
            _ => None,
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Waypoint(leg) => write!(f, "{}", leg.wpt_id),
            Leg::Hold(leg) => write!(f, "HOLD {} {:03}", leg.wpt_id, leg.inbound_hdg),
            Leg::Vector(leg) => write!(f, "HDG {:03}", leg.heading),
            Leg::Discontinuity => write!(f, "DISC"),
        }
    }
}

/// Ordered leg sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    legs: Vec<Leg>,
}

impl Route {
    pub fn new() -> Self {
        Self { legs: Vec::new() }
    }

    pub fn from_legs(legs: Vec<Leg>) -> Self {
        Self { legs }
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Leg> {
        self.legs.get(index)
    }

    pub fn last(&self) -> Option<&Leg> {
        self.legs.last()
    }

    pub fn push(&mut self, leg: Leg) {
        self.legs.push(leg);
    }

    /// Remove and return the last leg
    pub fn pop(&mut self) -> Option<Leg> {
        self.legs.pop()
    }

    /// Fix ids of the last two legs as `(second_last, last)`
    ///
    /// `None` when the route has fewer than two legs. Either id is `None`
    /// when that leg is not a waypoint leg.
    ///
    /// # Example
    /// ```
    /// use hold_dispatch_core::models::route::{Leg, Route, WaypointId, WaypointLeg};
    ///
    /// let route = Route::from_legs(vec![
    ///     Leg::Waypoint(WaypointLeg::new(WaypointId(143))),
    ///     Leg::Waypoint(WaypointLeg::new(WaypointId(15))),
    /// ]);
    /// assert_eq!(route.last_two_fixes(), Some((Some(WaypointId(143)), Some(WaypointId(15)))));
    /// ```
    pub fn last_two_fixes(&self) -> Option<(Option<WaypointId>, Option<WaypointId>)> {
        match self.legs.as_slice() {
            [.., second_last, last] => Some((second_last.waypoint_id(), last.waypoint_id())),
            _ => None,
        }
    }

    /// Exactly one leg and it is a hold
    pub fn is_only_hold(&self) -> bool {
        matches!(self.legs.as_slice(), [Leg::Hold(_)])
    }

    /// Deactivate every waypoint-leg altitude restriction
    pub fn deactivate_all_alt_restrictions(&mut self) {
        for leg in &mut self.legs {
            if let Leg::Waypoint(wpt) = leg {
                wpt.alt_restr_active = false;
            }
        }
    }

    /// Deactivate the speed restriction of the waypoint leg `offset_from_end`
    /// positions from the end (1 is the last leg)
    ///
    /// Returns false when there is no waypoint leg at that position.
    pub fn deactivate_speed_restriction_from_end(&mut self, offset_from_end: usize) -> bool {
        if offset_from_end == 0 || offset_from_end > self.legs.len() {
            return false;
        }
        let index = self.legs.len() - offset_from_end;
        match self.legs[index].as_waypoint_mut() {
            Some(wpt) => {
                wpt.spd_restr_active = false;
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, leg) in self.legs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", leg)?;
        }
        write!(f, "]")
    }
}

impl FromIterator<Leg> for Route {
    fn from_iter<I: IntoIterator<Item = Leg>>(iter: I) -> Self {
        Self {
            legs: iter.into_iter().collect(),
        }
    }
}
