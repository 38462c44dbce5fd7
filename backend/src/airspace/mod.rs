//! Collaborators owned by the surrounding simulation
//!
//! The scheduler needs four things from the world it runs in: fix lookup,
//! registration of synthetic hold fixes, wake separation and distance-to-go.
//! They are gathered behind the [`Airspace`] trait. [`StaticAirspace`] is an
//! in-memory implementation used by tests and the replay runner.

pub mod wake;

use crate::core::geometry::distance_nm;
use crate::models::aircraft::AircraftPerf;
use crate::models::route::{Leg, Route, WaypointId};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub trait Airspace {
    /// Fix id for a published or registered waypoint name
    fn waypoint_id(&self, name: &str) -> Option<WaypointId>;

    fn waypoint_position(&self, id: WaypointId) -> Option<DVec2>;

    /// Create (or look up) a synthetic fix; idempotent per name
    ///
    /// `None` when no free fix id is left.
    fn register_waypoint(&mut self, name: &str, position: DVec2) -> Option<WaypointId>;

    /// Required wake separation of `follower` behind `leader`
    fn required_separation_nm(&self, leader: &AircraftPerf, follower: &AircraftPerf) -> f64 {
        wake::required_separation_nm(
            leader.wake_category,
            leader.recat,
            follower.wake_category,
            follower.recat,
        )
    }

    /// Distance from `position` along `route` to the route's hold fix
    ///
    /// Walks waypoint legs in order and stops at the first hold leg. A vector
    /// or discontinuity leg ends the walk; fixes that cannot be resolved are
    /// skipped.
    fn distance_to_go_nm(&self, position: DVec2, route: &Route) -> f64 {
        let mut total = 0.0;
        let mut from = position;
        for leg in route.legs() {
            let fix = match leg {
                Leg::Waypoint(wpt) => wpt.wpt_id,
                Leg::Hold(hold) => hold.wpt_id,
                Leg::Vector(_) | Leg::Discontinuity => break,
            };
            if let Some(to) = self.waypoint_position(fix) {
                total += distance_nm(from, to);
                from = to;
            }
            if leg.is_hold() {
                break;
            }
        }
        total
    }
}

/// Named fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedWaypoint {
    pub name: String,
    pub position: DVec2,
}

/// In-memory waypoint database with the default wake table
///
/// # Example
/// ```
/// use glam::DVec2;
/// use hold_dispatch_core::airspace::{Airspace, StaticAirspace};
/// use hold_dispatch_core::models::route::WaypointId;
///
/// let mut airspace = StaticAirspace::new().with_waypoint(15, "DOGGO", DVec2::new(3.0, 4.0));
/// assert_eq!(airspace.waypoint_id("DOGGO"), Some(WaypointId(15)));
///
/// let hold_fix = airspace.register_waypoint("LEFT-HOLD", DVec2::new(0.0, 10.0));
/// assert_eq!(hold_fix, Some(WaypointId(16)));
/// assert_eq!(airspace.register_waypoint("LEFT-HOLD", DVec2::new(0.0, 10.0)), hold_fix);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticAirspace {
    waypoints: BTreeMap<u16, NamedWaypoint>,
}

impl StaticAirspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a published waypoint with a fixed id
    pub fn with_waypoint(mut self, id: u16, name: &str, position: DVec2) -> Self {
        self.insert_waypoint(id, name, position);
        self
    }

    pub fn insert_waypoint(&mut self, id: u16, name: &str, position: DVec2) {
        self.waypoints.insert(
            id,
            NamedWaypoint {
                name: name.to_string(),
                position,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

impl Airspace for StaticAirspace {
    fn waypoint_id(&self, name: &str) -> Option<WaypointId> {
        self.waypoints
            .iter()
            .find(|(_, w)| w.name == name)
            .map(|(&id, _)| WaypointId(id))
    }

    fn waypoint_position(&self, id: WaypointId) -> Option<DVec2> {
        self.waypoints.get(&id.0).map(|w| w.position)
    }

    fn register_waypoint(&mut self, name: &str, position: DVec2) -> Option<WaypointId> {
        if let Some(existing) = self.waypoint_id(name) {
            if let Some(wpt) = self.waypoints.get_mut(&existing.0) {
                wpt.position = position;
            }
            return Some(existing);
        }
        // One past the highest id, else the first gap
        let next = match self.waypoints.keys().next_back() {
            None => Some(0),
            Some(&max) => max
                .checked_add(1)
                .or_else(|| (0..=u16::MAX).find(|id| !self.waypoints.contains_key(id))),
        }?;
        self.insert_waypoint(next, name, position);
        Some(WaypointId(next))
    }
}
