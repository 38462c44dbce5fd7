//! Clearance state issued to an aircraft

use crate::models::route::Route;
use serde::{Deserialize, Serialize};

/// Everything an aircraft has been cleared to do
///
/// The scheduler never edits a clearance in place: it copies the latest one,
/// changes the copy and queues it as a new intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceState {
    pub route: Route,
    pub cleared_alt_ft: i32,
    /// Cleared indicated airspeed
    pub cleared_ias_kts: i16,
    #[serde(default)]
    pub cleared_app: Option<String>,
    #[serde(default)]
    pub cleared_trans: Option<String>,
    #[serde(default)]
    pub vector_hdg: Option<i16>,
}

impl ClearanceState {
    pub fn new(route: Route, cleared_alt_ft: i32, cleared_ias_kts: i16) -> Self {
        Self {
            route,
            cleared_alt_ft,
            cleared_ias_kts,
            cleared_app: None,
            cleared_trans: None,
            vector_hdg: None,
        }
    }

    /// Copy with a different cleared altitude, route unchanged
    pub fn with_cleared_alt(&self, cleared_alt_ft: i32) -> Self {
        Self {
            cleared_alt_ft,
            ..self.clone()
        }
    }

    /// Copy with a different route
    pub fn with_route(&self, route: Route) -> Self {
        Self {
            route,
            ..self.clone()
        }
    }

    pub fn deactivate_all_alt_restrictions(&mut self) {
        self.route.deactivate_all_alt_restrictions();
    }
}
