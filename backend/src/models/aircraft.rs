//! Aircraft as seen by the scheduler
//!
//! The surrounding simulation owns aircraft; each tick it hands the
//! scheduler a slice of these read-only snapshots. Identity is the callsign.

use crate::airspace::wake::{RecatCategory, WakeCategory};
use crate::core::geometry::{ias_from_tas, track_of};
use crate::models::clearance::ClearanceState;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Performance data relevant to sequencing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftPerf {
    pub wake_category: WakeCategory,
    #[serde(default)]
    pub recat: Option<RecatCategory>,
    /// Final approach speed
    pub app_spd_kts: i16,
}

/// Per-tick aircraft snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub callsign: String,
    pub perf: AircraftPerf,
    /// Position in nm
    pub position: DVec2,
    /// Ground velocity in knots
    pub ground_track_kts: DVec2,
    pub true_airspeed_kts: f64,
    pub altitude_ft: f64,
    /// Clearance the aircraft is currently flying
    pub acting_clearance: ClearanceState,
    /// Most recent clearance intended for the aircraft (may not be acting yet)
    pub latest_clearance: ClearanceState,
    #[serde(default)]
    pub localizer_captured: bool,
}

impl Aircraft {
    pub fn ground_speed_kts(&self) -> f64 {
        self.ground_track_kts.length()
    }

    pub fn track_deg(&self) -> f64 {
        track_of(self.ground_track_kts)
    }

    pub fn indicated_airspeed_kts(&self) -> f64 {
        ias_from_tas(self.altitude_ft, self.true_airspeed_kts)
    }
}
