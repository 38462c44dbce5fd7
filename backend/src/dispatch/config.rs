//! Scheduler configuration
//!
//! Structural configuration (which waypoint is the merge point, which
//! stacks exist, which route suffixes lead into which stack) has no sensible
//! default and must be supplied. Numeric tuning lives in [`DispatchParams`],
//! where every field defaults to the values the scheduler was tuned with.

use crate::dispatch::engine::DispatchError;
use crate::models::route::{Route, TurnDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Reference waypoint: anchors hold-fix placement and is the merge point
    /// used for release spacing
    pub merge_waypoint: String,

    pub approach: ApproachConfig,

    /// One entry per holding stack, in stack id order
    pub stacks: Vec<HoldStackConfig>,

    /// Route-suffix table deciding which stack an arrival joins
    pub entry_rules: Vec<EntryRule>,

    #[serde(default)]
    pub params: DispatchParams,
}

/// Final approach every released aircraft is cleared for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachConfig {
    /// Approach name as issued in the clearance, e.g. `ILS 02L`
    pub name: String,
    /// Final approach course
    pub course_deg: f64,
    /// Transition name issued with the approach
    #[serde(default = "default_transition")]
    pub transition: String,
    #[serde(default = "default_intercept_altitude")]
    pub intercept_altitude_ft: i32,
    /// Legs of the approach procedure
    pub route: Route,
}

fn default_transition() -> String {
    "vectors".to_string()
}

fn default_intercept_altitude() -> i32 {
    3500
}

/// Placement and shape of one holding stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldStackConfig {
    /// Stack name, also the name of its synthetic hold fix
    pub name: String,
    /// Offset added to the reciprocal of the approach course when placing
    /// the fix relative to the merge waypoint
    pub bearing_offset_deg: f64,
    pub distance_nm: f64,
    pub min_altitude_ft: i32,
    pub inbound_course_deg: i16,
    pub leg_distance_nm: u8,
    pub turn_direction: TurnDirection,
}

/// How the stack's legs are spliced into a matching route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAction {
    /// Replace the last leg with the stack's fix and hold legs
    ReplaceLast,
    /// Keep the route and add the stack's fix and hold legs after it
    Append,
}

/// One recognized two-leg route suffix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRule {
    pub second_last: String,
    pub last: String,
    /// Target stack name
    pub stack: String,
    pub action: EntryAction,
    /// Drop the now-obsolete speed restriction three legs from the end of
    /// the rewritten route
    #[serde(default)]
    pub clear_speed_restriction: bool,
}

/// Numeric tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchParams {
    /// Altitude step between stacked aircraft
    pub hold_altitude_interval_ft: i32,
    /// A stack's lowest aircraft is releasable only within this band of the floor
    pub release_altitude_band_ft: i32,
    /// Pending aircraft must still be this far from the fix to swap slots
    pub swap_min_remaining_nm: f64,
    /// Floor for the wake separation requirement
    pub min_dispatch_separation_nm: f64,
    pub dispatch_spacing_buffer_nm: f64,
    /// Leader track deviation beyond which it no longer constrains spacing
    pub leader_divergence_threshold_deg: f64,
    pub spacing: SpacingModel,
    pub turn: TurnPerformance,
    pub fix_leg_max_speed_kts: i16,
    pub hold_max_speed_lower_kts: i16,
    pub hold_max_speed_higher_kts: i16,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            hold_altitude_interval_ft: 2000,
            release_altitude_band_ft: 500,
            swap_min_remaining_nm: 15.0,
            min_dispatch_separation_nm: 2.5,
            dispatch_spacing_buffer_nm: 0.5,
            leader_divergence_threshold_deg: 30.0,
            spacing: SpacingModel::default(),
            turn: TurnPerformance::default(),
            fix_leg_max_speed_kts: 250,
            hold_max_speed_lower_kts: 230,
            hold_max_speed_higher_kts: 240,
        }
    }
}

/// Empirical speed-dependent spacing buffer
///
/// Slower leaders compress less on final, so a time-based gap converted to
/// distance grows as the leader's approach speed drops below the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingModel {
    pub reference_speed_kts: f64,
    pub reference_distance_nm: f64,
    /// Reference speed for the part of the requirement above `reference_distance_nm`
    pub large_gap_reference_speed_kts: f64,
    pub close_pair_threshold_nm: f64,
    pub close_pair_adjustment_nm: f64,
    pub transition_buffer_nm: f64,
}

impl Default for SpacingModel {
    fn default() -> Self {
        Self {
            reference_speed_kts: 190.0,
            reference_distance_nm: 6.4,
            large_gap_reference_speed_kts: 195.0,
            close_pair_threshold_nm: 2.6,
            close_pair_adjustment_nm: -0.75,
            transition_buffer_nm: 4.4 * 30.0 / 190.0,
        }
    }
}

/// Turn rate limits used for turn-aware distance estimates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnPerformance {
    /// Above this IAS the aircraft turns at the high-speed rate
    pub half_rate_threshold_ias_kts: f64,
    pub high_speed_rate_deg_per_sec: f64,
    pub low_speed_rate_deg_per_sec: f64,
}

impl Default for TurnPerformance {
    fn default() -> Self {
        Self {
            half_rate_threshold_ias_kts: 250.0,
            high_speed_rate_deg_per_sec: 1.5,
            low_speed_rate_deg_per_sec: 3.0,
        }
    }
}

impl DispatchConfig {
    /// Parse from JSON
    pub fn from_json_str(json: &str) -> Result<Self, DispatchError> {
        let config: DispatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Index of the stack named `name`
    pub fn stack_index(&self, name: &str) -> Option<usize> {
        self.stacks.iter().position(|s| s.name == name)
    }

    /// Check internal consistency
    ///
    /// Waypoint names are resolved later against the airspace; this only
    /// checks what the configuration can know about itself. Two rules with
    /// the same suffix are rejected because the second could never match.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let params = &self.params;

        if self.stacks.is_empty() {
            return Err(DispatchError::InvalidConfig(
                "at least one holding stack is required".to_string(),
            ));
        }

        if params.hold_altitude_interval_ft <= 0 {
            return Err(DispatchError::InvalidConfig(format!(
                "hold_altitude_interval_ft must be > 0, got {}",
                params.hold_altitude_interval_ft
            )));
        }

        if params.release_altitude_band_ft < 0 {
            return Err(DispatchError::InvalidConfig(format!(
                "release_altitude_band_ft must be >= 0, got {}",
                params.release_altitude_band_ft
            )));
        }

        let finite = [
            ("swap_min_remaining_nm", params.swap_min_remaining_nm),
            ("min_dispatch_separation_nm", params.min_dispatch_separation_nm),
            ("dispatch_spacing_buffer_nm", params.dispatch_spacing_buffer_nm),
            ("leader_divergence_threshold_deg", params.leader_divergence_threshold_deg),
            ("spacing.transition_buffer_nm", params.spacing.transition_buffer_nm),
            ("spacing.close_pair_adjustment_nm", params.spacing.close_pair_adjustment_nm),
            ("spacing.reference_distance_nm", params.spacing.reference_distance_nm),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(DispatchError::InvalidConfig(format!("{} must be finite", name)));
            }
        }

        let positive = [
            ("spacing.reference_speed_kts", params.spacing.reference_speed_kts),
            ("spacing.large_gap_reference_speed_kts", params.spacing.large_gap_reference_speed_kts),
            ("turn.high_speed_rate_deg_per_sec", params.turn.high_speed_rate_deg_per_sec),
            ("turn.low_speed_rate_deg_per_sec", params.turn.low_speed_rate_deg_per_sec),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DispatchError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let mut names = HashSet::new();
        for stack in &self.stacks {
            if !names.insert(stack.name.as_str()) {
                return Err(DispatchError::DuplicateStack(stack.name.clone()));
            }
            if !(stack.distance_nm.is_finite() && stack.bearing_offset_deg.is_finite()) {
                return Err(DispatchError::InvalidConfig(format!(
                    "stack {} placement must be finite",
                    stack.name
                )));
            }
        }

        let mut suffixes = HashSet::new();
        for rule in &self.entry_rules {
            if self.stack_index(&rule.stack).is_none() {
                return Err(DispatchError::UnknownStack(rule.stack.clone()));
            }
            if !suffixes.insert((rule.second_last.as_str(), rule.last.as_str())) {
                return Err(DispatchError::DuplicateEntryRule {
                    second_last: rule.second_last.clone(),
                    last: rule.last.clone(),
                });
            }
        }

        Ok(())
    }
}
