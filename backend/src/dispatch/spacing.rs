//! Release spacing gate
//!
//! A held aircraft may leave only when it will end up far enough behind the
//! previously released aircraft at the merge point. The follower's distance
//! is estimated with a turn-aware projection; the leader's is straight line.
//! A leader whose track has swung well away from the merge point is no
//! longer a factor.

use crate::airspace::Airspace;
use crate::core::geometry::{delta_heading, distance_nm, distance_to_point_with_turn, required_track};
use crate::dispatch::config::{DispatchParams, TurnPerformance};
use crate::models::aircraft::Aircraft;
use glam::DVec2;
use serde::Serialize;

/// Outcome of one spacing evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SpacingDecision {
    /// Nothing released yet, or the last release no longer constrains
    NoLeader,
    /// Leader has turned away from the merge point
    LeaderDiverged { leader: String, deviation_deg: f64 },
    Satisfied {
        leader: String,
        gap_nm: f64,
        required_nm: f64,
    },
    Insufficient {
        leader: String,
        gap_nm: f64,
        required_nm: f64,
    },
}

impl SpacingDecision {
    pub fn permits_release(&self) -> bool {
        !matches!(self, SpacingDecision::Insufficient { .. })
    }
}

/// Speed-dependent buffer added on top of the floored wake requirement
pub fn additional_spacing_nm(required_nm: f64, leader_app_spd_kts: f64, params: &DispatchParams) -> f64 {
    let model = &params.spacing;
    let v = leader_app_spd_kts.max(1.0);
    let close_pair = if required_nm < model.close_pair_threshold_nm {
        model.close_pair_adjustment_nm
    } else {
        0.0
    };

    model.reference_distance_nm * (model.reference_speed_kts - v) / v
        + (required_nm - model.reference_distance_nm).max(0.0) * (model.large_gap_reference_speed_kts - v) / v
        + close_pair
        + model.transition_buffer_nm
        + params.dispatch_spacing_buffer_nm
}

/// Total distance the follower must trail the leader by at the merge point
///
/// # Example
/// ```
/// use hold_dispatch_core::dispatch::config::DispatchParams;
/// use hold_dispatch_core::dispatch::spacing::required_spacing_nm;
///
/// let params = DispatchParams::default();
/// // A 190 kt leader with a large wake requirement gets only the constant buffers
/// let nm = required_spacing_nm(6.4, 190.0, &params);
/// assert!((nm - (6.4 + 4.4 * 30.0 / 190.0 + 0.5)).abs() < 1e-9);
/// ```
pub fn required_spacing_nm(wake_separation_nm: f64, leader_app_spd_kts: f64, params: &DispatchParams) -> f64 {
    let floored = wake_separation_nm.max(params.min_dispatch_separation_nm);
    floored + additional_spacing_nm(floored, leader_app_spd_kts, params)
}

/// Turn rate used for an aircraft's turn-aware projection
pub fn turn_rate_deg_per_sec(aircraft: &Aircraft, turn: &TurnPerformance) -> f64 {
    if aircraft.indicated_airspeed_kts() > turn.half_rate_threshold_ias_kts {
        turn.high_speed_rate_deg_per_sec
    } else {
        turn.low_speed_rate_deg_per_sec
    }
}

/// Estimated distance the candidate flies to reach the merge point
pub fn estimated_travel_nm(candidate: &Aircraft, merge_point: DVec2, turn: &TurnPerformance) -> f64 {
    distance_to_point_with_turn(
        candidate.position,
        merge_point,
        candidate.ground_track_kts,
        turn_rate_deg_per_sec(candidate, turn),
    )
}

/// Evaluate whether `candidate` may be released behind `leader`
pub fn evaluate(
    candidate: &Aircraft,
    leader: Option<&Aircraft>,
    merge_point: DVec2,
    airspace: &dyn Airspace,
    params: &DispatchParams,
) -> SpacingDecision {
    let Some(leader) = leader else {
        return SpacingDecision::NoLeader;
    };

    let deviation_deg = delta_heading(leader.track_deg(), required_track(leader.position, merge_point)).abs();
    if deviation_deg > params.leader_divergence_threshold_deg {
        return SpacingDecision::LeaderDiverged {
            leader: leader.callsign.clone(),
            deviation_deg,
        };
    }

    let wake_nm = airspace.required_separation_nm(&leader.perf, &candidate.perf);
    let required_nm = required_spacing_nm(wake_nm, leader.perf.app_spd_kts as f64, params);
    let gap_nm = estimated_travel_nm(candidate, merge_point, &params.turn) - distance_nm(leader.position, merge_point);

    if gap_nm >= required_nm {
        SpacingDecision::Satisfied {
            leader: leader.callsign.clone(),
            gap_nm,
            required_nm,
        }
    } else {
        SpacingDecision::Insufficient {
            leader: leader.callsign.clone(),
            gap_nm,
            required_nm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_pair_adjustment_applies_below_threshold() {
        let params = DispatchParams::default();
        let slow = additional_spacing_nm(2.5, 190.0, &params);
        let wide = additional_spacing_nm(3.0, 190.0, &params);
        assert!((wide - slow - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_slower_leader_needs_more_spacing() {
        let params = DispatchParams::default();
        assert!(required_spacing_nm(3.0, 130.0, &params) > required_spacing_nm(3.0, 160.0, &params));
    }

    #[test]
    fn test_wake_floor_applies() {
        let params = DispatchParams::default();
        assert_eq!(
            required_spacing_nm(0.0, 150.0, &params),
            required_spacing_nm(2.5, 150.0, &params)
        );
    }

    #[test]
    fn test_large_requirement_scales_with_speed() {
        let params = DispatchParams::default();
        // Requirement above 6.4 nm adds (req - 6.4) * (195 - v) / v
        let base = additional_spacing_nm(6.4, 150.0, &params);
        let large = additional_spacing_nm(8.4, 150.0, &params);
        assert!((large - base - 2.0 * 45.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_insufficient_blocks() {
        assert!(SpacingDecision::NoLeader.permits_release());
        assert!(SpacingDecision::LeaderDiverged {
            leader: "A".to_string(),
            deviation_deg: 45.0
        }
        .permits_release());
        assert!(!SpacingDecision::Insufficient {
            leader: "A".to_string(),
            gap_nm: 1.0,
            required_nm: 5.0
        }
        .permits_release());
    }
}
