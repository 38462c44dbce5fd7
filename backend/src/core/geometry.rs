//! Plane geometry in nautical miles
//!
//! Positions are `DVec2` in nm with x pointing east and y pointing north.
//! Bearings and tracks are compass degrees in `[0, 360)`: 0 is north, 90 is
//! east. Velocities are `DVec2` in knots using the same axes.

use glam::DVec2;

/// Unit vector pointing along a compass bearing
pub fn bearing_unit_vector(bearing_deg: f64) -> DVec2 {
    let rad = bearing_deg.to_radians();
    DVec2::new(rad.sin(), rad.cos())
}

/// Point `distance_nm` away from `origin` along `bearing_deg`
///
/// # Example
/// ```
/// use glam::DVec2;
/// use hold_dispatch_core::core::offset_by_bearing;
///
/// let p = offset_by_bearing(DVec2::ZERO, 90.0, 10.0);
/// assert!((p.x - 10.0).abs() < 1e-9);
/// assert!(p.y.abs() < 1e-9);
/// ```
pub fn offset_by_bearing(origin: DVec2, bearing_deg: f64, distance_nm: f64) -> DVec2 {
    origin + bearing_unit_vector(bearing_deg) * distance_nm
}

/// Straight-line distance between two points
pub fn distance_nm(from: DVec2, to: DVec2) -> f64 {
    from.distance(to)
}

/// Compass track of a velocity vector
///
/// A zero vector has no track; 0 is returned.
pub fn track_of(velocity: DVec2) -> f64 {
    if velocity.length_squared() == 0.0 {
        return 0.0;
    }
    normalize_deg(velocity.x.atan2(velocity.y).to_degrees())
}

/// Compass track required to fly from `from` directly to `to`
pub fn required_track(from: DVec2, to: DVec2) -> f64 {
    track_of(to - from)
}

/// Signed turn from `from_deg` to `to_deg` along the shorter direction
///
/// Positive is a right (clockwise) turn. Result lies in `(-180, 180]`.
///
/// # Example
/// ```
/// use hold_dispatch_core::core::delta_heading;
///
/// assert_eq!(delta_heading(350.0, 10.0), 20.0);
/// assert_eq!(delta_heading(10.0, 350.0), -20.0);
/// ```
pub fn delta_heading(from_deg: f64, to_deg: f64) -> f64 {
    let mut delta = (to_deg - from_deg) % 360.0;
    if delta <= -180.0 {
        delta += 360.0;
    } else if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

fn normalize_deg(deg: f64) -> f64 {
    let wrapped = deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Estimated distance flown to reach `dest`, including the turn onto the
/// direct track
///
/// The aircraft turns at `max_turn_rate_deg_per_sec` with the radius implied
/// by its ground speed. The turn displaces it laterally and along track
/// before it can proceed direct; the arc length of the turn itself is added.
/// Offsets up to 90 degrees displace laterally by `r·sin θ`, larger offsets
/// by `r·(1 − cos θ)`.
pub fn distance_to_point_with_turn(
    position: DVec2,
    dest: DVec2,
    ground_velocity_kts: DVec2,
    max_turn_rate_deg_per_sec: f64,
) -> f64 {
    let gs_nm_per_sec = ground_velocity_kts.length() / 3600.0;
    let turn_radius_nm = if max_turn_rate_deg_per_sec > 0.0 {
        gs_nm_per_sec / max_turn_rate_deg_per_sec.to_radians()
    } else {
        0.0
    };

    let degree_offset = delta_heading(track_of(ground_velocity_kts), required_track(position, dest)).abs();
    let offset_rad = degree_offset.to_radians();

    let horizontal_offset = turn_radius_nm
        * if degree_offset <= 90.0 {
            offset_rad.sin()
        } else {
            1.0 - offset_rad.cos()
        };
    let vertical_offset = turn_radius_nm * offset_rad.sin();
    let dist_from_point = distance_nm(position, dest);

    ((dist_from_point - vertical_offset).powi(2) + horizontal_offset.powi(2)).sqrt()
        + turn_radius_nm * offset_rad
}

/// Indicated airspeed from true airspeed at a pressure altitude
///
/// Uses the ISA troposphere density ratio `σ = (1 − 6.8756e-6·h)^4.2559`,
/// `IAS ≈ TAS·√σ`.
pub fn ias_from_tas(altitude_ft: f64, tas_kts: f64) -> f64 {
    let base = (1.0 - 6.8756e-6 * altitude_ft.max(0.0)).max(0.0);
    tas_kts * base.powf(4.2559).sqrt()
}
