//! Tick counting and plane geometry shared by every layer

pub mod geometry;
pub mod time;

pub use geometry::{
    bearing_unit_vector, delta_heading, distance_nm, distance_to_point_with_turn,
    ias_from_tas, offset_by_bearing, required_track, track_of,
};
pub use time::TickClock;
