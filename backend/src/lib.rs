//! Hold and Dispatch Core - arrival holding scheduler
//!
//! Classifies inbound arrivals into holding stacks, stacks them vertically,
//! and releases them one at a time onto the final approach with enough
//! in-trail spacing at the merge point.
//!
//! # Architecture
//!
//! - **core**: Tick counter and flat-earth geometry
//! - **models**: Domain types (Route, ClearanceState, Aircraft, memberships, events)
//! - **airspace**: Collaborators owned by the surrounding simulation
//! - **hold**: Holding stacks
//! - **dispatch**: Configuration, classification, spacing and the tick loop
//!
//! # Critical Invariants
//!
//! 1. An aircraft is in at most one stack collection at a time
//! 2. No aircraft is cleared below its stack's floor
//! 3. The scheduler only queues clearance intents; it never edits aircraft
//!
//! # Example
//!
//! ```rust
//! use hold_dispatch_core::{ClearanceQueue, DispatchConfig, HoldAndDispatch, StaticAirspace};
//! use glam::DVec2;
//!
//! let config = DispatchConfig::from_json_str(r#"{
//!     "merge_waypoint": "MENNU",
//!     "approach": { "name": "ILS 02L", "course_deg": 20.0, "route": [] },
//!     "stacks": [{
//!         "name": "ILS-02L-LEFT-HOLD", "bearing_offset_deg": 20.0, "distance_nm": 10.0,
//!         "min_altitude_ft": 5000, "inbound_course_deg": 43,
//!         "leg_distance_nm": 5, "turn_direction": "left"
//!     }],
//!     "entry_rules": []
//! }"#).unwrap();
//!
//! let mut airspace = StaticAirspace::new().with_waypoint(1, "MENNU", DVec2::ZERO);
//! let mut scheduler = HoldAndDispatch::new(config, &mut airspace).unwrap();
//!
//! let mut queue = ClearanceQueue::new();
//! let result = scheduler.update(&[], &airspace, &mut queue);
//! assert_eq!(result.tick, 0);
//! assert!(result.released.is_none());
//! ```

// Module declarations
pub mod airspace;
pub mod core;
pub mod dispatch;
pub mod hold;
pub mod models;

// Re-exports for convenience
pub use airspace::{Airspace, StaticAirspace};
pub use core::time::TickClock;
pub use dispatch::{
    DispatchConfig, DispatchError, DispatchParams, HoldAndDispatch, SchedulerSnapshot,
    SpacingDecision, TickResult,
};
pub use hold::{HoldEntry, HoldPattern, HoldStack, StackId};
pub use models::{
    aircraft::{Aircraft, AircraftPerf},
    clearance::ClearanceState,
    event::{Event, EventLog},
    membership::{HoldState, Membership, MembershipError, MembershipTable},
    route::{Leg, Route, WaypointId},
    traffic::{ClearanceQueue, ClearanceRequest, Traffic},
};
