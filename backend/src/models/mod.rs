//! Domain models for the holding scheduler

pub mod aircraft;
pub mod clearance;
pub mod event;
pub mod membership;
pub mod route;
pub mod traffic;

// Re-exports
pub use aircraft::{Aircraft, AircraftPerf};
pub use clearance::ClearanceState;
pub use event::{Event, EventLog};
pub use membership::{HoldState, Membership, MembershipError, MembershipTable};
pub use route::{HoldLeg, Leg, Route, TurnDirection, VectorLeg, WaypointId, WaypointLeg};
pub use traffic::{ClearanceQueue, ClearanceRequest, Traffic};
