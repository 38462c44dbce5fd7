//! Scheduler event log
//!
//! Every state change the scheduler makes is recorded as an [`Event`] so a
//! session can be audited or replayed after the fact:
//! - **Classified**: aircraft routed toward a stack
//! - **UnmatchedRoute**: route with no known hold entry (first report only)
//! - **EnteredHold** / **AltitudeSwap**: hold entry confirmation
//! - **SpacingHeld** / **Released** / **LeaderCleared**: dispatch
//! - **AircraftDeparted**: tracked aircraft left the simulation
//! - **InvariantViolation**: logical impossibility detected
//!
//! # Example
//!
//! ```rust
//! use hold_dispatch_core::models::event::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Released {
//!     tick: 12,
//!     callsign: "SIA321".to_string(),
//!     stack: "ILS-02L-LEFT-HOLD".to_string(),
//! });
//! assert_eq!(log.events_for_callsign("SIA321").len(), 1);
//! ```

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Aircraft matched a hold entry rule and was given a slot
    Classified {
        tick: u64,
        callsign: String,
        stack: String,
        cleared_alt_ft: i32,
        appended: bool,
    },

    /// Route did not match any hold entry rule
    UnmatchedRoute {
        tick: u64,
        callsign: String,
        route: String,
    },

    /// Aircraft established in the hold
    EnteredHold {
        tick: u64,
        callsign: String,
        stack: String,
        cleared_alt_ft: i32,
    },

    /// Entering aircraft traded slots with a pending aircraft one layer below
    AltitudeSwap {
        tick: u64,
        stack: String,
        entering: String,
        pending: String,
        entering_alt_ft: i32,
        pending_alt_ft: i32,
    },

    /// Release candidate held back by the spacing gate
    SpacingHeld {
        tick: u64,
        callsign: String,
        leader: String,
        gap_nm: f64,
        required_nm: f64,
    },

    /// Aircraft cleared out of the hold onto the approach
    Released {
        tick: u64,
        callsign: String,
        stack: String,
    },

    /// Previously released aircraft no longer constrains spacing
    LeaderCleared {
        tick: u64,
        callsign: String,
    },

    /// Tracked aircraft no longer present in the simulation
    AircraftDeparted {
        tick: u64,
        callsign: String,
    },

    InvariantViolation {
        tick: u64,
        detail: String,
    },
}

impl Event {
    pub fn tick(&self) -> u64 {
        match self {
            Event::Classified { tick, .. } => *tick,
            Event::UnmatchedRoute { tick, .. } => *tick,
            Event::EnteredHold { tick, .. } => *tick,
            Event::AltitudeSwap { tick, .. } => *tick,
            Event::SpacingHeld { tick, .. } => *tick,
            Event::Released { tick, .. } => *tick,
            Event::LeaderCleared { tick, .. } => *tick,
            Event::AircraftDeparted { tick, .. } => *tick,
            Event::InvariantViolation { tick, .. } => *tick,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Classified { .. } => "Classified",
            Event::UnmatchedRoute { .. } => "UnmatchedRoute",
            Event::EnteredHold { .. } => "EnteredHold",
            Event::AltitudeSwap { .. } => "AltitudeSwap",
            Event::SpacingHeld { .. } => "SpacingHeld",
            Event::Released { .. } => "Released",
            Event::LeaderCleared { .. } => "LeaderCleared",
            Event::AircraftDeparted { .. } => "AircraftDeparted",
            Event::InvariantViolation { .. } => "InvariantViolation",
        }
    }

    /// Callsigns the event concerns
    pub fn involves(&self, callsign: &str) -> bool {
        match self {
            Event::Classified { callsign: cs, .. }
            | Event::UnmatchedRoute { callsign: cs, .. }
            | Event::EnteredHold { callsign: cs, .. }
            | Event::Released { callsign: cs, .. }
            | Event::LeaderCleared { callsign: cs, .. }
            | Event::AircraftDeparted { callsign: cs, .. } => cs == callsign,
            Event::AltitudeSwap {
                entering, pending, ..
            } => entering == callsign || pending == callsign,
            Event::SpacingHeld {
                callsign: cs,
                leader,
                ..
            } => cs == callsign || leader == callsign,
            Event::InvariantViolation { .. } => false,
        }
    }
}

/// Append-only list of events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_tick(&self, tick: u64) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_callsign(&self, callsign: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.involves(callsign)).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
