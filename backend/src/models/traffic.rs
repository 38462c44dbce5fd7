//! Per-tick view of traffic and the outgoing clearance queue
//!
//! The scheduler never changes what an aircraft is flying. It pushes
//! clearance intents into a [`ClearanceQueue`] that the surrounding
//! simulation applies centrally after the tick. Within a tick, an intent
//! already queued for an aircraft supersedes its snapshot's latest
//! clearance, so successive rewrites (swap, then compaction) compose.

use crate::models::aircraft::Aircraft;
use crate::models::clearance::ClearanceState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A clearance the scheduler wants delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceRequest {
    pub callsign: String,
    pub clearance: ClearanceState,
    /// Delivery priority; 0 is the default used for every scheduler intent
    pub priority: u8,
}

/// Pending clearance intents in issue order
#[derive(Debug, Clone, Default)]
pub struct ClearanceQueue {
    requests: Vec<ClearanceRequest>,
}

impl ClearanceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callsign: &str, clearance: ClearanceState, priority: u8) {
        self.requests.push(ClearanceRequest {
            callsign: callsign.to_string(),
            clearance,
            priority,
        });
    }

    /// Most recently queued clearance for `callsign`
    pub fn latest_for(&self, callsign: &str) -> Option<&ClearanceState> {
        self.requests
            .iter()
            .rev()
            .find(|r| r.callsign == callsign)
            .map(|r| &r.clearance)
    }

    pub fn requests(&self) -> &[ClearanceRequest] {
        &self.requests
    }

    /// All requests for one aircraft, oldest first
    pub fn requests_for(&self, callsign: &str) -> Vec<&ClearanceRequest> {
        self.requests.iter().filter(|r| r.callsign == callsign).collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Hand every queued request to the caller
    pub fn drain(&mut self) -> Vec<ClearanceRequest> {
        std::mem::take(&mut self.requests)
    }
}

/// Aircraft collection joined with the clearance queue for one tick
pub struct Traffic<'a> {
    aircraft: &'a [Aircraft],
    index: HashMap<&'a str, usize>,
    queue: &'a mut ClearanceQueue,
}

impl<'a> Traffic<'a> {
    pub fn new(aircraft: &'a [Aircraft], queue: &'a mut ClearanceQueue) -> Self {
        let index = aircraft
            .iter()
            .enumerate()
            .map(|(i, ac)| (ac.callsign.as_str(), i))
            .collect();
        Self {
            aircraft,
            index,
            queue,
        }
    }

    /// Aircraft in the order the simulation supplied them
    pub fn aircraft(&self) -> &'a [Aircraft] {
        self.aircraft
    }

    pub fn get(&self, callsign: &str) -> Option<&'a Aircraft> {
        let aircraft = self.aircraft;
        self.index.get(callsign).map(|&i| &aircraft[i])
    }

    pub fn contains(&self, callsign: &str) -> bool {
        self.index.contains_key(callsign)
    }

    /// Latest clearance: queued this tick, else the snapshot's latest
    pub fn latest_clearance(&self, callsign: &str) -> Option<&ClearanceState> {
        self.queue
            .latest_for(callsign)
            .or_else(|| self.get(callsign).map(|ac| &ac.latest_clearance))
    }

    pub fn cleared_altitude(&self, callsign: &str) -> Option<i32> {
        self.latest_clearance(callsign).map(|c| c.cleared_alt_ft)
    }

    pub fn issue(&mut self, callsign: &str, clearance: ClearanceState) {
        self.queue.push(callsign, clearance, 0);
    }
}
