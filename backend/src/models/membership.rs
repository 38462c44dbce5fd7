//! Per-aircraft hold membership
//!
//! ```text
//! (unseen) -> PendingEnterHold -> InHold -> ExitedHold
//! ```
//!
//! Transitions only move forward. `ExitedHold` is terminal and is kept so a
//! released aircraft is never classified again.

use crate::hold::StackId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MembershipError {
    #[error("{callsign} is already tracked as {state:?}")]
    AlreadyTracked { callsign: String, state: HoldState },

    #[error("{callsign} is not tracked")]
    NotTracked { callsign: String },

    #[error("illegal transition for {callsign}: {from:?} -> {to:?}")]
    IllegalTransition {
        callsign: String,
        from: HoldState,
        to: HoldState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldState {
    PendingEnterHold,
    InHold,
    ExitedHold,
}

impl HoldState {
    fn next(self) -> Option<HoldState> {
        match self {
            HoldState::PendingEnterHold => Some(HoldState::InHold),
            HoldState::InHold => Some(HoldState::ExitedHold),
            HoldState::ExitedHold => None,
        }
    }
}

/// State plus the stack the aircraft is bound to
///
/// `stack` is `None` once the aircraft has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub state: HoldState,
    pub stack: Option<StackId>,
}

/// Callsign-keyed membership table owned by the scheduler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipTable {
    entries: BTreeMap<String, Membership>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, callsign: &str) -> Option<&Membership> {
        self.entries.get(callsign)
    }

    pub fn state(&self, callsign: &str) -> Option<HoldState> {
        self.entries.get(callsign).map(|m| m.state)
    }

    pub fn contains(&self, callsign: &str) -> bool {
        self.entries.contains_key(callsign)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Membership)> {
        self.entries.iter()
    }

    /// Start tracking an aircraft as pending entry into `stack`
    pub fn track_pending(&mut self, callsign: &str, stack: StackId) -> Result<(), MembershipError> {
        if let Some(existing) = self.entries.get(callsign) {
            return Err(MembershipError::AlreadyTracked {
                callsign: callsign.to_string(),
                state: existing.state,
            });
        }
        self.entries.insert(
            callsign.to_string(),
            Membership {
                state: HoldState::PendingEnterHold,
                stack: Some(stack),
            },
        );
        Ok(())
    }

    /// Advance an aircraft to `to`, which must be the immediate successor
    pub fn transition(&mut self, callsign: &str, to: HoldState) -> Result<(), MembershipError> {
        let entry = self
            .entries
            .get_mut(callsign)
            .ok_or_else(|| MembershipError::NotTracked {
                callsign: callsign.to_string(),
            })?;

        if entry.state.next() != Some(to) {
            return Err(MembershipError::IllegalTransition {
                callsign: callsign.to_string(),
                from: entry.state,
                to,
            });
        }

        entry.state = to;
        if to == HoldState::ExitedHold {
            entry.stack = None;
        }
        Ok(())
    }

    /// Forget an aircraft entirely (it left the simulation)
    pub fn remove(&mut self, callsign: &str) -> Option<Membership> {
        self.entries.remove(callsign)
    }

    /// Restore a raw entry (checkpoint load)
    pub(crate) fn insert_raw(&mut self, callsign: String, membership: Membership) {
        self.entries.insert(callsign, membership);
    }
}
