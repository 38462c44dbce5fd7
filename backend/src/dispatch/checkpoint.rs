//! Checkpoint - save and restore scheduler state
//!
//! A snapshot holds everything the scheduler accumulates at runtime: tick
//! counters, stack contents, memberships, the dispatch cursor and the
//! routes already reported as unmatched. Static
//! parts (hold fixes, entry rules) are rebuilt from the config on restore,
//! so a snapshot only loads against the config it was taken with.
//!
//! # Checked on restore
//!
//! - **Config matching**: SHA-256 of the canonical config JSON must agree
//! - **Single membership**: no callsign in two stack collections
//! - **Agreement**: stack contents and membership table describe the same thing

use crate::airspace::Airspace;
use crate::dispatch::config::DispatchConfig;
use crate::dispatch::engine::{DispatchError, HoldAndDispatch};
use crate::hold::{HoldEntry, StackId};
use crate::models::membership::{HoldState, Membership, MembershipTable};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete runtime state of a scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    /// Scheduler tick the next `update` will run as
    pub tick: u64,

    /// One entry per stack, in stack id order
    pub stacks: Vec<StackSnapshot>,

    pub memberships: Vec<MembershipSnapshot>,

    pub last_dispatched: Option<String>,

    /// Unmatched routes already warned about, so a restore does not repeat them
    #[serde(default)]
    pub reported_unmatched: Vec<String>,

    /// SHA-256 of the config the snapshot was taken with
    pub config_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub name: String,
    pub tick: u64,
    /// Active entries, lowest first
    pub active: Vec<HoldEntry>,
    /// Pending callsigns in insertion order
    pub pending: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    pub callsign: String,
    pub state: HoldState,
    pub stack: Option<usize>,
}

impl SchedulerSnapshot {
    pub fn to_json(&self) -> Result<String, DispatchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DispatchError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Deterministic SHA-256 of a config
///
/// Object keys are sorted before hashing so the result does not depend on
/// field or map ordering.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, DispatchError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let canonical = canonicalize(serde_json::to_value(config)?);
    let json = serde_json::to_string(&canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation
// ============================================================================

/// Check a snapshot against the config it is about to be loaded into
pub fn validate_snapshot(snapshot: &SchedulerSnapshot, config: &DispatchConfig) -> Result<(), DispatchError> {
    let expected = compute_config_hash(config)?;
    if snapshot.config_hash != expected {
        return Err(DispatchError::ConfigMismatch {
            expected,
            actual: snapshot.config_hash.clone(),
        });
    }

    if snapshot.stacks.len() != config.stacks.len() {
        return Err(DispatchError::InvalidSnapshot(format!(
            "snapshot has {} stacks, config has {}",
            snapshot.stacks.len(),
            config.stacks.len()
        )));
    }

    let memberships: HashMap<&str, &MembershipSnapshot> = snapshot
        .memberships
        .iter()
        .map(|m| (m.callsign.as_str(), m))
        .collect();
    if memberships.len() != snapshot.memberships.len() {
        return Err(DispatchError::InvalidSnapshot(
            "duplicate callsign in membership table".to_string(),
        ));
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, (stack, stack_config)) in snapshot.stacks.iter().zip(&config.stacks).enumerate() {
        if stack.name != stack_config.name {
            return Err(DispatchError::InvalidSnapshot(format!(
                "stack {} is {} in the snapshot but {} in the config",
                index, stack.name, stack_config.name
            )));
        }

        let pending = stack
            .pending
            .iter()
            .map(|cs| (cs.as_str(), HoldState::PendingEnterHold));
        let active = stack
            .active
            .iter()
            .map(|e| (e.callsign.as_str(), HoldState::InHold));
        for (callsign, state) in pending.chain(active) {
            if let Some(previous) = seen.insert(callsign, index) {
                return Err(DispatchError::InvalidSnapshot(format!(
                    "{} appears in stack {} and stack {}",
                    callsign, previous, index
                )));
            }
            match memberships.get(callsign) {
                Some(m) if m.state == state && m.stack == Some(index) => {}
                other => {
                    return Err(DispatchError::InvalidSnapshot(format!(
                        "{} is {:?} in stack {} but membership says {:?}",
                        callsign, state, index, other
                    )));
                }
            }
        }
    }

    for membership in &snapshot.memberships {
        let held = membership.state != HoldState::ExitedHold;
        if held != seen.contains_key(membership.callsign.as_str()) {
            return Err(DispatchError::InvalidSnapshot(format!(
                "{} is {:?} but stack contents disagree",
                membership.callsign, membership.state
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Save / Load
// ============================================================================

impl HoldAndDispatch {
    /// Capture runtime state
    pub fn snapshot(&self) -> Result<SchedulerSnapshot, DispatchError> {
        let stacks = self
            .stacks()
            .iter()
            .map(|stack| StackSnapshot {
                name: stack.name().to_string(),
                tick: stack.current_tick(),
                active: stack.active().to_vec(),
                pending: stack.pending().to_vec(),
            })
            .collect();

        let memberships = self
            .memberships()
            .iter()
            .map(|(callsign, m)| MembershipSnapshot {
                callsign: callsign.clone(),
                state: m.state,
                stack: m.stack.map(|id| id.0),
            })
            .collect();

        Ok(SchedulerSnapshot {
            tick: self.current_tick(),
            stacks,
            memberships,
            last_dispatched: self.last_dispatched().map(str::to_string),
            reported_unmatched: self.reported_unmatched(),
            config_hash: compute_config_hash(self.config())?,
        })
    }

    /// Rebuild a scheduler from `config` and load `snapshot` into it
    ///
    /// Hold fixes are registered with `airspace` again, exactly as in
    /// [`HoldAndDispatch::new`]. The event log starts empty.
    pub fn restore(
        config: DispatchConfig,
        airspace: &mut dyn Airspace,
        snapshot: SchedulerSnapshot,
    ) -> Result<Self, DispatchError> {
        validate_snapshot(&snapshot, &config)?;
        let mut scheduler = HoldAndDispatch::new(config, airspace)?;

        let mut memberships = MembershipTable::new();
        for m in snapshot.memberships {
            memberships.insert_raw(
                m.callsign,
                Membership {
                    state: m.state,
                    stack: m.stack.map(StackId),
                },
            );
        }

        for (stack, saved) in scheduler.stacks_mut().iter_mut().zip(snapshot.stacks) {
            stack.restore_contents(saved.tick, saved.active, saved.pending);
        }
        scheduler.restore_runtime(
            snapshot.tick,
            memberships,
            snapshot.last_dispatched,
            snapshot.reported_unmatched,
        );

        info!(tick = snapshot.tick, "scheduler restored from snapshot");
        Ok(scheduler)
    }
}
