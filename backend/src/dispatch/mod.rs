//! Hold-and-dispatch orchestration
//!
//! - **config**: structural configuration and numeric tuning
//! - **entry**: route-suffix classification into stacks
//! - **spacing**: release spacing gate
//! - **engine**: the per-tick scheduler
//! - **checkpoint**: snapshot and restore

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod entry;
pub mod spacing;

pub use checkpoint::{compute_config_hash, validate_snapshot, SchedulerSnapshot};
pub use config::{
    ApproachConfig, DispatchConfig, DispatchParams, EntryAction, EntryRule, HoldStackConfig,
    SpacingModel, TurnPerformance,
};
pub use engine::{DispatchError, HoldAndDispatch, TickResult};
pub use entry::{EntryMatch, EntryRuleSet};
pub use spacing::SpacingDecision;
