//! Holding stacks
//!
//! One [`HoldStack`] per physical holding pattern. Stacks are created when
//! the scheduler is built and live for the whole session; aircraft refer to
//! them through a [`StackId`] rather than a pointer.

pub mod stack;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use stack::{HoldEntry, HoldPattern, HoldStack};

/// Index of a stack within its scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StackId(pub usize);

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack-{}", self.0)
    }
}
