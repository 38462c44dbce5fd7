//! Discrete tick counting
//!
//! The scheduler runs once per simulation step. Ticks are a relative age
//! measure only; they are never converted to wall-clock time.

use serde::{Deserialize, Serialize};

/// Monotonic counter of simulation steps
///
/// Each `HoldStack` owns one (its entry ticks act as a FIFO tiebreaker) and
/// the scheduler owns one for stamping events.
///
/// # Example
/// ```
/// use hold_dispatch_core::TickClock;
///
/// let mut clock = TickClock::new();
/// assert_eq!(clock.current_tick(), 0);
///
/// clock.advance_tick();
/// assert_eq!(clock.current_tick(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickClock {
    current_tick: u64,
}

impl TickClock {
    /// Create a clock at tick 0
    pub fn new() -> Self {
        Self { current_tick: 0 }
    }

    /// Create a clock resumed at a given tick (checkpoint restore)
    ///
    /// # Example
    /// ```
    /// use hold_dispatch_core::TickClock;
    ///
    /// let clock = TickClock::starting_at(42);
    /// assert_eq!(clock.current_tick(), 42);
    /// ```
    pub fn starting_at(tick: u64) -> Self {
        Self { current_tick: tick }
    }

    /// Advance by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Ticks elapsed since creation
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }
}
