//! Position tracking for a stepper axis.
//!
//! Holds the absolute position and target in steps. The position only moves
//! one step at a time through [`Position::advance`], which the driver calls
//! when it emits a pulse, or jumps when the caller redefines it explicitly.

use crate::motion::Direction;

/// Absolute position and target of an axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Current position in steps (from origin)
    current: i64,
    /// Target position in steps
    target: i64,
}

impl Position {
    /// Create a position tracker at the origin.
    #[inline]
    pub const fn new() -> Self {
        Self {
            current: 0,
            target: 0,
        }
    }

    /// Create a position tracker at a specific position, on target.
    #[inline]
    pub const fn at(steps: i64) -> Self {
        Self {
            current: steps,
            target: steps,
        }
    }

    /// Get current position in steps.
    #[inline]
    pub fn current(&self) -> i64 {
        self.current
    }

    /// Get target position in steps.
    #[inline]
    pub fn target(&self) -> i64 {
        self.target
    }

    /// Signed steps from the current position to the target, saturating at
    /// the `i64` range.
    #[inline]
    pub fn distance_to_target(&self) -> i64 {
        self.target.saturating_sub(self.current)
    }

    /// Whether the current position is the target.
    #[inline]
    pub fn on_target(&self) -> bool {
        self.current == self.target
    }

    /// Set the target in steps.
    #[inline]
    pub fn set_target(&mut self, steps: i64) {
        self.target = steps;
    }

    /// Drop the target onto the current position.
    #[inline]
    pub fn hold(&mut self) {
        self.target = self.current;
    }

    /// Redefine the current position; the target follows so the axis stays put.
    #[inline]
    pub fn redefine(&mut self, steps: i64) {
        self.current = steps;
        self.target = steps;
    }

    /// Move one step in `direction`.
    #[inline]
    pub(crate) fn advance(&mut self, direction: Direction) {
        self.current = self.current.saturating_add(direction.sign());
    }
}
