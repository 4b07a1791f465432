//! Limit switch and emergency stop inputs.
//!
//! Inputs are edge-triggered and may be raised from any context that can reach
//! the axis. Each accepted trigger is latched here and consumed by the tick at
//! its start, never between the rising and falling edge of a pulse. Repeating a
//! trigger that is already latched or active has no further effect.

use crate::motion::Direction;

/// Which limit switch is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LimitSwitch {
    /// Switch at the low end of travel.
    Begin,
    /// Switch at the high end of travel.
    End,
    /// A single switch wired to both ends.
    CombinedBeginEnd,
}

impl LimitSwitch {
    /// Decode the numeric convention `-1` (begin), `1` (end), `2` (combined).
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(LimitSwitch::Begin),
            1 => Some(LimitSwitch::End),
            2 => Some(LimitSwitch::CombinedBeginEnd),
            _ => None,
        }
    }

    /// Numeric code of this switch type.
    pub fn code(self) -> i8 {
        match self {
            LimitSwitch::Begin => -1,
            LimitSwitch::End => 1,
            LimitSwitch::CombinedBeginEnd => 2,
        }
    }

    /// The switch that sits at the end of travel in `direction`.
    pub fn toward(direction: Direction) -> Self {
        match direction {
            Direction::Negative => LimitSwitch::Begin,
            Direction::Positive => LimitSwitch::End,
        }
    }

    /// Direction blocked by this switch.
    ///
    /// A combined switch cannot tell the ends apart, so it blocks whichever way
    /// the axis was travelling when it fired.
    pub fn blocked_direction(self, travelling: Option<Direction>) -> Option<Direction> {
        match self {
            LimitSwitch::Begin => Some(Direction::Negative),
            LimitSwitch::End => Some(Direction::Positive),
            LimitSwitch::CombinedBeginEnd => travelling,
        }
    }
}

/// Latched safety inputs for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafetyState {
    active_limit_switch: Option<LimitSwitch>,
    limit_pending: bool,
    disallowed_direction: Option<Direction>,
    emergency_stop_active: bool,
    hold_until_release: bool,
    emergency_pending: bool,
    release_pending: bool,
}

impl SafetyState {
    /// No switch active, no emergency stop.
    pub const fn new() -> Self {
        Self {
            active_limit_switch: None,
            limit_pending: false,
            disallowed_direction: None,
            emergency_stop_active: false,
            hold_until_release: false,
            emergency_pending: false,
            release_pending: false,
        }
    }

    /// Currently active limit switch.
    #[inline]
    pub fn active_limit_switch(&self) -> Option<LimitSwitch> {
        self.active_limit_switch
    }

    /// Direction in which motion is currently refused.
    #[inline]
    pub fn disallowed_direction(&self) -> Option<Direction> {
        self.disallowed_direction
    }

    /// Whether an emergency stop is latched or in progress.
    #[inline]
    pub fn emergency_stop_active(&self) -> bool {
        self.emergency_stop_active
    }

    /// Whether the active emergency stop waits for an explicit release.
    #[inline]
    pub fn hold_until_release(&self) -> bool {
        self.emergency_stop_active && self.hold_until_release
    }

    /// Report a limit switch as triggered. Returns `false` if it already was.
    pub fn set_limit_switch_active(&mut self, switch: LimitSwitch) -> bool {
        if self.active_limit_switch == Some(switch) {
            return false;
        }
        self.active_limit_switch = Some(switch);
        self.limit_pending = true;
        true
    }

    /// Clear the active limit switch and lift any direction block.
    pub fn clear_limit_switch_active(&mut self) {
        self.active_limit_switch = None;
        self.limit_pending = false;
        self.disallowed_direction = None;
    }

    /// Latch an emergency stop. Returns `false` if one is already active.
    pub fn trigger_emergency_stop(&mut self, hold_until_release: bool) -> bool {
        if self.emergency_stop_active {
            return false;
        }
        self.emergency_stop_active = true;
        self.hold_until_release = hold_until_release;
        self.emergency_pending = true;
        self.release_pending = false;
        true
    }

    /// Request release of a held emergency stop. Returns `false` if nothing is held.
    pub fn release_emergency_stop(&mut self) -> bool {
        if !self.hold_until_release() || self.release_pending {
            return false;
        }
        self.release_pending = true;
        true
    }

    /// Consume a fresh limit trigger, if any.
    pub fn take_limit_trigger(&mut self) -> Option<LimitSwitch> {
        if !self.limit_pending {
            return None;
        }
        self.limit_pending = false;
        self.active_limit_switch
    }

    /// Consume a fresh emergency stop trigger.
    pub fn take_emergency_trigger(&mut self) -> bool {
        core::mem::take(&mut self.emergency_pending)
    }

    /// Consume a release request, ending the emergency stop.
    pub fn take_emergency_release(&mut self) -> bool {
        if !core::mem::take(&mut self.release_pending) {
            return false;
        }
        self.finish_emergency_stop();
        true
    }

    /// End an emergency stop that has run its course.
    pub fn finish_emergency_stop(&mut self) {
        self.emergency_stop_active = false;
        self.hold_until_release = false;
        self.emergency_pending = false;
        self.release_pending = false;
    }

    /// Refuse further motion in `direction`.
    pub fn block(&mut self, direction: Option<Direction>) {
        self.disallowed_direction = direction;
    }

    /// Whether motion in `direction` is refused.
    #[inline]
    pub fn is_blocked(&self, direction: Direction) -> bool {
        self.disallowed_direction == Some(direction)
    }

    /// Motion away from the switch clears the block and the active switch.
    ///
    /// Returns `true` when a block was lifted.
    pub fn note_motion(&mut self, direction: Direction) -> bool {
        match self.disallowed_direction {
            Some(blocked) if blocked != direction => {
                self.disallowed_direction = None;
                self.active_limit_switch = None;
                self.limit_pending = false;
                true
            }
            _ => false,
        }
    }
}
