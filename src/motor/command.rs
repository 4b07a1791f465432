//! Commands for an axis driven from another execution context.
//!
//! A [`MotionCommand`] is a plain value describing one setter call. The
//! context that owns the axis applies queued commands between ticks, so every
//! change becomes visible at a single point: the start of a tick.

use embedded_hal::digital::OutputPin;

use crate::clock::Clock;
use crate::config::units::{Millimeters, Revolutions, Steps, StepsPerSec, StepsPerSecSquared};
use crate::error::Result;
use crate::events::MotionEvents;
use crate::motion::Direction;
use crate::safety::LimitSwitch;

use super::driver::StepperAxis;

/// A position or distance in one of the supported unit systems.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Length {
    /// Whole steps.
    Steps(i64),
    /// Millimeters of travel.
    Millimeters(f32),
    /// Output revolutions.
    Revolutions(f32),
}

/// A speed (per second) or acceleration (per second squared).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rate {
    /// Steps per second (or per second squared).
    Steps(f32),
    /// Millimeters per second (or per second squared).
    Millimeters(f32),
    /// Revolutions per second (or per second squared).
    Revolutions(f32),
}

impl From<Steps> for Length {
    fn from(steps: Steps) -> Self {
        Length::Steps(steps.value())
    }
}

impl From<Millimeters> for Length {
    fn from(mm: Millimeters) -> Self {
        Length::Millimeters(mm.value())
    }
}

impl From<Revolutions> for Length {
    fn from(revs: Revolutions) -> Self {
        Length::Revolutions(revs.value())
    }
}

impl From<StepsPerSec> for Rate {
    fn from(rate: StepsPerSec) -> Self {
        Rate::Steps(rate.value())
    }
}

impl From<StepsPerSecSquared> for Rate {
    fn from(rate: StepsPerSecSquared) -> Self {
        Rate::Steps(rate.value())
    }
}

/// One caller-side operation on an axis.
#[derive(Debug, Clone, Copy)]
pub enum MotionCommand {
    /// Move toward an absolute position.
    SetTargetPosition(Length),
    /// Move by a distance from the current position.
    SetTargetPositionRelative(Length),
    /// Decelerate to a stop at the braking point.
    SetTargetPositionToStop,
    /// Redefine the current position.
    SetCurrentPosition(Length),
    /// Make the current position home and stop.
    SetCurrentPositionAsHomeAndStop,
    /// Cruise speed.
    SetSpeed(Rate),
    /// Acceleration.
    SetAcceleration(Rate),
    /// Deceleration.
    SetDeceleration(Rate),
    /// Direction of the home switch, `-1` or `1`.
    SetDirectionToHome(i8),
    /// Start continuous motion.
    StartJogging(Direction),
    /// Stop continuous motion.
    StopJogging,
    /// Start homing toward the home switch.
    GoToLimitAndSetAsHome {
        /// Called once home is found.
        continuation: Option<fn()>,
        /// Travel budget in steps.
        max_distance_steps: i64,
    },
    /// Travel to a limit without redefining home.
    GoToLimit {
        /// Direction of the limit.
        direction: Direction,
        /// Called once the limit is reached.
        continuation: Option<fn()>,
    },
    /// Report a limit switch as triggered.
    SetLimitSwitchActive(LimitSwitch),
    /// Clear the active limit switch.
    ClearLimitSwitchActive,
    /// Trigger an emergency stop.
    EmergencyStop {
        /// Hold still until explicitly released.
        hold_until_release: bool,
    },
    /// Release a held emergency stop.
    ReleaseEmergencyStop,
    /// Brake engage delay.
    SetBrakeEngageDelayMs(u32),
    /// Brake release delay, `-1` for immediate.
    SetBrakeReleaseDelayMs(i32),
    /// Engage the brake now.
    ActivateBrake,
    /// Release the brake now.
    DeactivateBrake,
}

impl<STEP, DIR, CLK, BRAKE, EV> StepperAxis<STEP, DIR, CLK, BRAKE, EV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    BRAKE: OutputPin,
    EV: MotionEvents,
{
    /// Apply a command as if the matching setter had been called.
    ///
    /// Returns `Ok(false)` when the setter rejected the command: a
    /// non-positive rate, or a limit seek during an emergency stop.
    ///
    /// # Errors
    ///
    /// Returns an error if a brake command cannot drive its pin.
    pub fn apply(&mut self, command: MotionCommand) -> Result<bool> {
        let accepted = match command {
            MotionCommand::SetTargetPosition(length) => {
                self.set_target_position(length);
                true
            }
            MotionCommand::SetTargetPositionRelative(length) => {
                match length {
                    Length::Steps(s) => self.set_target_position_relative_in_steps(s),
                    Length::Millimeters(mm) => {
                        self.set_target_position_relative_in_millimeters(mm)
                    }
                    Length::Revolutions(r) => self.set_target_position_relative_in_revolutions(r),
                }
                true
            }
            MotionCommand::SetTargetPositionToStop => {
                self.set_target_position_to_stop();
                true
            }
            MotionCommand::SetCurrentPosition(length) => {
                self.set_current_position(length);
                true
            }
            MotionCommand::SetCurrentPositionAsHomeAndStop => {
                self.set_current_position_as_home_and_stop();
                true
            }
            MotionCommand::SetSpeed(rate) => match rate {
                Rate::Steps(v) => self.set_speed_in_steps_per_second(v),
                Rate::Millimeters(v) => self.set_speed_in_millimeters_per_second(v),
                Rate::Revolutions(v) => self.set_speed_in_revolutions_per_second(v),
            },
            MotionCommand::SetAcceleration(rate) => match rate {
                Rate::Steps(v) => self.set_acceleration_in_steps_per_second_per_second(v),
                Rate::Millimeters(v) => {
                    self.set_acceleration_in_millimeters_per_second_per_second(v)
                }
                Rate::Revolutions(v) => {
                    self.set_acceleration_in_revolutions_per_second_per_second(v)
                }
            },
            MotionCommand::SetDeceleration(rate) => match rate {
                Rate::Steps(v) => self.set_deceleration_in_steps_per_second_per_second(v),
                Rate::Millimeters(v) => {
                    self.set_deceleration_in_millimeters_per_second_per_second(v)
                }
                Rate::Revolutions(v) => {
                    self.set_deceleration_in_revolutions_per_second_per_second(v)
                }
            },
            MotionCommand::SetDirectionToHome(direction) => {
                self.set_direction_to_home(direction);
                direction == -1 || direction == 1
            }
            MotionCommand::StartJogging(direction) => {
                let accepted = self.mode.accepts_motion();
                self.start_jogging(direction);
                accepted
            }
            MotionCommand::StopJogging => {
                self.stop_jogging();
                true
            }
            MotionCommand::GoToLimitAndSetAsHome {
                continuation,
                max_distance_steps,
            } => self.go_to_limit_and_set_as_home(continuation, max_distance_steps),
            MotionCommand::GoToLimit {
                direction,
                continuation,
            } => self.go_to_limit(direction, continuation),
            MotionCommand::SetLimitSwitchActive(switch) => {
                self.set_limit_switch_active(switch);
                true
            }
            MotionCommand::ClearLimitSwitchActive => {
                self.clear_limit_switch_active();
                true
            }
            MotionCommand::EmergencyStop { hold_until_release } => {
                self.emergency_stop(hold_until_release);
                true
            }
            MotionCommand::ReleaseEmergencyStop => {
                self.release_emergency_stop();
                true
            }
            MotionCommand::SetBrakeEngageDelayMs(ms) => {
                self.set_brake_engage_delay_ms(ms);
                true
            }
            MotionCommand::SetBrakeReleaseDelayMs(ms) => {
                self.set_brake_release_delay_ms(ms);
                true
            }
            MotionCommand::ActivateBrake => {
                self.activate_brake()?;
                true
            }
            MotionCommand::DeactivateBrake => {
                self.deactivate_brake()?;
                true
            }
        };
        Ok(accepted)
    }

    /// Move toward an absolute position given in any unit.
    ///
    /// ```rust,ignore
    /// use flexy_stepper::UnitExt;
    ///
    /// axis.set_target_position(50.0f32.mm());
    /// ```
    pub fn set_target_position(&mut self, target: impl Into<Length>) {
        match target.into() {
            Length::Steps(s) => self.set_target_position_in_steps(s),
            Length::Millimeters(mm) => self.set_target_position_in_millimeters(mm),
            Length::Revolutions(r) => self.set_target_position_in_revolutions(r),
        }
    }

    /// Redefine the current position given in any unit.
    pub fn set_current_position(&mut self, position: impl Into<Length>) {
        match position.into() {
            Length::Steps(s) => self.set_current_position_in_steps(s),
            Length::Millimeters(mm) => self.set_current_position_in_millimeters(mm),
            Length::Revolutions(r) => self.set_current_position_in_revolutions(r),
        }
    }
}
