//! Caller-facing configuration and motion API.
//!
//! Everything here takes effect on the next tick. Positions and rates can be
//! given in steps, millimeters or revolutions; the conversions use the
//! axis' steps-per-millimeter and steps-per-revolution factors.

use embedded_hal::digital::OutputPin;

use crate::clock::Clock;
use crate::error::Result;
use crate::events::MotionEvents;
use crate::motion::direction_sign;
use crate::safety::LimitSwitch;

use super::driver::StepperAxis;
use super::mode::Mode;

impl<STEP, DIR, CLK, BRAKE, EV> StepperAxis<STEP, DIR, CLK, BRAKE, EV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    BRAKE: OutputPin,
    EV: MotionEvents,
{
    // Unit factors

    /// Set steps per millimeter. Non-positive values are ignored.
    pub fn set_steps_per_millimeter(&mut self, steps_per_millimeter: f32) -> bool {
        self.params.set_steps_per_millimeter(steps_per_millimeter)
    }

    /// Set steps per revolution. Non-positive values are ignored.
    pub fn set_steps_per_revolution(&mut self, steps_per_revolution: f32) -> bool {
        self.params.set_steps_per_revolution(steps_per_revolution)
    }

    // Speed

    /// Set the cruise speed in steps/s. Non-positive values are ignored.
    pub fn set_speed_in_steps_per_second(&mut self, speed: f32) -> bool {
        self.params.set_speed(speed)
    }

    /// Set the cruise speed in mm/s.
    pub fn set_speed_in_millimeters_per_second(&mut self, speed: f32) -> bool {
        self.params.set_speed(self.params.mm_to_steps_f32(speed))
    }

    /// Set the cruise speed in rev/s.
    pub fn set_speed_in_revolutions_per_second(&mut self, speed: f32) -> bool {
        self.params.set_speed(self.params.revs_to_steps_f32(speed))
    }

    // Acceleration

    /// Set the acceleration in steps/s². Non-positive values are ignored.
    pub fn set_acceleration_in_steps_per_second_per_second(&mut self, acceleration: f32) -> bool {
        self.params.set_acceleration(acceleration)
    }

    /// Set the acceleration in mm/s².
    pub fn set_acceleration_in_millimeters_per_second_per_second(
        &mut self,
        acceleration: f32,
    ) -> bool {
        self.params
            .set_acceleration(self.params.mm_to_steps_f32(acceleration))
    }

    /// Set the acceleration in rev/s².
    pub fn set_acceleration_in_revolutions_per_second_per_second(
        &mut self,
        acceleration: f32,
    ) -> bool {
        self.params
            .set_acceleration(self.params.revs_to_steps_f32(acceleration))
    }

    // Deceleration

    /// Set the deceleration in steps/s². Non-positive values are ignored.
    pub fn set_deceleration_in_steps_per_second_per_second(&mut self, deceleration: f32) -> bool {
        self.params.set_deceleration(deceleration)
    }

    /// Set the deceleration in mm/s².
    pub fn set_deceleration_in_millimeters_per_second_per_second(
        &mut self,
        deceleration: f32,
    ) -> bool {
        self.params
            .set_deceleration(self.params.mm_to_steps_f32(deceleration))
    }

    /// Set the deceleration in rev/s².
    pub fn set_deceleration_in_revolutions_per_second_per_second(
        &mut self,
        deceleration: f32,
    ) -> bool {
        self.params
            .set_deceleration(self.params.revs_to_steps_f32(deceleration))
    }

    // Target position

    /// Move toward an absolute position in steps.
    ///
    /// Replaces a jog or limit seek in progress. Ignored during an emergency stop.
    pub fn set_target_position_in_steps(&mut self, target: i64) {
        if !self.mode.accepts_motion() {
            debug!("{}: target ignored during emergency stop", self.name.as_str());
            return;
        }
        self.homing.abort();
        self.position.set_target(target);
        if target != self.position.current() || self.velocity != 0.0 {
            self.enter(Mode::Positioning);
        }
    }

    /// Move toward an absolute position in millimeters.
    pub fn set_target_position_in_millimeters(&mut self, target: f32) {
        self.set_target_position_in_steps(self.params.mm_to_steps(target));
    }

    /// Move toward an absolute position in revolutions.
    pub fn set_target_position_in_revolutions(&mut self, target: f32) {
        self.set_target_position_in_steps(self.params.revs_to_steps(target));
    }

    /// Move by a distance in steps from the current position.
    pub fn set_target_position_relative_in_steps(&mut self, distance: i64) {
        self.set_target_position_in_steps(self.position.current().saturating_add(distance));
    }

    /// Move by a distance in millimeters from the current position.
    pub fn set_target_position_relative_in_millimeters(&mut self, distance: f32) {
        self.set_target_position_relative_in_steps(self.params.mm_to_steps(distance));
    }

    /// Move by a distance in revolutions from the current position.
    pub fn set_target_position_relative_in_revolutions(&mut self, distance: f32) {
        self.set_target_position_relative_in_steps(self.params.revs_to_steps(distance));
    }

    /// Decelerate to a stop as soon as possible, without reversing.
    pub fn set_target_position_to_stop(&mut self) {
        if self.mode.accepts_motion() {
            self.target_braking_point();
        }
    }

    /// Target position in steps.
    #[inline]
    pub fn target_position_in_steps(&self) -> i64 {
        self.position.target()
    }

    /// Target position in millimeters.
    pub fn target_position_in_millimeters(&self) -> f32 {
        self.params.steps_to_mm(self.position.target())
    }

    /// Target position in revolutions.
    pub fn target_position_in_revolutions(&self) -> f32 {
        self.params.steps_to_revs(self.position.target())
    }

    // Current position

    /// Redefine the current position in steps. Stops the axis without a ramp.
    pub fn set_current_position_in_steps(&mut self, position: i64) {
        self.halt_at(position);
        if self.mode.accepts_motion() {
            self.enter(Mode::Idle);
        }
    }

    /// Redefine the current position in millimeters.
    pub fn set_current_position_in_millimeters(&mut self, position: f32) {
        self.set_current_position_in_steps(self.params.mm_to_steps(position));
    }

    /// Redefine the current position in revolutions.
    pub fn set_current_position_in_revolutions(&mut self, position: f32) {
        self.set_current_position_in_steps(self.params.revs_to_steps(position));
    }

    /// Current position in steps.
    #[inline]
    pub fn current_position_in_steps(&self) -> i64 {
        self.position.current()
    }

    /// Current position in millimeters.
    pub fn current_position_in_millimeters(&self) -> f32 {
        self.params.steps_to_mm(self.position.current())
    }

    /// Current position in revolutions.
    pub fn current_position_in_revolutions(&self) -> f32 {
        self.params.steps_to_revs(self.position.current())
    }

    /// Signed steps left to the target.
    #[inline]
    pub fn distance_to_target_signed(&self) -> i64 {
        self.position.distance_to_target()
    }

    /// Direction of travel: `-1`, `0` at rest, or `1`.
    #[inline]
    pub fn direction_of_motion(&self) -> i8 {
        direction_sign(self.direction_of_travel())
    }

    // Velocity

    /// Signed velocity in steps/s.
    #[inline]
    pub fn current_velocity_in_steps_per_second(&self) -> f32 {
        self.velocity
    }

    /// Signed velocity in mm/s.
    pub fn current_velocity_in_millimeters_per_second(&self) -> f32 {
        self.params.rate_to_mm(self.velocity)
    }

    /// Signed velocity in rev/s.
    pub fn current_velocity_in_revolutions_per_second(&self) -> f32 {
        self.params.rate_to_revs(self.velocity)
    }

    // Safety inputs

    /// Report a limit switch as triggered. Repeating an active switch has no effect.
    pub fn set_limit_switch_active(&mut self, switch: LimitSwitch) {
        self.safety.set_limit_switch_active(switch);
    }

    /// Clear the active limit switch and lift its direction block.
    pub fn clear_limit_switch_active(&mut self) {
        self.safety.clear_limit_switch_active();
    }

    /// Trigger an emergency stop, taking effect on the next tick.
    ///
    /// With `hold_until_release` the axis stops at once and waits for
    /// [`Self::release_emergency_stop`]; otherwise it decelerates to a stop and
    /// returns to idle by itself. Repeated triggers have no effect.
    pub fn emergency_stop(&mut self, hold_until_release: bool) {
        self.safety.trigger_emergency_stop(hold_until_release);
    }

    /// Release a held emergency stop. Motion resumes toward the kept target.
    pub fn release_emergency_stop(&mut self) {
        self.safety.release_emergency_stop();
    }

    /// Whether an emergency stop is in effect.
    #[inline]
    pub fn is_emergency_stop_active(&self) -> bool {
        self.safety.emergency_stop_active()
    }

    // Brake

    /// Delay between motion stop and brake engagement.
    pub fn set_brake_engage_delay_ms(&mut self, delay_ms: u32) {
        self.brake.set_engage_delay_ms(delay_ms);
    }

    /// Delay between a motion request and brake release; `-1` releases at once.
    pub fn set_brake_release_delay_ms(&mut self, delay_ms: i32) {
        self.brake.set_release_delay_ms(delay_ms);
    }

    /// Engage the brake now. A later move releases it as usual.
    ///
    /// # Errors
    ///
    /// Returns an error if the brake pin cannot be driven.
    pub fn activate_brake(&mut self) -> Result<()> {
        if !self.brake.is_configured() {
            return Ok(());
        }
        match self.brake.engage() {
            Some(action) => self.drive_brake(action),
            None => Ok(()),
        }
    }

    /// Release the brake now.
    ///
    /// # Errors
    ///
    /// Returns an error if the brake pin cannot be driven.
    pub fn deactivate_brake(&mut self) -> Result<()> {
        match self.brake.release() {
            Some(action) => self.drive_brake(action),
            None => Ok(()),
        }
    }

    /// Whether the brake is engaged.
    #[inline]
    pub fn is_brake_active(&self) -> bool {
        self.brake.is_active()
    }

    // Blocking moves

    /// Move to an absolute position in steps and wait for it (blocking).
    ///
    /// Ticks in a tight loop until the axis rests on target, monopolising the
    /// calling context. Returns early if a held emergency stop freezes the
    /// axis or the parameters cannot start a move.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_position_in_steps(&mut self, target: i64) -> Result<()> {
        self.set_target_position_in_steps(target);
        self.run_to_completion()
    }

    /// Blocking absolute move in millimeters.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_position_in_millimeters(&mut self, target: f32) -> Result<()> {
        self.set_target_position_in_millimeters(target);
        self.run_to_completion()
    }

    /// Blocking absolute move in revolutions.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_position_in_revolutions(&mut self, target: f32) -> Result<()> {
        self.set_target_position_in_revolutions(target);
        self.run_to_completion()
    }

    /// Blocking relative move in steps.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_relative_in_steps(&mut self, distance: i64) -> Result<()> {
        self.set_target_position_relative_in_steps(distance);
        self.run_to_completion()
    }

    /// Blocking relative move in millimeters.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_relative_in_millimeters(&mut self, distance: f32) -> Result<()> {
        self.set_target_position_relative_in_millimeters(distance);
        self.run_to_completion()
    }

    /// Blocking relative move in revolutions.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_relative_in_revolutions(&mut self, distance: f32) -> Result<()> {
        self.set_target_position_relative_in_revolutions(distance);
        self.run_to_completion()
    }

    /// Tick until the axis settles (blocking).
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn run_to_completion(&mut self) -> Result<()> {
        loop {
            let done = self.tick()?;
            if done || self.safety.hold_until_release() || self.motion_stalled() {
                return Ok(());
            }
        }
    }
}
