//! Homing, limit seeking and jogging.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::clock::Clock;
use crate::error::{MotorError, Result};
use crate::events::MotionEvents;
use crate::motion::Direction;
use crate::safety::LimitSwitch;

use super::driver::StepperAxis;
use super::mode::Mode;

/// Travel used for open-ended moves (jogging, seeking a limit).
pub const UNBOUNDED_TRAVEL_STEPS: i64 = 2_000_000_000;

/// What a limit seek does when its switch fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitGoal {
    /// Redefine the switch position as 0.
    Home,
    /// Just stop there.
    Limit,
}

/// A limit seek in progress.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LimitSeek {
    pub(crate) goal: LimitGoal,
    pub(crate) direction: Direction,
    pub(crate) continuation: Option<fn()>,
}

/// Homing configuration and progress.
#[derive(Debug, Clone, Copy)]
pub struct HomingState {
    direction_toward_home: Direction,
    is_homed: bool,
    max_distance_steps: i64,
    seek: Option<LimitSeek>,
    outcome: Option<bool>,
}

impl Default for HomingState {
    fn default() -> Self {
        Self::new()
    }
}

impl HomingState {
    /// Home toward negative travel, not homed.
    pub const fn new() -> Self {
        Self {
            direction_toward_home: Direction::Negative,
            is_homed: false,
            max_distance_steps: UNBOUNDED_TRAVEL_STEPS,
            seek: None,
            outcome: None,
        }
    }

    /// Direction in which the home switch lies.
    #[inline]
    pub fn direction_toward_home(&self) -> Direction {
        self.direction_toward_home
    }

    /// Whether the axis has been homed.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.is_homed
    }

    /// Default travel budget for [`StepperAxis::move_to_home`].
    #[inline]
    pub fn max_distance_steps(&self) -> i64 {
        self.max_distance_steps
    }

    /// Whether a limit seek is in progress.
    #[inline]
    pub fn is_seeking(&self) -> bool {
        self.seek.is_some()
    }

    /// Result of the last finished seek: `Some(true)` when the switch was found.
    #[inline]
    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    pub(crate) fn set_direction_toward_home(&mut self, direction: Direction) {
        self.direction_toward_home = direction;
    }

    pub(crate) fn set_max_distance_steps(&mut self, steps: i64) {
        self.max_distance_steps = steps.saturating_abs();
    }

    pub(crate) fn set_homed(&mut self, homed: bool) {
        self.is_homed = homed;
    }

    pub(crate) fn seek(&self) -> Option<LimitSeek> {
        self.seek
    }

    pub(crate) fn begin(&mut self, seek: LimitSeek) {
        if seek.goal == LimitGoal::Home {
            self.is_homed = false;
        }
        self.seek = Some(seek);
        self.outcome = None;
    }

    /// Seek found its switch.
    pub(crate) fn succeed(&mut self) -> Option<LimitSeek> {
        let seek = self.seek.take()?;
        self.outcome = Some(true);
        Some(seek)
    }

    /// Seek ran out of travel.
    pub(crate) fn fail(&mut self) {
        self.seek = None;
        self.outcome = Some(false);
    }

    /// Cancel a seek in progress. Returns `true` if one was cancelled.
    pub(crate) fn abort(&mut self) -> bool {
        if self.seek.is_none() {
            return false;
        }
        self.fail();
        true
    }
}

impl<STEP, DIR, CLK, BRAKE, EV> StepperAxis<STEP, DIR, CLK, BRAKE, EV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    BRAKE: OutputPin,
    EV: MotionEvents,
{
    /// Set the direction of the home switch (`-1` or `1`). Other values are ignored.
    pub fn set_direction_to_home(&mut self, direction: i8) {
        if let Some(direction) = Direction::from_sign(direction) {
            self.homing.set_direction_toward_home(direction);
        }
    }

    /// Direction of the home switch as `-1` or `1`.
    pub fn direction_to_home(&self) -> i8 {
        self.homing.direction_toward_home().sign() as i8
    }

    /// Level the home switch reads when pressed (default low, for pulled-up switches).
    pub fn set_home_switch_level(&mut self, level: crate::brake::ActiveLevel) {
        self.home_switch_level = level;
    }

    /// Default travel budget for [`Self::move_to_home`].
    pub fn set_homing_max_distance_steps(&mut self, max_distance_steps: i64) {
        self.homing.set_max_distance_steps(max_distance_steps);
    }

    /// Homing progress and settings.
    #[inline]
    pub fn homing(&self) -> &HomingState {
        &self.homing
    }

    /// Whether the axis has been homed.
    #[inline]
    pub fn is_homed(&self) -> bool {
        self.homing.is_homed()
    }

    /// Whether the axis is currently travelling toward the home switch.
    pub fn is_moving_towards_home(&self) -> bool {
        self.direction_of_travel() == Some(self.homing.direction_toward_home())
    }

    /// Home the axis, polling `home_switch` between ticks. Blocks until done.
    ///
    /// Moves up to `max_distance_steps` in `direction` at `speed_steps_per_sec`
    /// (which becomes the new cruise speed). Returns `Ok(true)` when the switch
    /// was found and the position is now 0, `Ok(false)` when the travel budget
    /// ran out or the seek was interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_home_in_steps<SW: InputPin>(
        &mut self,
        direction: i8,
        speed_steps_per_sec: f32,
        max_distance_steps: i64,
        home_switch: &mut SW,
    ) -> Result<bool> {
        let Some(direction) = Direction::from_sign(direction) else {
            return Ok(false);
        };
        self.homing.set_direction_toward_home(direction);
        self.params.set_speed(speed_steps_per_sec);

        if !self.begin_limit_seek(LimitGoal::Home, direction, None, max_distance_steps) {
            return Ok(false);
        }

        while self.mode == Mode::Homing {
            if self.switch_pressed(home_switch)? {
                self.safety
                    .set_limit_switch_active(LimitSwitch::toward(direction));
            }
            self.tick()?;
            if self.motion_stalled() {
                self.homing.abort();
                self.enter(Mode::Idle);
            }
        }

        Ok(self.homing.outcome() == Some(true))
    }

    /// Home with the configured direction, travel budget and current speed.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_home<SW: InputPin>(&mut self, home_switch: &mut SW) -> Result<bool> {
        let direction = self.direction_to_home();
        let speed = self.params.desired_speed();
        let max_distance = self.homing.max_distance_steps();
        self.move_to_home_in_steps(direction, speed, max_distance, home_switch)
    }

    /// [`Self::move_to_home_in_steps`] with speed and travel in millimeters.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_home_in_millimeters<SW: InputPin>(
        &mut self,
        direction: i8,
        speed_mm_per_sec: f32,
        max_distance_mm: f32,
        home_switch: &mut SW,
    ) -> Result<bool> {
        let speed = self.params.mm_to_steps_f32(speed_mm_per_sec);
        let max_distance = self.params.mm_to_steps(max_distance_mm);
        self.move_to_home_in_steps(direction, speed, max_distance, home_switch)
    }

    /// [`Self::move_to_home_in_steps`] with speed and travel in revolutions.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn move_to_home_in_revolutions<SW: InputPin>(
        &mut self,
        direction: i8,
        speed_revs_per_sec: f32,
        max_distance_revs: f32,
        home_switch: &mut SW,
    ) -> Result<bool> {
        let speed = self.params.revs_to_steps_f32(speed_revs_per_sec);
        let max_distance = self.params.revs_to_steps(max_distance_revs);
        self.move_to_home_in_steps(direction, speed, max_distance, home_switch)
    }

    /// Start homing without blocking.
    ///
    /// The axis travels toward home until a limit switch toward home is
    /// reported through [`Self::set_limit_switch_active`], then redefines that
    /// position as 0, fires home-reached and calls `continuation`.
    pub fn go_to_limit_and_set_as_home(
        &mut self,
        continuation: Option<fn()>,
        max_distance_steps: i64,
    ) -> bool {
        let direction = self.homing.direction_toward_home();
        self.begin_limit_seek(LimitGoal::Home, direction, continuation, max_distance_steps)
    }

    /// Travel toward the limit in `direction` without redefining home.
    ///
    /// On trigger the axis hard-stops and `continuation` is called.
    pub fn go_to_limit(&mut self, direction: Direction, continuation: Option<fn()>) -> bool {
        self.begin_limit_seek(LimitGoal::Limit, direction, continuation, UNBOUNDED_TRAVEL_STEPS)
    }

    /// Move continuously in `direction` until [`Self::stop_jogging`].
    pub fn start_jogging(&mut self, direction: Direction) {
        if !self.mode.accepts_motion() {
            return;
        }
        self.homing.abort();
        let target = self
            .position
            .current()
            .saturating_add(direction.sign() * UNBOUNDED_TRAVEL_STEPS);
        self.position.set_target(target);
        self.enter(Mode::Jogging);
    }

    /// Decelerate a jog to a stop at the braking point.
    pub fn stop_jogging(&mut self) {
        if self.mode == Mode::Jogging {
            self.target_braking_point();
        }
    }

    /// Make the current position home (0) and stop without a ramp.
    pub fn set_current_position_as_home_and_stop(&mut self) {
        self.halt_at(0);
        self.homing.set_homed(true);
        if self.mode.accepts_motion() {
            self.enter(Mode::Idle);
        }
    }

    fn begin_limit_seek(
        &mut self,
        goal: LimitGoal,
        direction: Direction,
        continuation: Option<fn()>,
        max_distance_steps: i64,
    ) -> bool {
        if !self.mode.accepts_motion() {
            return false;
        }
        self.homing.begin(LimitSeek {
            goal,
            direction,
            continuation,
        });
        self.enter(Mode::Homing);

        // already resting on the switch
        if self.velocity == 0.0 && self.safety.is_blocked(direction) {
            self.position.hold();
            self.finish_limit_seek();
            return true;
        }

        info!(
            "{}: seeking limit {:?} for up to {} steps",
            self.name.as_str(),
            direction,
            max_distance_steps
        );
        let target = self
            .position
            .current()
            .saturating_add(max_distance_steps.saturating_abs().saturating_mul(direction.sign()));
        self.position.set_target(target);
        true
    }

    fn switch_pressed<SW: InputPin>(&self, switch: &mut SW) -> Result<bool> {
        let high = switch.is_high().map_err(|_| MotorError::PinError)?;
        Ok(high == self.home_switch_level.pin_high(true))
    }
}
