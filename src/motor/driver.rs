//! Stepper axis driver.
//!
//! Generic over embedded-hal 1.0 pin types. The whole motion state machine
//! runs inside [`StepperAxis::tick`], which never blocks: it reads the clock
//! once, consumes latched safety inputs, services brake deadlines and emits
//! at most one step pulse.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::brake::{ActiveLevel, BrakeAction, BrakeSequencer};
use crate::clock::Clock;
use crate::error::{MotorError, Result};
use crate::events::{MotionEvents, NoEvents};
use crate::motion::{
    Direction, Kinematics, MotionPhase, MotionPlanner, ProfileParameters, StepPulseScheduler,
};
use crate::safety::SafetyState;

use super::homing::{HomingState, LimitGoal, LimitSeek};
use super::mode::Mode;
use super::position::Position;

/// Placeholder brake line for axes without a brake.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBrake;

impl ErrorType for NoBrake {
    type Error = Infallible;
}

impl OutputPin for NoBrake {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Single stepper axis.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `CLK`: Time source (must implement [`Clock`])
/// - `BRAKE`: Brake pin type (defaults to [`NoBrake`])
/// - `EV`: Event receiver (defaults to [`NoEvents`])
pub struct StepperAxis<STEP, DIR, CLK, BRAKE = NoBrake, EV = NoEvents>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    BRAKE: OutputPin,
    EV: MotionEvents,
{
    /// STEP pin (pulse to move one step).
    pub(super) step_pin: STEP,

    /// DIR pin (high = positive, or inverted).
    pub(super) dir_pin: DIR,

    /// Optional brake line and the level that engages it.
    pub(super) brake_pin: Option<BRAKE>,
    pub(super) brake_level: ActiveLevel,

    pub(super) clock: CLK,
    pub(super) events: EV,

    /// Axis name for logging/debugging.
    pub(super) name: heapless::String<32>,

    /// Whether direction pin logic is inverted.
    pub(super) invert_direction: bool,

    /// Direction currently driven on the DIR pin.
    pub(super) current_direction: Option<Direction>,

    pub(super) position: Position,
    /// Signed velocity in steps/s, 0 at rest.
    pub(super) velocity: f32,
    pub(super) phase: MotionPhase,
    pub(super) params: ProfileParameters,
    pub(super) scheduler: StepPulseScheduler,
    pub(super) safety: SafetyState,
    pub(super) brake: BrakeSequencer,
    pub(super) homing: HomingState,
    pub(super) mode: Mode,

    /// Direction of the most recent pulse, kept across stops.
    pub(super) last_step_direction: Option<Direction>,

    /// Set by every pulse, cleared once the resulting stop has been handled.
    pub(super) arrival_pending: bool,

    /// A stop made outside the tick; the next tick hands it to the brake.
    pub(super) stop_pending: bool,

    /// Level the home switch reads when pressed.
    pub(super) home_switch_level: ActiveLevel,
}

impl<STEP, DIR, CLK, BRAKE, EV> StepperAxis<STEP, DIR, CLK, BRAKE, EV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    BRAKE: OutputPin,
    EV: MotionEvents,
{
    /// Create an idle axis at position 0.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        step_pin: STEP,
        dir_pin: DIR,
        brake_pin: Option<BRAKE>,
        brake_level: ActiveLevel,
        clock: CLK,
        events: EV,
        name: heapless::String<32>,
        invert_direction: bool,
    ) -> Self {
        let mut brake = BrakeSequencer::new();
        brake.set_configured(brake_pin.is_some());
        Self {
            step_pin,
            dir_pin,
            brake_pin,
            brake_level,
            clock,
            events,
            name,
            invert_direction,
            current_direction: None,
            position: Position::new(),
            velocity: 0.0,
            phase: MotionPhase::Complete,
            params: ProfileParameters::new(),
            scheduler: StepPulseScheduler::new(),
            safety: SafetyState::new(),
            brake,
            homing: HomingState::new(),
            mode: Mode::Idle,
            last_step_direction: None,
            arrival_pending: false,
            stop_pending: false,
            home_switch_level: ActiveLevel::Low,
        }
    }

    /// Get the axis name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Current operating mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Phase of the current move.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Profile parameters in effect.
    #[inline]
    pub fn params(&self) -> &ProfileParameters {
        &self.params
    }

    /// Latched safety inputs.
    #[inline]
    pub fn safety(&self) -> &SafetyState {
        &self.safety
    }

    /// Brake timing state.
    #[inline]
    pub fn brake(&self) -> &BrakeSequencer {
        &self.brake
    }

    /// Step timing state.
    #[inline]
    pub fn scheduler(&self) -> &StepPulseScheduler {
        &self.scheduler
    }

    /// The event receiver.
    #[inline]
    pub fn events(&self) -> &EV {
        &self.events
    }

    /// The event receiver, mutably.
    #[inline]
    pub fn events_mut(&mut self) -> &mut EV {
        &mut self.events
    }

    /// The clock.
    #[inline]
    pub fn clock_mut(&mut self) -> &mut CLK {
        &mut self.clock
    }

    /// Take the axis apart, returning its pins.
    pub fn release(self) -> (STEP, DIR, Option<BRAKE>) {
        (self.step_pin, self.dir_pin, self.brake_pin)
    }

    /// Run one iteration of the motion state machine.
    ///
    /// Call this frequently and regularly, at least once per step period.
    /// Returns `true` when the axis is at rest on its target.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin operation fails.
    pub fn tick(&mut self) -> Result<bool> {
        let now = self.clock.now_us();

        if self.process_emergency_stop(now)? {
            return Ok(false);
        }

        if let Some(action) = self.brake.poll(now) {
            self.drive_brake(action)?;
        }
        if core::mem::take(&mut self.stop_pending) {
            if let Some(action) = self.brake.on_motion_stopped(now) {
                self.drive_brake(action)?;
            }
        }

        if self.process_limit_switch(now)? {
            return Ok(true);
        }

        if self.velocity == 0.0 && self.position.on_target() {
            self.settle(now)?;
            return Ok(true);
        }

        self.step_if_due(now)
    }

    /// Whether the axis is at rest on its target.
    #[inline]
    pub fn motion_complete(&self) -> bool {
        self.velocity == 0.0 && self.position.on_target()
    }

    /// At rest short of the target with parameters that cannot start a move.
    pub(super) fn motion_stalled(&self) -> bool {
        self.velocity == 0.0 && !self.position.on_target() && !self.params.can_move()
    }

    /// Returns `true` while a held emergency stop freezes the axis.
    fn process_emergency_stop(&mut self, now: u64) -> Result<bool> {
        if self.safety.take_emergency_trigger() {
            let hold = self.safety.hold_until_release();
            warn!("{}: emergency stop (hold: {})", self.name.as_str(), hold);
            self.homing.abort();
            self.events.on_emergency_stop_triggered();
            self.enter(Mode::EmergencyStopped);
            if hold {
                self.hard_stop(now, true)?;
                if let Some(action) = self.brake.engage() {
                    self.drive_brake(action)?;
                }
            } else {
                self.target_braking_point();
            }
        }

        if self.safety.take_emergency_release() {
            info!("{}: emergency stop released", self.name.as_str());
            self.events.on_emergency_stop_released();
            self.enter(Mode::Idle);
        }

        Ok(self.safety.hold_until_release())
    }

    /// Returns `true` when a fresh limit trigger stopped the axis.
    fn process_limit_switch(&mut self, now: u64) -> Result<bool> {
        let Some(switch) = self.safety.take_limit_trigger() else {
            return Ok(false);
        };

        if let Some(seek) = self.homing.seek() {
            let moving = self.direction_of_travel().unwrap_or(seek.direction);
            if moving == seek.direction && switch.blocked_direction(Some(moving)) == Some(moving) {
                self.hard_stop(now, false)?;
                self.safety.block(Some(seek.direction));
                self.finish_limit_seek();
                return Ok(true);
            }
        }

        let travelling = self.direction_of_travel().or(self.last_step_direction);
        let blocked = switch.blocked_direction(travelling);
        warn!(
            "{}: limit switch {:?} at {}, blocking {:?}",
            self.name.as_str(),
            switch,
            self.position.current(),
            blocked
        );
        let was_moving = self.velocity != 0.0
            || matches!(self.mode, Mode::Positioning | Mode::Jogging);
        self.hard_stop(now, false)?;
        self.safety.block(blocked);
        if self.homing.abort() {
            warn!("{}: limit seek hit the opposite switch", self.name.as_str());
        }
        // a switch reported at rest only blocks
        if was_moving {
            self.events.on_limit_reached();
        }
        if !self.safety.emergency_stop_active() {
            self.enter(Mode::Idle);
        }
        Ok(true)
    }

    /// Handle the axis resting on its target.
    pub(super) fn settle(&mut self, now: u64) -> Result<()> {
        match self.mode {
            Mode::EmergencyStopped => {
                self.safety.finish_emergency_stop();
                info!("{}: emergency stop complete", self.name.as_str());
                self.events.on_emergency_stop_released();
            }
            Mode::Homing => {
                self.homing.fail();
                info!(
                    "{}: no limit found within travel budget, stopped at {}",
                    self.name.as_str(),
                    self.position.current()
                );
            }
            Mode::Positioning | Mode::Jogging if self.arrival_pending => {
                self.events.on_target_reached(self.position.current());
            }
            _ => {}
        }

        if core::mem::take(&mut self.arrival_pending) {
            if let Some(action) = self.brake.on_motion_stopped(now) {
                self.drive_brake(action)?;
            }
        }
        self.phase = MotionPhase::Complete;
        self.enter(Mode::Idle);
        Ok(())
    }

    fn step_if_due(&mut self, now: u64) -> Result<bool> {
        if self.velocity == 0.0 {
            let decision = MotionPlanner::new(&self.params).start(self.kinematics());
            let Some(direction) = decision.direction() else {
                return Ok(false);
            };

            if self.safety.is_blocked(direction) {
                debug!(
                    "{}: motion {:?} refused by limit switch",
                    self.name.as_str(),
                    direction
                );
                self.position.hold();
                self.arrival_pending = false;
                return Ok(false);
            }

            if let Some(action) = self.brake.request_release(now) {
                self.drive_brake(action)?;
            }
            if self.brake.blocks_motion() {
                return Ok(false);
            }

            self.velocity = decision.velocity;
            self.phase = decision.phase;
            self.scheduler.schedule(decision.velocity, decision.phase);
            if self.mode == Mode::Idle {
                self.enter(Mode::Positioning);
            }
        }

        if !self.scheduler.is_due(now) {
            return Ok(false);
        }

        self.emit_step(now)
    }

    /// Emit one pulse and plan the next.
    ///
    /// Planning runs between the rising and falling edge so the pulse is
    /// as wide as the bookkeeping takes.
    fn emit_step(&mut self, now: u64) -> Result<bool> {
        let Some(direction) = Direction::of_velocity(self.velocity) else {
            return Ok(false);
        };
        self.write_direction(direction)?;

        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;

        let kinematics = self.kinematics();
        self.position.advance(direction);
        self.scheduler.record_step(now);
        self.brake.note_step();
        if self.safety.note_motion(direction) {
            debug!("{}: moved off limit switch", self.name.as_str());
        }
        self.last_step_direction = Some(direction);
        self.arrival_pending = true;

        let decision = MotionPlanner::new(&self.params).after_step(Kinematics {
            position: self.position.current(),
            ..kinematics
        });
        self.velocity = decision.velocity;
        self.phase = decision.phase;
        self.scheduler.schedule(decision.velocity, decision.phase);

        self.step_pin.set_low().map_err(|_| MotorError::PinError)?;

        if decision.is_complete() {
            self.settle(now)?;
        }
        Ok(decision.is_complete())
    }

    /// Immediate stop with no deceleration ramp.
    pub(super) fn hard_stop(&mut self, now: u64, keep_target: bool) -> Result<()> {
        self.velocity = 0.0;
        self.phase = MotionPhase::Complete;
        self.scheduler.schedule(0.0, MotionPhase::Complete);
        if !keep_target {
            self.position.hold();
        }
        if core::mem::take(&mut self.arrival_pending) {
            if let Some(action) = self.brake.on_motion_stopped(now) {
                self.drive_brake(action)?;
            }
        }
        Ok(())
    }

    /// Stop without a ramp and redefine the position, outside the tick.
    ///
    /// A move cut short this way still counts as a stop for the brake, which
    /// the next tick sequences.
    pub(super) fn halt_at(&mut self, position: i64) {
        self.velocity = 0.0;
        self.phase = MotionPhase::Complete;
        self.scheduler.schedule(0.0, MotionPhase::Complete);
        self.position.redefine(position);
        self.stop_pending |= core::mem::take(&mut self.arrival_pending);
        self.homing.abort();
    }

    /// Point the target at the nearest position the axis can stop on.
    pub(super) fn target_braking_point(&mut self) {
        let Some(direction) = Direction::of_velocity(self.velocity) else {
            self.position.hold();
            return;
        };
        let braking = libm::ceilf(self.params.braking_distance(self.velocity.abs())) as i64;
        // an existing target already inside the braking distance is kept
        let ahead = self
            .position
            .distance_to_target()
            .saturating_mul(direction.sign());
        if ahead <= 0 || ahead > braking {
            self.position.set_target(
                self.position
                    .current()
                    .saturating_add(direction.sign().saturating_mul(braking)),
            );
        }
    }

    pub(super) fn finish_limit_seek(&mut self) {
        let Some(LimitSeek {
            goal, continuation, ..
        }) = self.homing.succeed()
        else {
            return;
        };
        match goal {
            LimitGoal::Home => {
                self.position.redefine(0);
                self.homing.set_homed(true);
                info!("{}: homed", self.name.as_str());
                self.events.on_home_reached();
            }
            LimitGoal::Limit => {
                info!(
                    "{}: limit reached at {}",
                    self.name.as_str(),
                    self.position.current()
                );
                self.events.on_limit_reached();
            }
        }
        self.enter(Mode::Idle);
        if let Some(callback) = continuation {
            callback();
        }
    }

    pub(super) fn kinematics(&self) -> Kinematics {
        Kinematics {
            position: self.position.current(),
            target: self.position.target(),
            velocity: self.velocity,
        }
    }

    pub(super) fn direction_of_travel(&self) -> Option<Direction> {
        Direction::of_velocity(self.velocity)
    }

    pub(super) fn enter(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("{}: {} -> {}", self.name.as_str(), self.mode.name(), mode.name());
            self.mode = mode;
        }
    }

    pub(super) fn drive_brake(&mut self, action: BrakeAction) -> Result<()> {
        trace!("{}: brake {:?}", self.name.as_str(), action);
        let Some(pin) = self.brake_pin.as_mut() else {
            return Ok(());
        };
        let high = self.brake_level.pin_high(action == BrakeAction::Engage);
        let res = if high { pin.set_high() } else { pin.set_low() };
        res.map_err(|_| MotorError::PinError)?;
        Ok(())
    }

    fn write_direction(&mut self, direction: Direction) -> Result<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = (direction == Direction::Positive) != self.invert_direction;
        let res = if pin_high {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        res.map_err(|_| MotorError::PinError)?;

        self.current_direction = Some(direction);
        Ok(())
    }
}
