//! Builder pattern for StepperAxis.

use embedded_hal::digital::OutputPin;

use crate::brake::ActiveLevel;
use crate::clock::Clock;
use crate::config::{AxisConfig, SystemConfig};
use crate::error::{ConfigError, Error, Result};
use crate::events::{MotionEvents, NoEvents};

use super::driver::{NoBrake, StepperAxis};

/// Builder for creating StepperAxis instances.
pub struct StepperAxisBuilder<STEP, DIR, CLK, BRAKE = NoBrake, EV = NoEvents> {
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    clock: Option<CLK>,
    brake_pin: Option<BRAKE>,
    brake_level: ActiveLevel,
    brake_engage_delay_ms: u32,
    brake_release_delay_ms: i32,
    events: EV,
    name: Option<heapless::String<32>>,
    invert_direction: bool,
    steps_per_millimeter: f32,
    steps_per_revolution: f32,
    speed: Option<f32>,
    acceleration: Option<f32>,
    deceleration: Option<f32>,
    home_direction: i8,
    home_switch_level: ActiveLevel,
    homing_max_distance_steps: Option<i64>,
}

impl<STEP, DIR, CLK> Default for StepperAxisBuilder<STEP, DIR, CLK> {
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR, CLK> StepperAxisBuilder<STEP, DIR, CLK> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step_pin: None,
            dir_pin: None,
            clock: None,
            brake_pin: None,
            brake_level: ActiveLevel::High,
            brake_engage_delay_ms: 0,
            brake_release_delay_ms: -1,
            events: NoEvents,
            name: None,
            invert_direction: false,
            steps_per_millimeter: 25.0,
            steps_per_revolution: 200.0,
            speed: None,
            acceleration: None,
            deceleration: None,
            home_direction: -1,
            home_switch_level: ActiveLevel::Low,
            homing_max_distance_steps: None,
        }
    }
}

impl<STEP, DIR, CLK, BRAKE, EV> StepperAxisBuilder<STEP, DIR, CLK, BRAKE, EV> {
    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the time source.
    pub fn clock(mut self, clock: CLK) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Attach a brake line.
    pub fn brake_pin<B>(self, pin: B) -> StepperAxisBuilder<STEP, DIR, CLK, B, EV> {
        StepperAxisBuilder {
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            clock: self.clock,
            brake_pin: Some(pin),
            brake_level: self.brake_level,
            brake_engage_delay_ms: self.brake_engage_delay_ms,
            brake_release_delay_ms: self.brake_release_delay_ms,
            events: self.events,
            name: self.name,
            invert_direction: self.invert_direction,
            steps_per_millimeter: self.steps_per_millimeter,
            steps_per_revolution: self.steps_per_revolution,
            speed: self.speed,
            acceleration: self.acceleration,
            deceleration: self.deceleration,
            home_direction: self.home_direction,
            home_switch_level: self.home_switch_level,
            homing_max_distance_steps: self.homing_max_distance_steps,
        }
    }

    /// Set the event receiver.
    pub fn events<E>(self, events: E) -> StepperAxisBuilder<STEP, DIR, CLK, BRAKE, E> {
        StepperAxisBuilder {
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            clock: self.clock,
            brake_pin: self.brake_pin,
            brake_level: self.brake_level,
            brake_engage_delay_ms: self.brake_engage_delay_ms,
            brake_release_delay_ms: self.brake_release_delay_ms,
            events,
            name: self.name,
            invert_direction: self.invert_direction,
            steps_per_millimeter: self.steps_per_millimeter,
            steps_per_revolution: self.steps_per_revolution,
            speed: self.speed,
            acceleration: self.acceleration,
            deceleration: self.deceleration,
            home_direction: self.home_direction,
            home_switch_level: self.home_switch_level,
            homing_max_distance_steps: self.homing_max_distance_steps,
        }
    }

    /// Level that engages the brake.
    pub fn brake_active_level(mut self, level: ActiveLevel) -> Self {
        self.brake_level = level;
        self
    }

    /// Brake engage and release delays in milliseconds.
    pub fn brake_delays_ms(mut self, engage_delay_ms: u32, release_delay_ms: i32) -> Self {
        self.brake_engage_delay_ms = engage_delay_ms;
        self.brake_release_delay_ms = release_delay_ms;
        self
    }

    /// Set the axis name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = heapless::String::try_from(name).ok();
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set steps per millimeter.
    pub fn steps_per_millimeter(mut self, factor: f32) -> Self {
        self.steps_per_millimeter = factor;
        self
    }

    /// Set steps per revolution.
    pub fn steps_per_revolution(mut self, factor: f32) -> Self {
        self.steps_per_revolution = factor;
        self
    }

    /// Set cruise speed in steps per second.
    pub fn speed(mut self, steps_per_sec: f32) -> Self {
        self.speed = Some(steps_per_sec);
        self
    }

    /// Set acceleration in steps per second squared.
    ///
    /// Also used for deceleration unless [`Self::deceleration`] is set.
    pub fn acceleration(mut self, steps_per_sec2: f32) -> Self {
        self.acceleration = Some(steps_per_sec2);
        self
    }

    /// Set deceleration in steps per second squared.
    pub fn deceleration(mut self, steps_per_sec2: f32) -> Self {
        self.deceleration = Some(steps_per_sec2);
        self
    }

    /// Set the direction of the home switch, `-1` or `1`.
    pub fn home_direction(mut self, direction: i8) -> Self {
        self.home_direction = direction;
        self
    }

    /// Level the home switch reads when pressed.
    pub fn home_switch_level(mut self, level: ActiveLevel) -> Self {
        self.home_switch_level = level;
        self
    }

    /// Configure from an AxisConfig.
    pub fn from_axis_config(mut self, config: &AxisConfig) -> Self {
        self.name = Some(config.name.clone());
        self.steps_per_millimeter = config.steps_per_millimeter;
        self.steps_per_revolution = config.steps_per_revolution;
        self.speed = Some(config.speed.value());
        self.acceleration = Some(config.acceleration.value());
        self.deceleration = Some(config.effective_deceleration().value());
        self.invert_direction = config.invert_direction;
        self.home_direction = config.homing.direction;
        self.home_switch_level = config.homing.switch_level;
        self.homing_max_distance_steps = Some(config.homing.max_distance_steps);
        if let Some(brake) = config.brake {
            self.brake_level = brake.active_level;
            self.brake_engage_delay_ms = brake.engage_delay_ms;
            self.brake_release_delay_ms = brake.release_delay_ms;
        }
        self
    }

    /// Configure from SystemConfig by axis name.
    pub fn from_config(self, config: &SystemConfig, axis_name: &str) -> Result<Self> {
        let axis_config = config.axis(axis_name).ok_or_else(|| {
            Error::Config(ConfigError::AxisNotFound(
                heapless::String::try_from(axis_name).unwrap_or_default(),
            ))
        })?;

        Ok(self.from_axis_config(axis_config))
    }
}

impl<STEP, DIR, CLK, BRAKE, EV> StepperAxisBuilder<STEP, DIR, CLK, BRAKE, EV>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    BRAKE: OutputPin,
    EV: MotionEvents,
{
    /// Build the StepperAxis.
    ///
    /// Invalid rates or factors are ignored like their setters would; the
    /// axis then stays at rest until they are corrected.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin or the clock is missing.
    pub fn build(self) -> Result<StepperAxis<STEP, DIR, CLK, BRAKE, EV>> {
        let step_pin = self
            .step_pin
            .ok_or(Error::Config(ConfigError::MissingPart("step_pin")))?;
        let dir_pin = self
            .dir_pin
            .ok_or(Error::Config(ConfigError::MissingPart("dir_pin")))?;
        let clock = self
            .clock
            .ok_or(Error::Config(ConfigError::MissingPart("clock")))?;

        let name = self
            .name
            .unwrap_or_else(|| heapless::String::try_from("axis").unwrap_or_default());

        let mut axis = StepperAxis::new(
            step_pin,
            dir_pin,
            self.brake_pin,
            self.brake_level,
            clock,
            self.events,
            name,
            self.invert_direction,
        );

        axis.set_steps_per_millimeter(self.steps_per_millimeter);
        axis.set_steps_per_revolution(self.steps_per_revolution);
        if let Some(speed) = self.speed {
            axis.set_speed_in_steps_per_second(speed);
        }
        if let Some(acceleration) = self.acceleration {
            axis.set_acceleration_in_steps_per_second_per_second(acceleration);
        }
        if let Some(deceleration) = self.deceleration.or(self.acceleration) {
            axis.set_deceleration_in_steps_per_second_per_second(deceleration);
        }
        axis.set_direction_to_home(self.home_direction);
        axis.set_home_switch_level(self.home_switch_level);
        if let Some(max_distance) = self.homing_max_distance_steps {
            axis.set_homing_max_distance_steps(max_distance);
        }
        axis.set_brake_engage_delay_ms(self.brake_engage_delay_ms);
        axis.set_brake_release_delay_ms(self.brake_release_delay_ms);

        debug!("{}: axis built", axis.name());
        Ok(axis)
    }
}

impl<STEP, DIR, CLK> StepperAxis<STEP, DIR, CLK>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
{
    /// Start building an axis.
    pub fn builder() -> StepperAxisBuilder<STEP, DIR, CLK> {
        StepperAxisBuilder::new()
    }
}
