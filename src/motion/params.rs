//! Profile parameters: speed, acceleration, deceleration and unit factors.
//!
//! All values are held in steps. Setters reject invalid input by leaving the
//! previous value untouched; a parameter set that cannot move (see
//! [`ProfileParameters::can_move`]) simply keeps the axis at rest.

use libm::sqrtf;

use crate::config::units::{from_steps, to_steps};

/// Speed and rate settings for one axis, in steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileParameters {
    desired_speed: f32,
    acceleration: f32,
    deceleration: f32,
    steps_per_millimeter: f32,
    steps_per_revolution: f32,
}

impl ProfileParameters {
    /// Zeroed parameters; the axis cannot move until speed and rates are set.
    pub const fn new() -> Self {
        Self {
            desired_speed: 0.0,
            acceleration: 0.0,
            deceleration: 0.0,
            steps_per_millimeter: 0.0,
            steps_per_revolution: 0.0,
        }
    }

    /// Cruise speed in steps/s.
    #[inline]
    pub fn desired_speed(&self) -> f32 {
        self.desired_speed
    }

    /// Acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Deceleration in steps/s².
    #[inline]
    pub fn deceleration(&self) -> f32 {
        self.deceleration
    }

    /// Steps per millimeter of travel.
    #[inline]
    pub fn steps_per_millimeter(&self) -> f32 {
        self.steps_per_millimeter
    }

    /// Steps per output revolution.
    #[inline]
    pub fn steps_per_revolution(&self) -> f32 {
        self.steps_per_revolution
    }

    /// Set the cruise speed in steps/s. Non-positive values are ignored.
    pub fn set_speed(&mut self, steps_per_sec: f32) -> bool {
        if !is_positive(steps_per_sec) {
            return false;
        }
        self.desired_speed = steps_per_sec;
        true
    }

    /// Set the acceleration in steps/s². Non-positive values are ignored.
    pub fn set_acceleration(&mut self, steps_per_sec2: f32) -> bool {
        if !is_positive(steps_per_sec2) {
            return false;
        }
        self.acceleration = steps_per_sec2;
        true
    }

    /// Set the deceleration in steps/s². Non-positive values are ignored.
    pub fn set_deceleration(&mut self, steps_per_sec2: f32) -> bool {
        if !is_positive(steps_per_sec2) {
            return false;
        }
        self.deceleration = steps_per_sec2;
        true
    }

    /// Set the steps-per-millimeter factor. Non-positive values are ignored.
    pub fn set_steps_per_millimeter(&mut self, factor: f32) -> bool {
        if !is_positive(factor) {
            return false;
        }
        self.steps_per_millimeter = factor;
        true
    }

    /// Set the steps-per-revolution factor. Non-positive values are ignored.
    pub fn set_steps_per_revolution(&mut self, factor: f32) -> bool {
        if !is_positive(factor) {
            return false;
        }
        self.steps_per_revolution = factor;
        true
    }

    /// Whether these parameters allow motion to start.
    #[inline]
    pub fn can_move(&self) -> bool {
        self.desired_speed > 0.0 && self.acceleration > 0.0 && self.deceleration > 0.0
    }

    /// Floor speed while a move is in progress.
    ///
    /// This is the speed reached after a single step from rest, `sqrt(2·a)`,
    /// capped at the cruise speed. It bounds the longest step period.
    pub fn slowest_step_speed(&self) -> f32 {
        if !self.can_move() {
            return 0.0;
        }
        sqrtf(2.0 * self.acceleration).min(self.desired_speed)
    }

    /// Steps needed to brake from `speed` to rest: `v² / (2·d)`.
    #[inline]
    pub fn braking_distance(&self, speed: f32) -> f32 {
        if self.deceleration <= 0.0 {
            return f32::INFINITY;
        }
        speed * speed / (2.0 * self.deceleration)
    }

    /// Convert millimeters (or mm/s, mm/s²) to steps.
    #[inline]
    pub fn mm_to_steps_f32(&self, mm: f32) -> f32 {
        mm * self.steps_per_millimeter
    }

    /// Convert revolutions (or rev/s, rev/s²) to steps.
    #[inline]
    pub fn revs_to_steps_f32(&self, revs: f32) -> f32 {
        revs * self.steps_per_revolution
    }

    /// Millimeter position to whole steps.
    #[inline]
    pub fn mm_to_steps(&self, mm: f32) -> i64 {
        to_steps(mm, self.steps_per_millimeter)
    }

    /// Revolution position to whole steps.
    #[inline]
    pub fn revs_to_steps(&self, revs: f32) -> i64 {
        to_steps(revs, self.steps_per_revolution)
    }

    /// Whole steps to millimeters.
    #[inline]
    pub fn steps_to_mm(&self, steps: i64) -> f32 {
        from_steps(steps, self.steps_per_millimeter)
    }

    /// Whole steps to revolutions.
    #[inline]
    pub fn steps_to_revs(&self, steps: i64) -> f32 {
        from_steps(steps, self.steps_per_revolution)
    }

    /// A step rate in steps/s expressed per millimeter.
    #[inline]
    pub fn rate_to_mm(&self, steps_per_sec: f32) -> f32 {
        if self.steps_per_millimeter > 0.0 {
            steps_per_sec / self.steps_per_millimeter
        } else {
            0.0
        }
    }

    /// A step rate in steps/s expressed per revolution.
    #[inline]
    pub fn rate_to_revs(&self, steps_per_sec: f32) -> f32 {
        if self.steps_per_revolution > 0.0 {
            steps_per_sec / self.steps_per_revolution
        } else {
            0.0
        }
    }
}

#[inline]
fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}
