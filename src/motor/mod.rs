//! Motor module for flexy-stepper.
//!
//! Provides the stepper axis driver, its operating modes, position tracking
//! and the caller-facing API.

mod api;
mod builder;
mod command;
mod driver;
mod homing;
mod mode;
mod position;

pub use builder::StepperAxisBuilder;
pub use command::{Length, MotionCommand, Rate};
pub use driver::{NoBrake, StepperAxis};
pub use homing::{HomingState, UNBOUNDED_TRAVEL_STEPS};
pub use mode::Mode;
pub use position::Position;
