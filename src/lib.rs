//! # flexy-stepper
//!
//! Single-axis stepper motion control with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Trapezoidal profiles**: Independent acceleration and deceleration, with
//!   speed and target changes honoured mid-move
//! - **Non-blocking tick**: One bounded state-machine step per call, at most one pulse
//! - **Safety inputs**: Limit switches with direction blocking, held or ramped emergency stop
//! - **Homing and jogging**: Blocking or non-blocking limit seeks
//! - **Brake sequencing**: Delayed engage and release, step emission gated on the brake
//! - **Units**: Steps, millimeters or revolutions for every position and rate
//! - **no_std compatible**: Core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flexy_stepper::{StdClock, StepperAxis};
//!
//! let config = flexy_stepper::load_config("axes.toml")?;
//!
//! let mut axis = StepperAxis::builder()
//!     .from_config(&config, "x")?
//!     .step_pin(step_pin)
//!     .dir_pin(dir_pin)
//!     .clock(StdClock::new())
//!     .build()?;
//!
//! axis.set_target_position_in_millimeters(50.0);
//! while !axis.tick()? {}
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing and the worker thread
//! - `log` (default): Logs through the `log` facade
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// must come first so the logging macros are visible everywhere
#[macro_use]
mod fmt;

// Core modules
pub mod brake;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod motion;
pub mod motor;
pub mod safety;
#[cfg(feature = "std")]
pub mod service;

// Re-exports for ergonomic API
pub use brake::{ActiveLevel, BrakeAction, BrakeSequencer};
pub use clock::{Clock, SimulatedClock};
pub use config::{validate_config, AxisConfig, ServiceConfig, SystemConfig};
pub use error::{Error, Result};
pub use events::{EventCounter, MotionEvents, NoEvents};
pub use motion::{Direction, MotionPhase, ProfileParameters};
pub use motor::{Length, Mode, MotionCommand, NoBrake, Rate, StepperAxis, StepperAxisBuilder};
pub use safety::{LimitSwitch, SafetyState};

#[cfg(feature = "std")]
pub use clock::StdClock;
#[cfg(feature = "std")]
pub use service::{AxisHandle, AxisStatus, ServiceAxis, ServiceRunner};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Millimeters, Revolutions, Steps, UnitExt};
