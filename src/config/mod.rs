//! Configuration module for flexy-stepper.
//!
//! Provides types for loading and validating axis and worker configurations
//! from TOML files (with `std` feature) or pre-parsed data.

mod axis;
mod service;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use axis::{AxisConfig, BrakeConfig, HomingConfig};
pub use service::ServiceConfig;
pub use system::SystemConfig;
pub use validation::{validate_axis, validate_config};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Millimeters, Revolutions, Steps, StepsPerSec, StepsPerSecSquared};
