//! Error types for flexy-stepper.
//!
//! Motion itself never fails: rejected settings are ignored and safety stops are
//! ordinary state transitions. What remains fallible is hardware access,
//! configuration and the optional background worker.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all flexy-stepper operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Axis hardware or construction error
    Motor(MotorError),
    /// Background worker error
    #[cfg(feature = "std")]
    Service(ServiceError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Axis name not found in configuration
    AxisNotFound(heapless::String<32>),
    /// A unit conversion factor (steps per mm / per revolution) must be > 0
    InvalidUnitFactor(f32),
    /// Speed must be > 0
    InvalidSpeed(f32),
    /// Acceleration or deceleration must be > 0
    InvalidAcceleration(f32),
    /// Homing direction must be -1 or 1
    InvalidHomingDirection(i8),
    /// Brake release delay must be >= -1
    InvalidBrakeReleaseDelay(i32),
    /// Worker period must be > 0
    InvalidServicePeriod(u32),
    /// A required builder part was not supplied
    MissingPart(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Axis hardware errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
}

/// Background worker errors.
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The worker thread could not be spawned
    SpawnFailed(heapless::String<64>),
    /// The worker is no longer running, commands cannot be delivered
    NotRunning,
    /// The worker thread panicked
    WorkerPanicked,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            #[cfg(feature = "std")]
            Error::Service(e) => write!(f, "Service error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::AxisNotFound(name) => write!(f, "Axis '{}' not found", name),
            ConfigError::InvalidUnitFactor(v) => {
                write!(f, "Invalid unit conversion factor: {}. Must be > 0", v)
            }
            ConfigError::InvalidSpeed(v) => write!(f, "Invalid speed: {}. Must be > 0", v),
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidHomingDirection(v) => {
                write!(f, "Invalid homing direction: {}. Must be -1 or 1", v)
            }
            ConfigError::InvalidBrakeReleaseDelay(v) => {
                write!(f, "Invalid brake release delay: {} ms. Must be >= -1", v)
            }
            ConfigError::InvalidServicePeriod(v) => {
                write!(f, "Invalid service period: {} us. Must be > 0", v)
            }
            ConfigError::MissingPart(part) => write!(f, "{} is required", part),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::SpawnFailed(msg) => write!(f, "Failed to spawn worker: {}", msg),
            ServiceError::NotRunning => write!(f, "Worker is not running"),
            ServiceError::WorkerPanicked => write!(f, "Worker thread panicked"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

#[cfg(feature = "std")]
impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Error::Service(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for ServiceError {}
