//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{AxisConfig, ServiceConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Unit factors, speed and rates are positive and finite
/// - Homing direction is -1 or 1
/// - Brake release delay is not below -1
/// - Worker period is non-zero
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (_, axis) in config.axes.iter() {
        validate_axis(axis)?;
    }
    validate_service(&config.service)
}

/// Validate a single axis configuration.
pub fn validate_axis(config: &AxisConfig) -> Result<()> {
    for factor in [config.steps_per_millimeter, config.steps_per_revolution] {
        if !is_positive(factor) {
            return Err(Error::Config(ConfigError::InvalidUnitFactor(factor)));
        }
    }

    if !is_positive(config.speed.value()) {
        return Err(Error::Config(ConfigError::InvalidSpeed(config.speed.value())));
    }

    let deceleration = config.effective_deceleration().value();
    for rate in [config.acceleration.value(), deceleration] {
        if !is_positive(rate) {
            return Err(Error::Config(ConfigError::InvalidAcceleration(rate)));
        }
    }

    if config.homing.direction != -1 && config.homing.direction != 1 {
        return Err(Error::Config(ConfigError::InvalidHomingDirection(
            config.homing.direction,
        )));
    }

    if let Some(brake) = config.brake {
        if brake.release_delay_ms < -1 {
            return Err(Error::Config(ConfigError::InvalidBrakeReleaseDelay(
                brake.release_delay_ms,
            )));
        }
    }

    Ok(())
}

fn validate_service(config: &ServiceConfig) -> Result<()> {
    if config.period_us == 0 {
        return Err(Error::Config(ConfigError::InvalidServicePeriod(0)));
    }
    Ok(())
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}
