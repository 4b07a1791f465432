//! Unit tests for configuration validation.

use flexy_stepper::config::{parse_config, validate_config, SystemConfig};
use flexy_stepper::error::{ConfigError, Error};

fn axis_toml(extra: &str) -> String {
    format!(
        r#"
[axes.x]
name = "X"
speed_steps_per_sec = 1000.0
acceleration_steps_per_sec2 = 5000.0
{extra}
"#
    )
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config: SystemConfig =
        toml::from_str(&axis_toml("")).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());
}

/// Test that an empty configuration is valid.
#[test]
fn test_empty_config_passes_validation() {
    let config = SystemConfig::default();
    assert!(validate_config(&config).is_ok());
}

/// Test validation fails for a zero unit factor.
#[test]
fn test_zero_steps_per_millimeter() {
    let result = parse_config(&axis_toml("steps_per_millimeter = 0.0"));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidUnitFactor(_)))
    ));
}

/// Test validation fails for a negative speed.
#[test]
fn test_negative_speed() {
    let toml_str = r#"
[axes.x]
name = "X"
speed_steps_per_sec = -10.0
acceleration_steps_per_sec2 = 5000.0
"#;
    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidSpeed(_)))
    ));
}

/// Test validation fails for a zero deceleration.
#[test]
fn test_zero_deceleration() {
    let result = parse_config(&axis_toml("deceleration_steps_per_sec2 = 0.0"));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidAcceleration(_)))
    ));
}

/// Test validation fails for a homing direction other than -1 or 1.
#[test]
fn test_invalid_homing_direction() {
    let result = parse_config(&axis_toml("[axes.x.homing]\ndirection = 0"));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidHomingDirection(0)))
    ));
}

/// Test validation fails for a release delay below -1.
#[test]
fn test_invalid_brake_release_delay() {
    let result = parse_config(&axis_toml("[axes.x.brake]\nrelease_delay_ms = -5"));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidBrakeReleaseDelay(-5)))
    ));
}

/// Test that -1 is accepted as an immediate release.
#[test]
fn test_immediate_brake_release_is_valid() {
    let config = parse_config(&axis_toml("[axes.x.brake]\nrelease_delay_ms = -1"))
        .expect("Config should be valid");
    let brake = config.axis("x").and_then(|a| a.brake).expect("Brake not found");
    assert_eq!(brake.release_delay_ms, -1);
}

/// Test validation fails for a zero worker period.
#[test]
fn test_zero_service_period() {
    let toml_str = format!("[service]\nperiod_us = 0\n{}", axis_toml(""));
    let result = parse_config(&toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidServicePeriod(0)))
    ));
}

/// Test that malformed TOML reports a parse error.
#[test]
fn test_malformed_toml() {
    let result = parse_config("[axes.x\nname = ");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}
