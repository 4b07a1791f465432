//! Unit tests for TOML configuration parsing.

use flexy_stepper::config::{load_config, SystemConfig};
use flexy_stepper::ActiveLevel;

/// Test parsing a valid axis configuration from TOML.
#[test]
fn test_parse_axis_config() {
    let toml_str = r#"
[axes.x]
name = "carriage"
steps_per_millimeter = 80.0
steps_per_revolution = 3200.0
speed_steps_per_sec = 4000.0
acceleration_steps_per_sec2 = 16000.0
invert_direction = true
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let axis = config.axis("x").expect("Axis not found");

    assert_eq!(axis.name.as_str(), "carriage");
    assert_eq!(axis.steps_per_millimeter, 80.0);
    assert_eq!(axis.steps_per_revolution, 3200.0);
    assert_eq!(axis.speed.value(), 4000.0);
    assert_eq!(axis.acceleration.value(), 16000.0);
    assert!(axis.deceleration.is_none());
    assert_eq!(axis.effective_deceleration().value(), 16000.0);
    assert!(axis.invert_direction);
    assert!(axis.brake.is_none());
}

/// Test that omitted sections fall back to their defaults.
#[test]
fn test_parse_defaults() {
    let toml_str = r#"
[axes.z]
name = "lift"
speed_steps_per_sec = 500.0
acceleration_steps_per_sec2 = 1000.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let axis = config.axis("z").expect("Axis not found");

    assert_eq!(axis.steps_per_millimeter, 25.0);
    assert_eq!(axis.steps_per_revolution, 200.0);
    assert!(!axis.invert_direction);
    assert_eq!(axis.homing.direction, -1);
    assert_eq!(axis.homing.max_distance_steps, 2_000_000_000);
    assert_eq!(axis.homing.switch_level, ActiveLevel::Low);

    assert_eq!(config.service.name.as_str(), "stepper");
    assert_eq!(config.service.period_us, 50);
    assert!(config.service.stack_size.is_none());
    assert!(config.service.affinity_hint.is_none());
}

/// Test parsing asymmetric rates, homing and brake sections.
#[test]
fn test_parse_homing_and_brake() {
    let toml_str = r#"
[axes.y]
name = "gantry"
speed_steps_per_sec = 2000.0
acceleration_steps_per_sec2 = 8000.0
deceleration_steps_per_sec2 = 3000.0

[axes.y.homing]
direction = 1
max_distance_steps = 40000
switch_level = "high"

[axes.y.brake]
engage_delay_ms = 250
release_delay_ms = 40
active_level = "low"
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let axis = config.axis("y").expect("Axis not found");

    assert_eq!(axis.effective_deceleration().value(), 3000.0);
    assert_eq!(axis.homing.direction, 1);
    assert_eq!(axis.homing.max_distance_steps, 40_000);
    assert_eq!(axis.homing.switch_level, ActiveLevel::High);

    let brake = axis.brake.expect("Brake not found");
    assert_eq!(brake.engage_delay_ms, 250);
    assert_eq!(brake.release_delay_ms, 40);
    assert_eq!(brake.active_level, ActiveLevel::Low);
}

/// Test parsing several axes and the worker section.
#[test]
fn test_parse_multiple_axes_and_service() {
    let toml_str = r#"
[service]
name = "motion"
period_us = 20
stack_size = 65536
affinity_hint = 3

[axes.x]
name = "X"
speed_steps_per_sec = 1000.0
acceleration_steps_per_sec2 = 5000.0

[axes.y]
name = "Y"
speed_steps_per_sec = 1200.0
acceleration_steps_per_sec2 = 6000.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");

    let names: Vec<&str> = config.axis_names().collect();
    assert_eq!(names, ["x", "y"]);
    assert!(config.axis("w").is_none());

    assert_eq!(config.service.name.as_str(), "motion");
    assert_eq!(config.service.period_us, 20);
    assert_eq!(config.service.stack_size, Some(65536));
    assert_eq!(config.service.affinity_hint, Some(3));
}

/// Test that a missing required field is a parse error.
#[test]
fn test_parse_missing_speed() {
    let toml_str = r#"
[axes.x]
name = "X"
acceleration_steps_per_sec2 = 5000.0
"#;

    let result: Result<SystemConfig, _> = toml::from_str(toml_str);
    assert!(result.is_err());
}

/// Test loading a configuration file from disk.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("flexy-stepper-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
[axes.x]
name = "X"
speed_steps_per_sec = 1000.0
acceleration_steps_per_sec2 = 5000.0
"#,
    )
    .expect("Failed to write config");

    let config = load_config(&path).expect("Failed to load config");
    std::fs::remove_file(&path).ok();

    assert_eq!(config.axis("x").expect("Axis not found").name.as_str(), "X");
}

/// Test that a missing file reports an I/O error.
#[test]
fn test_load_config_missing_file() {
    let result = load_config("/nonexistent/flexy-stepper/axes.toml");
    assert!(matches!(
        result,
        Err(flexy_stepper::Error::Config(
            flexy_stepper::error::ConfigError::IoError(_)
        ))
    ));
}
