//! Axis configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::units::{StepsPerSec, StepsPerSecSquared};
use crate::brake::ActiveLevel;

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Steps per millimeter of linear travel.
    #[serde(default = "default_steps_per_millimeter")]
    pub steps_per_millimeter: f32,

    /// Steps per output revolution, microstepping included.
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: f32,

    /// Cruise speed in steps per second.
    #[serde(rename = "speed_steps_per_sec")]
    pub speed: StepsPerSec,

    /// Acceleration in steps per second squared.
    #[serde(rename = "acceleration_steps_per_sec2")]
    pub acceleration: StepsPerSecSquared,

    /// Deceleration in steps per second squared; defaults to the acceleration.
    #[serde(default, rename = "deceleration_steps_per_sec2")]
    pub deceleration: Option<StepsPerSecSquared>,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Homing defaults.
    #[serde(default)]
    pub homing: HomingConfig,

    /// Brake timing, used when a brake pin is attached.
    #[serde(default)]
    pub brake: Option<BrakeConfig>,
}

fn default_steps_per_millimeter() -> f32 {
    25.0
}

fn default_steps_per_revolution() -> f32 {
    200.0
}

impl AxisConfig {
    /// Deceleration, falling back to the acceleration when unset.
    pub fn effective_deceleration(&self) -> StepsPerSecSquared {
        self.deceleration.unwrap_or(self.acceleration)
    }
}

/// Homing defaults for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HomingConfig {
    /// Direction toward the home switch: `-1` or `1`.
    #[serde(default = "default_homing_direction")]
    pub direction: i8,

    /// Travel budget before homing gives up.
    #[serde(default = "default_homing_max_distance")]
    pub max_distance_steps: i64,

    /// Level the home switch reads when pressed.
    #[serde(default = "default_switch_level")]
    pub switch_level: ActiveLevel,
}

fn default_homing_direction() -> i8 {
    -1
}

fn default_homing_max_distance() -> i64 {
    2_000_000_000
}

fn default_switch_level() -> ActiveLevel {
    ActiveLevel::Low
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            direction: default_homing_direction(),
            max_distance_steps: default_homing_max_distance(),
            switch_level: default_switch_level(),
        }
    }
}

/// Brake timing for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BrakeConfig {
    /// Delay between motion stop and brake engagement.
    #[serde(default)]
    pub engage_delay_ms: u32,

    /// Delay between a motion request and brake release; `-1` releases at once.
    #[serde(default = "default_release_delay")]
    pub release_delay_ms: i32,

    /// Level that engages the brake.
    #[serde(default)]
    pub active_level: ActiveLevel,
}

fn default_release_delay() -> i32 {
    -1
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self {
            engage_delay_ms: 0,
            release_delay_ms: default_release_delay(),
            active_level: ActiveLevel::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deceleration_falls_back_to_acceleration() {
        let config = AxisConfig {
            name: String::try_from("test").unwrap(),
            steps_per_millimeter: 100.0,
            steps_per_revolution: 200.0,
            speed: StepsPerSec(1000.0),
            acceleration: StepsPerSecSquared(5000.0),
            deceleration: None,
            invert_direction: false,
            homing: HomingConfig::default(),
            brake: None,
        };
        assert_eq!(config.effective_deceleration(), StepsPerSecSquared(5000.0));
    }

    #[test]
    fn test_brake_defaults() {
        let brake = BrakeConfig::default();
        assert_eq!(brake.release_delay_ms, -1);
        assert_eq!(brake.active_level, ActiveLevel::High);
    }
}
