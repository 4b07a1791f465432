//! Background worker configuration.

use heapless::String;
use serde::Deserialize;

/// Settings for the periodic worker that drives an axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Thread name.
    #[serde(default = "default_name")]
    pub name: String<32>,

    /// Tick period in microseconds.
    #[serde(default = "default_period_us")]
    pub period_us: u32,

    /// Worker stack size in bytes; platform default when unset.
    #[serde(default)]
    pub stack_size: Option<usize>,

    /// Preferred core. Not applied by the worker itself; the start hook
    /// receives it and may pin the thread with a platform API.
    #[serde(default)]
    pub affinity_hint: Option<usize>,
}

fn default_name() -> String<32> {
    String::try_from("stepper").unwrap_or_default()
}

fn default_period_us() -> u32 {
    50
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            period_us: default_period_us(),
            stack_size: None,
            affinity_hint: None,
        }
    }
}

impl ServiceConfig {
    /// Config with the given tick period and defaults elsewhere.
    pub fn with_period_us(period_us: u32) -> Self {
        Self {
            period_us,
            ..Self::default()
        }
    }
}
