//! Axis operating modes.

/// What the axis is currently doing. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// At rest on target, waiting for a command.
    #[default]
    Idle,
    /// Moving toward an explicit target.
    Positioning,
    /// Moving continuously in one direction until stopped.
    Jogging,
    /// Seeking a limit switch, optionally redefining home.
    Homing,
    /// Stopped (or stopping) by an emergency stop.
    EmergencyStopped,
}

impl Mode {
    /// Mode name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Positioning => "Positioning",
            Mode::Jogging => "Jogging",
            Mode::Homing => "Homing",
            Mode::EmergencyStopped => "EmergencyStopped",
        }
    }

    /// Whether commands may start new motion in this mode.
    #[inline]
    pub fn accepts_motion(self) -> bool {
        self != Mode::EmergencyStopped
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
