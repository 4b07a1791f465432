//! Brake sequencing.
//!
//! A brake is engaged some time after motion stops and released some time
//! before motion starts. Pulses are held back while the brake is engaged, so
//! the release deadline is always in the past when the first step goes out.
//! Deadlines are checked on every tick whether or not a pulse is emitted.

use serde::Deserialize;

/// Electrical level that engages the brake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveLevel {
    /// Line high = brake engaged.
    #[default]
    High,
    /// Line low = brake engaged.
    Low,
}

impl ActiveLevel {
    /// Pin level for an engaged (`true`) or released (`false`) brake.
    #[inline]
    pub fn pin_high(self, engaged: bool) -> bool {
        match self {
            ActiveLevel::High => engaged,
            ActiveLevel::Low => !engaged,
        }
    }
}

/// A brake line change the axis must drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BrakeAction {
    /// Drive the brake line to its engaged level.
    Engage,
    /// Drive the brake line to its released level.
    Release,
}

/// Timing state of an optional brake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrakeSequencer {
    configured: bool,
    active: bool,
    engage_delay_ms: u32,
    release_delay_ms: i32,
    engage_deadline_us: Option<u64>,
    release_deadline_us: Option<u64>,
    moved_since_release: bool,
}

impl Default for BrakeSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl BrakeSequencer {
    /// No brake attached: engage immediately, release immediately.
    pub const fn new() -> Self {
        Self {
            configured: false,
            active: false,
            engage_delay_ms: 0,
            release_delay_ms: -1,
            engage_deadline_us: None,
            release_deadline_us: None,
            moved_since_release: true,
        }
    }

    /// Mark a brake line as attached (or detached).
    pub fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
        if !configured {
            self.active = false;
            self.engage_deadline_us = None;
            self.release_deadline_us = None;
        }
    }

    /// Whether a brake line is attached.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Whether the brake is engaged.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Delay between motion stop and brake engagement.
    pub fn set_engage_delay_ms(&mut self, delay_ms: u32) {
        self.engage_delay_ms = delay_ms;
    }

    /// Delay between a motion request and brake release; `-1` releases at once.
    ///
    /// Anything below `-1` is treated as `-1`.
    pub fn set_release_delay_ms(&mut self, delay_ms: i32) {
        self.release_delay_ms = delay_ms.max(-1);
    }

    /// Configured engage delay.
    #[inline]
    pub fn engage_delay_ms(&self) -> u32 {
        self.engage_delay_ms
    }

    /// Configured release delay.
    #[inline]
    pub fn release_delay_ms(&self) -> i32 {
        self.release_delay_ms
    }

    /// Pending engage deadline.
    #[inline]
    pub fn engage_deadline_us(&self) -> Option<u64> {
        self.engage_deadline_us
    }

    /// Pending release deadline.
    #[inline]
    pub fn release_deadline_us(&self) -> Option<u64> {
        self.release_deadline_us
    }

    /// Whether pulses must be held back.
    #[inline]
    pub fn blocks_motion(&self) -> bool {
        self.configured && self.active
    }

    /// Fire any deadline that has elapsed.
    pub fn poll(&mut self, now_us: u64) -> Option<BrakeAction> {
        if let Some(deadline) = self.engage_deadline_us {
            if now_us >= deadline {
                self.engage_deadline_us = None;
                return self.engage();
            }
        }
        if let Some(deadline) = self.release_deadline_us {
            if now_us >= deadline {
                self.release_deadline_us = None;
                return self.release();
            }
        }
        None
    }

    /// Motion came to rest at `now_us`.
    ///
    /// Engages at once when the delay is zero or when the axis has not moved
    /// since the brake was last released; otherwise schedules engagement.
    pub fn on_motion_stopped(&mut self, now_us: u64) -> Option<BrakeAction> {
        if !self.configured || self.active {
            return None;
        }
        self.release_deadline_us = None;
        if self.engage_delay_ms == 0 || !self.moved_since_release {
            return self.engage();
        }
        if self.engage_deadline_us.is_none() {
            self.engage_deadline_us = Some(now_us + ms_to_us(self.engage_delay_ms as u64));
        }
        None
    }

    /// Motion wants to start at `now_us`.
    ///
    /// Cancels a pending engagement. If the brake is engaged it is either
    /// released at once (negative delay) or a release is scheduled; check
    /// [`Self::blocks_motion`] afterwards.
    pub fn request_release(&mut self, now_us: u64) -> Option<BrakeAction> {
        if !self.configured {
            return None;
        }
        self.engage_deadline_us = None;
        if !self.active {
            return None;
        }
        if self.release_delay_ms < 0 {
            self.release_deadline_us = None;
            return self.release();
        }
        if self.release_deadline_us.is_none() {
            self.release_deadline_us = Some(now_us + ms_to_us(self.release_delay_ms as u64));
        }
        None
    }

    /// A step was emitted.
    #[inline]
    pub fn note_step(&mut self) {
        self.moved_since_release = true;
    }

    /// Engage now, cancelling pending deadlines.
    pub fn engage(&mut self) -> Option<BrakeAction> {
        self.engage_deadline_us = None;
        self.release_deadline_us = None;
        if self.active {
            return None;
        }
        self.active = true;
        Some(BrakeAction::Engage)
    }

    /// Release now, cancelling pending deadlines.
    pub fn release(&mut self) -> Option<BrakeAction> {
        self.engage_deadline_us = None;
        self.release_deadline_us = None;
        if !self.active {
            return None;
        }
        self.active = false;
        self.moved_since_release = false;
        Some(BrakeAction::Release)
    }
}

#[inline]
fn ms_to_us(ms: u64) -> u64 {
    ms * 1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(engage_ms: u32, release_ms: i32) -> BrakeSequencer {
        let mut brake = BrakeSequencer::new();
        brake.set_configured(true);
        brake.set_engage_delay_ms(engage_ms);
        brake.set_release_delay_ms(release_ms);
        brake
    }

    #[test]
    fn test_unconfigured_never_blocks() {
        let mut brake = BrakeSequencer::new();
        assert_eq!(brake.on_motion_stopped(0), None);
        assert_eq!(brake.request_release(0), None);
        assert!(!brake.blocks_motion());
    }

    #[test]
    fn test_engage_after_delay() {
        let mut brake = configured(100, -1);
        brake.note_step();
        assert_eq!(brake.on_motion_stopped(1_000), None);
        assert_eq!(brake.engage_deadline_us(), Some(101_000));
        assert_eq!(brake.poll(100_999), None);
        assert_eq!(brake.poll(101_000), Some(BrakeAction::Engage));
        assert!(brake.is_active());
    }

    #[test]
    fn test_engage_immediately_without_motion_since_release() {
        let mut brake = configured(100, -1);
        brake.engage();
        assert_eq!(brake.request_release(0), Some(BrakeAction::Release));
        // no step taken since the release
        assert_eq!(brake.on_motion_stopped(10), Some(BrakeAction::Engage));
    }

    #[test]
    fn test_release_delay_gates_motion() {
        let mut brake = configured(0, 50);
        brake.engage();
        assert_eq!(brake.request_release(2_000), None);
        assert!(brake.blocks_motion());
        assert_eq!(brake.release_deadline_us(), Some(52_000));
        // repeated requests keep the original deadline
        assert_eq!(brake.request_release(30_000), None);
        assert_eq!(brake.release_deadline_us(), Some(52_000));
        assert_eq!(brake.poll(52_000), Some(BrakeAction::Release));
        assert!(!brake.blocks_motion());
    }

    #[test]
    fn test_restart_cancels_pending_engage() {
        let mut brake = configured(100, -1);
        brake.note_step();
        brake.on_motion_stopped(0);
        assert!(brake.engage_deadline_us().is_some());
        assert_eq!(brake.request_release(10), None);
        assert_eq!(brake.engage_deadline_us(), None);
        assert_eq!(brake.poll(1_000_000), None);
        assert!(!brake.is_active());
    }

    #[test]
    fn test_active_level() {
        assert!(ActiveLevel::High.pin_high(true));
        assert!(!ActiveLevel::Low.pin_high(true));
        assert!(ActiveLevel::Low.pin_high(false));
    }
}
