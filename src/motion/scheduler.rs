//! Step pulse timing.
//!
//! Turns planned velocities into a period between pulse edges and answers the
//! single per-tick question "is the next pulse due yet".

use super::planner::MotionPhase;

/// Microseconds per second.
const US_PER_SEC: f32 = 1_000_000.0;

/// Timing state between emitted pulses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepPulseScheduler {
    /// Time of the last emitted pulse, `None` before the first pulse.
    last_step_us: Option<u64>,
    /// Period to wait after the last pulse, 0 when nothing is scheduled.
    period_us: f32,
}

impl StepPulseScheduler {
    /// A scheduler that has never emitted a pulse.
    pub const fn new() -> Self {
        Self {
            last_step_us: None,
            period_us: 0.0,
        }
    }

    /// Period in microseconds for a signed velocity in steps/s.
    #[inline]
    pub fn period_for(velocity: f32) -> f32 {
        let speed = velocity.abs();
        if speed > 0.0 {
            US_PER_SEC / speed
        } else {
            f32::INFINITY
        }
    }

    /// Currently scheduled period in microseconds.
    #[inline]
    pub fn period_us(&self) -> f32 {
        self.period_us
    }

    /// Timestamp of the last emitted pulse.
    #[inline]
    pub fn last_step_us(&self) -> Option<u64> {
        self.last_step_us
    }

    /// Microseconds since the last pulse, saturating at 0 if the clock went back.
    #[inline]
    pub fn elapsed_us(&self, now_us: u64) -> Option<u64> {
        self.last_step_us.map(|last| now_us.saturating_sub(last))
    }

    /// Whether the next pulse is due at `now_us`.
    ///
    /// The very first pulse after construction (or [`Self::reset`]) is due
    /// immediately.
    pub fn is_due(&self, now_us: u64) -> bool {
        match self.elapsed_us(now_us) {
            None => true,
            Some(elapsed) => elapsed as f32 >= self.period_us,
        }
    }

    /// Schedule the period for the planner's next velocity.
    ///
    /// While speeding up the shorter of the pending and the new period wins, so a
    /// speed increase takes effect on the pulse already being waited for. A
    /// velocity of zero clears the pending period; the restart that follows
    /// schedules a fresh one measured from the last pulse.
    pub fn schedule(&mut self, velocity: f32, phase: MotionPhase) {
        if velocity == 0.0 {
            self.period_us = 0.0;
            return;
        }
        let next = Self::period_for(velocity);
        self.period_us = if phase == MotionPhase::Accelerating && self.period_us > 0.0 {
            self.period_us.min(next)
        } else {
            next
        };
    }

    /// Record a pulse emitted at `now_us`.
    #[inline]
    pub fn record_step(&mut self, now_us: u64) {
        self.last_step_us = Some(now_us);
    }

    /// Forget pulse history; the next pulse will be due immediately.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pulse_is_immediate() {
        let scheduler = StepPulseScheduler::new();
        assert!(scheduler.is_due(0));
        assert!(scheduler.is_due(123));
    }

    #[test]
    fn test_period_gates_next_pulse() {
        let mut scheduler = StepPulseScheduler::new();
        scheduler.record_step(1_000);
        scheduler.schedule(1000.0, MotionPhase::Cruising);
        assert_eq!(scheduler.period_us(), 1000.0);
        assert!(!scheduler.is_due(1_999));
        assert!(scheduler.is_due(2_000));
    }

    #[test]
    fn test_acceleration_takes_shorter_period() {
        let mut scheduler = StepPulseScheduler::new();
        scheduler.record_step(0);
        scheduler.schedule(100.0, MotionPhase::Accelerating);
        assert_eq!(scheduler.period_us(), 10_000.0);
        scheduler.schedule(500.0, MotionPhase::Accelerating);
        assert_eq!(scheduler.period_us(), 2_000.0);
        // a slower value while accelerating does not stretch the wait
        scheduler.schedule(250.0, MotionPhase::Accelerating);
        assert_eq!(scheduler.period_us(), 2_000.0);
        // deceleration lengthens it
        scheduler.schedule(250.0, MotionPhase::Decelerating);
        assert_eq!(scheduler.period_us(), 4_000.0);
    }

    #[test]
    fn test_stop_then_restart_is_spaced_from_last_pulse() {
        let mut scheduler = StepPulseScheduler::new();
        scheduler.record_step(10_000);
        scheduler.schedule(2000.0, MotionPhase::Cruising);
        scheduler.schedule(0.0, MotionPhase::Decelerating);
        assert_eq!(scheduler.period_us(), 0.0);

        // restart at floor speed is not clamped by the old cruise period
        scheduler.schedule(-200.0, MotionPhase::Accelerating);
        assert_eq!(scheduler.period_us(), 5_000.0);
        assert!(!scheduler.is_due(14_000));
        assert!(scheduler.is_due(15_000));
    }

    #[test]
    fn test_clock_going_backwards_is_not_due() {
        let mut scheduler = StepPulseScheduler::new();
        scheduler.record_step(5_000);
        scheduler.schedule(1000.0, MotionPhase::Cruising);
        assert!(!scheduler.is_due(4_000));
    }
}
