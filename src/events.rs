//! Motion event notifications.
//!
//! The axis reports transitions through a [`MotionEvents`] implementation it
//! owns. Methods are called synchronously from inside the tick, once per
//! transition, so implementations should return quickly.

/// Receiver for axis state transitions. Every method defaults to a no-op.
pub trait MotionEvents {
    /// Homing found the home switch; position is now zero.
    fn on_home_reached(&mut self) {}

    /// A limit switch stopped the axis.
    fn on_limit_reached(&mut self) {}

    /// A move or jog came to rest on its target.
    fn on_target_reached(&mut self, _position: i64) {}

    /// An emergency stop took effect.
    fn on_emergency_stop_triggered(&mut self) {}

    /// An emergency stop ended.
    fn on_emergency_stop_released(&mut self) {}
}

/// Event sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl MotionEvents for NoEvents {}

impl<T: MotionEvents + ?Sized> MotionEvents for &mut T {
    fn on_home_reached(&mut self) {
        (**self).on_home_reached()
    }

    fn on_limit_reached(&mut self) {
        (**self).on_limit_reached()
    }

    fn on_target_reached(&mut self, position: i64) {
        (**self).on_target_reached(position)
    }

    fn on_emergency_stop_triggered(&mut self) {
        (**self).on_emergency_stop_triggered()
    }

    fn on_emergency_stop_released(&mut self) {
        (**self).on_emergency_stop_released()
    }
}

/// Counts of each event, handy for polling code and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounter {
    /// Home reached count.
    pub home_reached: u32,
    /// Limit reached count.
    pub limit_reached: u32,
    /// Target reached count.
    pub target_reached: u32,
    /// Position reported by the most recent target-reached event.
    pub last_target: Option<i64>,
    /// Emergency stop triggered count.
    pub emergency_triggered: u32,
    /// Emergency stop released count.
    pub emergency_released: u32,
}

impl MotionEvents for EventCounter {
    fn on_home_reached(&mut self) {
        self.home_reached += 1;
    }

    fn on_limit_reached(&mut self) {
        self.limit_reached += 1;
    }

    fn on_target_reached(&mut self, position: i64) {
        self.target_reached += 1;
        self.last_target = Some(position);
    }

    fn on_emergency_stop_triggered(&mut self) {
        self.emergency_triggered += 1;
    }

    fn on_emergency_stop_released(&mut self) {
        self.emergency_released += 1;
    }
}
