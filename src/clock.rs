//! Monotonic time source for step timing.

/// Microsecond timestamps, monotonic and free-running.
///
/// The tick only compares differences, so the epoch is arbitrary.
pub trait Clock {
    /// Current time in microseconds.
    fn now_us(&mut self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_us(&mut self) -> u64 {
        (**self).now_us()
    }
}

/// Clock backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_us(&mut self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Deterministic clock that advances a fixed amount on every read.
///
/// Useful for simulation and tests: each tick reads the clock once, so the
/// increment is the simulated tick interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedClock {
    now_us: u64,
    increment_us: u64,
}

impl SimulatedClock {
    /// Start at 0, advancing `increment_us` per read.
    pub const fn new(increment_us: u64) -> Self {
        Self {
            now_us: 0,
            increment_us,
        }
    }

    /// Jump forward without a read.
    pub fn advance(&mut self, us: u64) {
        self.now_us += us;
    }

    /// Current simulated time without advancing.
    #[inline]
    pub fn peek(&self) -> u64 {
        self.now_us
    }
}

impl Clock for SimulatedClock {
    fn now_us(&mut self) -> u64 {
        let now = self.now_us;
        self.now_us += self.increment_us;
        now
    }
}
