//! Trapezoidal motion planning.
//!
//! The planner is evaluated once per emitted step (and once when leaving rest).
//! It looks at the distance left, the current signed velocity and the profile
//! parameters, and returns the velocity the axis should hold for the next step
//! period. Acceleration and deceleration are independent.
//!
//! Velocity is integrated over exactly one step of travel: `v += a·dt` with
//! `dt` the time that step takes at constant `a`, which is `v'² = v² ± 2a`.
//! Integrating in the distance domain keeps `v²` exact, so deceleration that
//! starts as soon as the remaining distance is within the braking distance
//! `v² / (2·d)` brings the axis down to the floor speed on the target step.

use libm::sqrtf;

use super::params::ProfileParameters;

/// Direction of motion along the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing step count.
    Positive,
    /// Decreasing step count.
    Negative,
}

impl Direction {
    /// Direction of a signed quantity, `None` for zero.
    #[inline]
    pub fn of(value: i64) -> Option<Self> {
        match value.signum() {
            1 => Some(Direction::Positive),
            -1 => Some(Direction::Negative),
            _ => None,
        }
    }

    /// Direction of a signed velocity, `None` at rest.
    #[inline]
    pub fn of_velocity(velocity: f32) -> Option<Self> {
        if velocity > 0.0 {
            Some(Direction::Positive)
        } else if velocity < 0.0 {
            Some(Direction::Negative)
        } else {
            None
        }
    }

    /// Direction from the `-1 / 1` convention used by the configuration API.
    #[inline]
    pub fn from_sign(sign: i8) -> Option<Self> {
        Self::of(sign as i64)
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }

    /// Get the sign as a float multiplier.
    #[inline]
    pub fn signum_f32(self) -> f32 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }

    /// The opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// Sign of an optional direction: -1, 0 or 1.
#[inline]
pub fn direction_sign(direction: Option<Direction>) -> i8 {
    direction.map(|d| d.sign() as i8).unwrap_or(0)
}

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Accelerating from rest toward cruise velocity.
    Accelerating,
    /// Moving at constant cruise velocity.
    Cruising,
    /// Decelerating toward rest or toward a lowered cruise speed.
    Decelerating,
    /// At the target and at rest.
    Complete,
}

/// Kinematic state fed to the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Current position in steps.
    pub position: i64,
    /// Target position in steps.
    pub target: i64,
    /// Signed velocity in steps/s (0 at rest).
    pub velocity: f32,
}

impl Kinematics {
    /// Signed distance to the target.
    #[inline]
    pub fn distance(&self) -> i64 {
        self.target.saturating_sub(self.position)
    }
}

/// What the axis should do for the next step period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerDecision {
    /// Signed velocity for the next period, 0 when the axis must come to rest.
    pub velocity: f32,
    /// Phase this decision belongs to.
    pub phase: MotionPhase,
}

impl PlannerDecision {
    /// Direction implied by the decision.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        Direction::of_velocity(self.velocity)
    }

    /// Whether the axis reached its target and is at rest.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.phase == MotionPhase::Complete
    }

    const fn rest(phase: MotionPhase) -> Self {
        Self {
            velocity: 0.0,
            phase,
        }
    }
}

/// Trapezoidal velocity planner.
#[derive(Debug, Clone, Copy)]
pub struct MotionPlanner<'a> {
    params: &'a ProfileParameters,
}

impl<'a> MotionPlanner<'a> {
    /// Planner over a parameter snapshot.
    #[inline]
    pub fn new(params: &'a ProfileParameters) -> Self {
        Self { params }
    }

    /// Plan the first step out of rest.
    ///
    /// Returns a rest decision when already on target or when the parameters
    /// do not allow motion.
    pub fn start(&self, state: Kinematics) -> PlannerDecision {
        let distance = state.distance();
        match Direction::of(distance) {
            None => PlannerDecision::rest(MotionPhase::Complete),
            Some(_) if !self.params.can_move() => PlannerDecision::rest(MotionPhase::Decelerating),
            Some(direction) => PlannerDecision {
                velocity: direction.signum_f32() * self.params.slowest_step_speed(),
                phase: MotionPhase::Accelerating,
            },
        }
    }

    /// Plan the velocity after a step was emitted.
    ///
    /// `state.velocity` is the velocity the step was taken at.
    pub fn after_step(&self, state: Kinematics) -> PlannerDecision {
        let direction = match Direction::of_velocity(state.velocity) {
            Some(d) => d,
            None => return self.start(state),
        };
        if !self.params.can_move() {
            return PlannerDecision::rest(MotionPhase::Decelerating);
        }

        let speed = state.velocity.abs();
        let floor = self.params.slowest_step_speed();
        let distance = state.distance();
        let accel = self.params.acceleration();
        let decel = self.params.deceleration();
        let cruise = self.params.desired_speed();

        let heading_to_target = Direction::of(distance) == Some(direction);
        if !heading_to_target {
            if distance == 0 && speed * speed <= self.arrival_speed_sq() {
                return PlannerDecision::rest(MotionPhase::Complete);
            }
            // On or past the target while still moving away: ramp down, stop, then reverse.
            let slowed = ramp(speed, -decel);
            if slowed <= floor {
                return PlannerDecision::rest(MotionPhase::Decelerating);
            }
            return PlannerDecision {
                velocity: direction.signum_f32() * slowed,
                phase: MotionPhase::Decelerating,
            };
        }

        let remaining = distance.unsigned_abs() as f32;
        let (next_speed, phase) = if remaining <= self.params.braking_distance(speed) {
            (ramp(speed, -decel), MotionPhase::Decelerating)
        } else if speed < cruise {
            (ramp(speed, accel).min(cruise), MotionPhase::Accelerating)
        } else if speed > cruise {
            (ramp(speed, -decel).max(cruise), MotionPhase::Decelerating)
        } else {
            (cruise, MotionPhase::Cruising)
        };

        PlannerDecision {
            velocity: direction.signum_f32() * next_speed.max(floor),
            phase,
        }
    }

    /// Largest squared speed at which arriving on the target counts as a stop.
    ///
    /// Deceleration may begin one step late, which leaves at most one extra
    /// acceleration increment (`2a`) on top of the final braking step (`2d`).
    fn arrival_speed_sq(&self) -> f32 {
        let floor = self.params.slowest_step_speed();
        let window = 2.0 * (self.params.acceleration() + self.params.deceleration()) * 1.1;
        window.max(floor * floor)
    }
}

/// Speed after one step of travel under constant signed acceleration.
#[inline]
fn ramp(speed: f32, rate: f32) -> f32 {
    let squared = speed * speed + 2.0 * rate;
    if squared <= 0.0 {
        0.0
    } else {
        sqrtf(squared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(speed: f32, accel: f32, decel: f32) -> ProfileParameters {
        let mut p = ProfileParameters::new();
        p.set_speed(speed);
        p.set_acceleration(accel);
        p.set_deceleration(decel);
        p
    }

    /// Step through a whole move, returning (final position, max |position| overshoot).
    fn run(params: &ProfileParameters, from: i64, to: i64) -> (i64, i64, usize) {
        let planner = MotionPlanner::new(params);
        let mut state = Kinematics {
            position: from,
            target: to,
            velocity: 0.0,
        };
        let mut overshoot = 0;
        let mut steps = 0;
        let mut decision = planner.start(state);
        while !decision.is_complete() {
            state.velocity = decision.velocity;
            if let Some(direction) = decision.direction() {
                state.position += direction.sign();
                steps += 1;
            }
            let past = (state.position - to) * (to - from).signum();
            overshoot = overshoot.max(past);
            decision = planner.after_step(state);
            assert!(steps < 1_000_000, "planner did not converge");
        }
        (state.position, overshoot, steps)
    }

    #[test]
    fn test_start_picks_direction() {
        let p = params(1000.0, 5000.0, 5000.0);
        let planner = MotionPlanner::new(&p);

        let d = planner.start(Kinematics { position: 0, target: 10, velocity: 0.0 });
        assert_eq!(d.direction(), Some(Direction::Positive));
        assert!((d.velocity - 100.0).abs() < 0.01);

        let d = planner.start(Kinematics { position: 0, target: -10, velocity: 0.0 });
        assert_eq!(d.direction(), Some(Direction::Negative));

        let d = planner.start(Kinematics { position: 5, target: 5, velocity: 0.0 });
        assert!(d.is_complete());
    }

    #[test]
    fn test_no_motion_without_parameters() {
        let p = ProfileParameters::new();
        let planner = MotionPlanner::new(&p);
        let d = planner.start(Kinematics { position: 0, target: 100, velocity: 0.0 });
        assert_eq!(d.velocity, 0.0);
        assert!(!d.is_complete());
    }

    #[test]
    fn test_full_move_lands_on_target() {
        let p = params(1000.0, 5000.0, 5000.0);
        let (end, overshoot, steps) = run(&p, 0, 5000);
        assert_eq!(end, 5000);
        assert_eq!(overshoot, 0);
        assert_eq!(steps, 5000);
    }

    #[test]
    fn test_asymmetric_rates_land_on_target() {
        let p = params(2000.0, 8000.0, 1000.0);
        let (end, overshoot, _) = run(&p, 100, -3000);
        assert_eq!(end, -3000);
        assert_eq!(overshoot, 0);
    }

    #[test]
    fn test_reaches_cruise_speed() {
        let p = params(1000.0, 5000.0, 5000.0);
        let planner = MotionPlanner::new(&p);
        let mut state = Kinematics { position: 0, target: 100_000, velocity: 0.0 };
        let mut decision = planner.start(state);
        for _ in 0..500 {
            state.velocity = decision.velocity;
            state.position += 1;
            decision = planner.after_step(state);
        }
        assert_eq!(decision.phase, MotionPhase::Cruising);
        assert_eq!(decision.velocity, 1000.0);
    }

    #[test]
    fn test_lowered_speed_decelerates_to_new_cruise() {
        let p = params(500.0, 5000.0, 5000.0);
        let planner = MotionPlanner::new(&p);
        let state = Kinematics { position: 0, target: 100_000, velocity: 1000.0 };
        let d = planner.after_step(state);
        assert_eq!(d.phase, MotionPhase::Decelerating);
        assert!(d.velocity < 1000.0 && d.velocity >= 500.0);
    }

    #[test]
    fn test_ramp_changes_speed_squared_by_two_a() {
        let v = ramp(100.0, 5000.0);
        assert!((v * v - 20_000.0).abs() < 1.0);
        assert_eq!(ramp(50.0, -5000.0), 0.0);
    }

    #[test]
    fn test_target_behind_stops_before_reversing() {
        let p = params(1000.0, 5000.0, 5000.0);
        let planner = MotionPlanner::new(&p);
        let mut state = Kinematics { position: 1000, target: 0, velocity: 1000.0 };
        let mut d = planner.after_step(state);
        // keeps going forward while braking
        while d.velocity > 0.0 {
            assert_eq!(d.phase, MotionPhase::Decelerating);
            state.velocity = d.velocity;
            state.position += 1;
            d = planner.after_step(state);
        }
        assert_eq!(d.velocity, 0.0);
        assert!(!d.is_complete());
        state.velocity = 0.0;
        let restart = planner.start(state);
        assert_eq!(restart.direction(), Some(Direction::Negative));
    }

    #[test]
    fn test_extreme_target_keeps_its_direction() {
        let p = params(1000.0, 5000.0, 5000.0);
        let planner = MotionPlanner::new(&p);
        let state = Kinematics {
            position: -10,
            target: i64::MAX,
            velocity: 0.0,
        };

        assert_eq!(state.distance(), i64::MAX);
        let d = planner.start(state);
        assert_eq!(d.direction(), Some(Direction::Positive));
        let d = planner.after_step(Kinematics {
            position: -9,
            velocity: d.velocity,
            ..state
        });
        assert_eq!(d.phase, MotionPhase::Accelerating);
    }
}
