//! Motion module for flexy-stepper.
//!
//! Provides profile parameters, trapezoidal planning and step pulse timing.

mod params;
mod planner;
mod scheduler;

pub use params::ProfileParameters;
pub use planner::{direction_sign, Direction, Kinematics, MotionPhase, MotionPlanner, PlannerDecision};
pub use scheduler::StepPulseScheduler;
