use crate::config::{DEFAULT_POSITION_ITERATIONS, DEFAULT_VELOCITY_ITERATIONS};

/// Per-tick step configuration, immutable for the duration of one solve.
#[derive(Debug, Clone, Copy)]
pub struct TimeStep {
    pub dt: f32,
    pub inv_dt: f32,
    /// Fixed Gauss-Seidel sweep count for the velocity solve.
    pub velocity_iterations: u32,
    /// Iteration cap for the position correction pass.
    pub position_iterations: u32,
    /// Whether the contact resolver seeds itself with last step's impulses.
    pub warm_starting: bool,
}

impl TimeStep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            warm_starting: true,
        }
    }

    pub fn with_iterations(mut self, velocity: u32, position: u32) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    /// Narrow time slice used for TOI resolution. Warm starting is off:
    /// sub-step impulses can be large and would corrupt the next full
    /// step's initial guess.
    pub fn sub_step(dt: f32, velocity_iterations: u32, position_iterations: u32) -> Self {
        Self {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            velocity_iterations,
            position_iterations,
            warm_starting: false,
        }
    }
}
