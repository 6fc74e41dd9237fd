//! Solver tuning parameters for the impulse2d island solver.

use serde::{Deserialize, Serialize};

/// Default fixed timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Number of velocity constraint iterations performed per step.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;

/// Number of position correction iterations performed per step.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Baumgarte factor used by the main-step contact position pass.
pub const DEFAULT_CONTACT_BAUMGARTE: f32 = 0.2;

/// Baumgarte factor used by the TOI sub-step position pass. Larger than the
/// main-step factor: TOI correction favors fast separation over smoothness.
pub const DEFAULT_TOI_BAUMGARTE: f32 = 0.75;

/// Tunable constants consumed by [`Island`](crate::dynamics::Island) and the
/// constraint resolvers.
///
/// Passed by reference into every solve call rather than read from process
/// globals, so simulations with different tuning can coexist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverTuning {
    /// Cap on linear speed after velocity integration (m/s).
    pub max_linear_velocity: f32,
    /// Cap on angular speed after velocity integration (rad/s).
    pub max_angular_velocity: f32,
    /// Penetration allowed before position correction pushes back (m).
    pub linear_slop: f32,
    /// Largest positional correction applied in a single iteration (m).
    pub max_linear_correction: f32,
    /// Baumgarte factor for the main-step contact position pass.
    pub contact_baumgarte: f32,
    /// Baumgarte factor for the TOI sub-step position pass.
    pub toi_baumgarte: f32,
    /// Approach speed below which restitution is ignored (m/s).
    pub restitution_threshold: f32,
    /// Linear speed below which a body accumulates sleep time (m/s).
    pub linear_sleep_tolerance: f32,
    /// Angular speed below which a body accumulates sleep time (rad/s).
    pub angular_sleep_tolerance: f32,
    /// Continuous time below both tolerances before an island sleeps (s).
    pub time_to_sleep: f32,
}

impl Default for SolverTuning {
    fn default() -> Self {
        Self {
            max_linear_velocity: 200.0,
            max_angular_velocity: 250.0,
            linear_slop: 0.005,
            max_linear_correction: 0.2,
            contact_baumgarte: DEFAULT_CONTACT_BAUMGARTE,
            toi_baumgarte: DEFAULT_TOI_BAUMGARTE,
            restitution_threshold: 1.0,
            linear_sleep_tolerance: 0.01,
            angular_sleep_tolerance: 2.0 / 180.0 * std::f32::consts::PI,
            time_to_sleep: 0.5,
        }
    }
}

impl SolverTuning {
    /// Squared linear sleep tolerance, the form the sleep check uses.
    pub fn linear_sleep_tolerance_sq(&self) -> f32 {
        self.linear_sleep_tolerance * self.linear_sleep_tolerance
    }

    /// Squared angular sleep tolerance.
    pub fn angular_sleep_tolerance_sq(&self) -> f32 {
        self.angular_sleep_tolerance * self.angular_sleep_tolerance
    }
}
