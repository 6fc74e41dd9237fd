//! Island-level dynamics: time stepping, constraint resolution, sleeping.

pub mod contact_solver;
pub mod island;
pub mod joint;
pub mod parallel;
pub mod timestep;

pub use contact_solver::{ContactConstraint, ContactSolver};
pub use island::{Island, SolveMetrics};
pub use joint::{DistanceJoint, Joint, RevoluteJoint};
pub use parallel::{solve_batches, IslandBatch};
pub use timestep::TimeStep;
