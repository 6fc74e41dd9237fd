//! impulse2d – the per-step rigid-body island solver of a 2D physics engine.
//!
//! Given a connected group of bodies and the contacts/joints coupling them,
//! an [`Island`] advances velocities and positions through one tick:
//! velocity integration with damping and clamping, warm-started Gauss-Seidel
//! velocity constraint sweeps, position integration, an optional position
//! correction pass with early exit, a contact-only TOI sub-step variant,
//! island-wide sleeping, and deduplicated contact event reporting.
//!
//! Collision detection, manifold generation, island partitioning, and body
//! lifecycle are the caller's concern; this crate consumes them through the
//! narrow interfaces in [`core`] and [`events`].

pub mod config;
pub mod core;
pub mod dynamics;
pub mod events;
pub mod utils;

pub use glam::{Mat2, Vec2};

pub use config::SolverTuning;
pub use core::{
    BodyType, Contact, FeatureId, Manifold, ManifoldPoint, PointState, RigidBody, Rot2, Sweep,
    Transform2, Velocity2,
};
pub use dynamics::{
    ContactSolver, DistanceJoint, Island, IslandBatch, Joint, RevoluteJoint, SolveMetrics,
    TimeStep,
};
pub use events::{shared_listener, ContactListener, ContactPointInfo, SharedListener};
pub use utils::allocator::{Arena, Handle};
