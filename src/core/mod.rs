//! Core types describing bodies, contacts, and shared 2D math state.

pub mod body;
pub mod manifold;
pub mod types;

pub use body::{BodyType, RigidBody};
pub use manifold::{Contact, FeatureId, Manifold, ManifoldPoint, PointState, MAX_MANIFOLD_POINTS};
pub use types::{Rot2, Sweep, Transform2, Velocity2};
