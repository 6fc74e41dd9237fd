//! Contact event reporting interfaces.

use glam::Vec2;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::manifold::FeatureId;

/// Finalized data for one contact point, handed to the listener after an
/// island solve.
///
/// Impulse magnitudes come from the constraint resolver's finalized state,
/// not from the contact's stored warm-start impulses; TOI sub-steps report
/// impulses they never persist.
#[derive(Debug, Clone, Copy)]
pub struct ContactPointInfo {
    pub shape_a: u32,
    pub shape_b: u32,
    /// Contact position in world space.
    pub position: Vec2,
    /// Contact normal, pointing from body A to body B.
    pub normal: Vec2,
    /// Signed separation; negative when penetrating.
    pub separation: f32,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
    pub feature: FeatureId,
}

/// Receiver for contact results. `on_added` fires exactly once per newly
/// created manifold point; `on_persisted` fires for every later step the
/// point survives.
pub trait ContactListener {
    fn on_added(&mut self, point: &ContactPointInfo);
    fn on_persisted(&mut self, point: &ContactPointInfo);
}

/// Shared, lockable listener handle. One listener can be attached to many
/// islands, including islands solved from the parallel dispatcher.
pub type SharedListener = Arc<Mutex<dyn ContactListener + Send>>;

/// Wraps a listener for attachment to islands.
pub fn shared_listener<L: ContactListener + Send + 'static>(listener: L) -> SharedListener {
    Arc::new(Mutex::new(listener))
}
