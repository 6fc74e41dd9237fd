use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::Handle;

/// Maximum manifold points a single contact can carry.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Stable identifier correlating the same physical contact point across
/// steps. Assigned by the narrow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FeatureId(pub u32);

/// Lifecycle of a manifold point with respect to reporting.
///
/// `New` is a one-shot state: reporting observes it exactly once through
/// [`ManifoldPoint::consume_new`] and the point becomes `Persisted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointState {
    New,
    #[default]
    Persisted,
}

/// A single contact point within a manifold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifoldPoint {
    /// Contact point in body A's local frame.
    pub local_point: Vec2,
    /// Signed separation; negative when penetrating.
    pub separation: f32,
    /// Accumulated normal impulse kept for warm starting.
    pub normal_impulse: f32,
    /// Accumulated tangent impulse kept for warm starting.
    pub tangent_impulse: f32,
    pub feature: FeatureId,
    pub state: PointState,
}

impl ManifoldPoint {
    pub fn new(local_point: Vec2, separation: f32, feature: FeatureId) -> Self {
        Self {
            local_point,
            separation,
            feature,
            state: PointState::New,
            ..Default::default()
        }
    }

    /// Returns true exactly once after the point is created; the state
    /// transitions to `Persisted` so the same occurrence is never reported
    /// as added twice.
    pub fn consume_new(&mut self) -> bool {
        if self.state == PointState::New {
            self.state = PointState::Persisted;
            true
        } else {
            false
        }
    }
}

/// Contact geometry for one pair: a shared world normal (A to B) and up to
/// [`MAX_MANIFOLD_POINTS`] points.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manifold {
    pub normal: Vec2,
    points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    count: usize,
}

impl Manifold {
    pub fn new(normal: Vec2) -> Self {
        Self {
            normal,
            ..Default::default()
        }
    }

    /// Appends a point. Panics past capacity; the narrow phase is expected
    /// to clip down to [`MAX_MANIFOLD_POINTS`].
    pub fn push(&mut self, point: ManifoldPoint) {
        assert!(
            self.count < MAX_MANIFOLD_POINTS,
            "manifold already holds {} points",
            MAX_MANIFOLD_POINTS
        );
        self.points[self.count] = point;
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points[..self.count]
    }

    pub fn points_mut(&mut self) -> &mut [ManifoldPoint] {
        &mut self.points[..self.count]
    }
}

/// Persistent pairing of two shapes that may be touching. Owned by the
/// engine layer; islands reference contacts by index for one step.
#[derive(Debug, Clone)]
pub struct Contact {
    pub body_a: Handle,
    pub body_b: Handle,
    /// Identifier of the shape on body A, carried through to reporting.
    pub shape_a: u32,
    /// Identifier of the shape on body B.
    pub shape_b: u32,
    /// Combined friction coefficient for the pair.
    pub friction: f32,
    /// Combined restitution coefficient for the pair.
    pub restitution: f32,
    pub manifold: Manifold,
}

impl Contact {
    pub fn new(body_a: Handle, body_b: Handle, manifold: Manifold) -> Self {
        Self {
            body_a,
            body_b,
            shape_a: 0,
            shape_b: 0,
            friction: 0.5,
            restitution: 0.0,
            manifold,
        }
    }

    pub fn with_shapes(mut self, shape_a: u32, shape_b: u32) -> Self {
        self.shape_a = shape_a;
        self.shape_b = shape_b;
        self
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_new_is_one_shot() {
        let mut point = ManifoldPoint::new(Vec2::ZERO, -0.01, FeatureId(7));
        assert!(point.consume_new());
        assert!(!point.consume_new());
        assert_eq!(point.state, PointState::Persisted);
    }

    #[test]
    fn manifold_tracks_point_count() {
        let mut manifold = Manifold::new(Vec2::Y);
        assert!(manifold.is_empty());
        manifold.push(ManifoldPoint::new(Vec2::ZERO, -0.02, FeatureId(0)));
        manifold.push(ManifoldPoint::new(Vec2::X, -0.01, FeatureId(1)));
        assert_eq!(manifold.len(), 2);
        assert_eq!(manifold.points()[1].feature, FeatureId(1));
    }

    #[test]
    #[should_panic(expected = "manifold already holds")]
    fn manifold_rejects_overflow() {
        let mut manifold = Manifold::new(Vec2::Y);
        for i in 0..=MAX_MANIFOLD_POINTS as u32 {
            manifold.push(ManifoldPoint::new(Vec2::ZERO, 0.0, FeatureId(i)));
        }
    }
}
