use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Common math types re-exported for convenience.
pub use glam::Mat2;

/// Scalar cross product of two plane vectors.
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar angular velocity with a plane vector.
pub fn cross_scalar(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// 2D rotation stored as an angle with cached sine/cosine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rot2 {
    sin: f32,
    cos: f32,
}

impl Default for Rot2 {
    fn default() -> Self {
        Self { sin: 0.0, cos: 1.0 }
    }
}

impl Rot2 {
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { sin, cos }
    }

    pub fn angle(&self) -> f32 {
        self.sin.atan2(self.cos)
    }

    /// Rotates a vector by this rotation.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }

    /// Rotates a vector by the inverse of this rotation.
    pub fn apply_inverse(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * v.x + self.sin * v.y,
            -self.sin * v.x + self.cos * v.y,
        )
    }
}

/// Position and orientation of a rigid body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Transform2 {
    pub position: Vec2,
    pub rot: Rot2,
}

impl Transform2 {
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            rot: Rot2::from_angle(angle),
        }
    }

    /// Maps a body-local point into world space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + self.rot.apply(local)
    }

    /// Maps a world point into body-local space.
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        self.rot.apply_inverse(world - self.position)
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity2 {
    pub linear: Vec2,
    pub angular: f32,
}

/// Center-of-mass motion over one step: the pre-step pose (`c0`, `a0`) and
/// the current pose (`c`, `a`).
///
/// The pre-step pose is snapshotted at position integration so a TOI pass
/// can interpolate back into the step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Sweep {
    /// Local offset from the body origin to the center of mass.
    pub local_center: Vec2,
    /// Center of mass at the start of the step.
    pub c0: Vec2,
    /// Center of mass now.
    pub c: Vec2,
    /// Orientation angle at the start of the step.
    pub a0: f32,
    /// Orientation angle now.
    pub a: f32,
}

impl Sweep {
    /// Derives the body-origin transform from the current center pose.
    pub fn transform(&self) -> Transform2 {
        let rot = Rot2::from_angle(self.a);
        Transform2 {
            position: self.c - rot.apply(self.local_center),
            rot,
        }
    }

    /// Copies the current pose into the pre-step slots.
    pub fn snapshot(&mut self) {
        self.c0 = self.c;
        self.a0 = self.a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_roundtrips_a_vector() {
        let rot = Rot2::from_angle(0.73);
        let v = Vec2::new(1.5, -2.0);
        let back = rot.apply_inverse(rot.apply(v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-5);
    }

    #[test]
    fn transform_point_matches_manual_composition() {
        let xf = Transform2::new(Vec2::new(3.0, 1.0), std::f32::consts::FRAC_PI_2);
        let world = xf.transform_point(Vec2::new(1.0, 0.0));
        assert_relative_eq!(world.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(world.y, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn scalar_cross_is_antisymmetric() {
        let a = Vec2::new(0.3, 0.9);
        let b = Vec2::new(-1.1, 0.4);
        assert_relative_eq!(cross(a, b), -cross(b, a), epsilon = 1e-6);
    }

    #[test]
    fn sweep_transform_accounts_for_local_center() {
        let sweep = Sweep {
            local_center: Vec2::new(0.5, 0.0),
            c: Vec2::new(2.0, 2.0),
            a: 0.0,
            ..Default::default()
        };
        let xf = sweep.transform();
        assert_relative_eq!(xf.position.x, 1.5, epsilon = 1e-6);
        assert_relative_eq!(xf.position.y, 2.0, epsilon = 1e-6);
    }
}
