use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::types::{cross, Sweep, Transform2, Velocity2};

/// Simulation role of a body. Static and kinematic bodies carry zero inverse
/// mass and are never integrated by the island solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BodyType {
    Static,
    Kinematic,
    #[default]
    Dynamic,
}

/// Core rigid body description storing kinematic state and properties.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: BodyType,
    pub velocity: Velocity2,
    /// Accumulated external force, cleared by velocity integration.
    pub force: Vec2,
    /// Accumulated external torque, cleared by velocity integration.
    pub torque: f32,
    pub inv_mass: f32,
    pub inv_inertia: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub sweep: Sweep,
    /// Cached transform derived from the sweep; refreshed by
    /// [`synchronize_transform`](Self::synchronize_transform).
    pub transform: Transform2,
    pub can_sleep: bool,
    pub asleep: bool,
    /// Continuous time this body has spent below the sleep tolerances.
    pub sleep_time: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            velocity: Velocity2::default(),
            force: Vec2::ZERO,
            torque: 0.0,
            inv_mass: 1.0,
            inv_inertia: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            sweep: Sweep::default(),
            transform: Transform2::default(),
            can_sleep: true,
            asleep: false,
            sleep_time: 0.0,
        }
    }
}

impl RigidBody {
    /// Creates a dynamic body at the given position with unit mass/inertia.
    pub fn dynamic(position: Vec2) -> Self {
        let mut body = Self::default();
        body.set_position(position, 0.0);
        body
    }

    /// Creates a static body. Inverse mass and inertia are forced to zero.
    pub fn fixed(position: Vec2) -> Self {
        let mut body = Self {
            body_type: BodyType::Static,
            inv_mass: 0.0,
            inv_inertia: 0.0,
            ..Self::default()
        };
        body.set_position(position, 0.0);
        body
    }

    /// Creates a kinematic body: moved by its velocity externally, immovable
    /// to the solver.
    pub fn kinematic(position: Vec2) -> Self {
        let mut body = Self {
            body_type: BodyType::Kinematic,
            inv_mass: 0.0,
            inv_inertia: 0.0,
            ..Self::default()
        };
        body.set_position(position, 0.0);
        body
    }

    /// Sets mass and rotational inertia, storing their inverses. Zero or
    /// negative mass makes the body fully immovable, rotation included;
    /// a partially-infinite body would still be dragged by gravity.
    pub fn set_mass(&mut self, mass: f32, inertia: f32) {
        if mass > f32::EPSILON {
            self.inv_mass = 1.0 / mass;
            self.inv_inertia = if inertia > f32::EPSILON {
                1.0 / inertia
            } else {
                0.0
            };
        } else {
            self.inv_mass = 0.0;
            self.inv_inertia = 0.0;
        }
    }

    /// Places the body, keeping sweep and cached transform coherent.
    pub fn set_position(&mut self, position: Vec2, angle: f32) {
        self.transform = Transform2::new(position, angle);
        self.sweep.c = self.transform.transform_point(self.sweep.local_center);
        self.sweep.a = angle;
        self.sweep.snapshot();
    }

    /// Whether the solver treats this body as immovable.
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0 && self.inv_inertia == 0.0
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if self.is_static() {
            return;
        }
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: f32) {
        if self.is_static() {
            return;
        }
        self.torque += torque;
    }

    /// Applies an impulse at a world point, waking the body.
    pub fn apply_impulse(&mut self, impulse: Vec2, point: Vec2) {
        if self.is_static() {
            return;
        }
        self.velocity.linear += impulse * self.inv_mass;
        self.velocity.angular += self.inv_inertia * cross(point - self.sweep.c, impulse);
        self.wake();
    }

    /// Recomputes the cached transform from the sweep.
    pub fn synchronize_transform(&mut self) {
        self.transform = self.sweep.transform();
    }

    pub fn wake(&mut self) {
        self.asleep = false;
        self.sleep_time = 0.0;
    }

    /// Puts the body to rest and zeroes its motion state.
    pub fn put_to_sleep(&mut self) {
        self.asleep = true;
        self.sleep_time = 0.0;
        self.velocity = Velocity2::default();
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }
}
