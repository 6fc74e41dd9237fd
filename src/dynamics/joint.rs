use glam::{Mat2, Vec2};

use crate::{
    config::SolverTuning,
    core::{
        types::{cross, cross_scalar, Rot2},
        RigidBody,
    },
    dynamics::timestep::TimeStep,
    utils::allocator::{Arena, Handle},
};

/// Keeps two anchor points at a fixed distance.
#[derive(Debug, Clone)]
pub struct DistanceJoint {
    pub body_a: Handle,
    pub body_b: Handle,
    /// Anchor relative to body A's center of mass, in A's local frame.
    pub local_anchor_a: Vec2,
    /// Anchor relative to body B's center of mass, in B's local frame.
    pub local_anchor_b: Vec2,
    pub rest_length: f32,
    // Solver state, valid between init and the end of the step.
    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    mass: f32,
    impulse: f32,
}

impl DistanceJoint {
    pub fn new(
        body_a: Handle,
        body_b: Handle,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        rest_length: f32,
    ) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            rest_length,
            u: Vec2::ZERO,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            mass: 0.0,
            impulse: 0.0,
        }
    }

    fn init_velocity(&mut self, step: &TimeStep, bodies: &mut Arena<RigidBody>) {
        let Some((body_a, body_b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return;
        };
        self.r_a = Rot2::from_angle(body_a.sweep.a).apply(self.local_anchor_a);
        self.r_b = Rot2::from_angle(body_b.sweep.a).apply(self.local_anchor_b);
        let d = body_b.sweep.c + self.r_b - body_a.sweep.c - self.r_a;
        let length = d.length();
        self.u = if length > f32::EPSILON { d / length } else { Vec2::ZERO };

        let cr_a = cross(self.r_a, self.u);
        let cr_b = cross(self.r_b, self.u);
        let inv_mass = body_a.inv_mass
            + body_b.inv_mass
            + body_a.inv_inertia * cr_a * cr_a
            + body_b.inv_inertia * cr_b * cr_b;
        self.mass = if inv_mass > 0.0 { 1.0 / inv_mass } else { 0.0 };

        if step.warm_starting {
            let p = self.impulse * self.u;
            body_a.velocity.linear -= body_a.inv_mass * p;
            body_a.velocity.angular -= body_a.inv_inertia * cross(self.r_a, p);
            body_b.velocity.linear += body_b.inv_mass * p;
            body_b.velocity.angular += body_b.inv_inertia * cross(self.r_b, p);
        } else {
            self.impulse = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut Arena<RigidBody>) {
        let Some((body_a, body_b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return;
        };
        let vp_a = body_a.velocity.linear + cross_scalar(body_a.velocity.angular, self.r_a);
        let vp_b = body_b.velocity.linear + cross_scalar(body_b.velocity.angular, self.r_b);
        let c_dot = self.u.dot(vp_b - vp_a);

        let lambda = -self.mass * c_dot;
        self.impulse += lambda;

        let p = lambda * self.u;
        body_a.velocity.linear -= body_a.inv_mass * p;
        body_a.velocity.angular -= body_a.inv_inertia * cross(self.r_a, p);
        body_b.velocity.linear += body_b.inv_mass * p;
        body_b.velocity.angular += body_b.inv_inertia * cross(self.r_b, p);
    }

    fn solve_position(&mut self, bodies: &mut Arena<RigidBody>, tuning: &SolverTuning) -> bool {
        let Some((body_a, body_b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return true;
        };
        let r_a = Rot2::from_angle(body_a.sweep.a).apply(self.local_anchor_a);
        let r_b = Rot2::from_angle(body_b.sweep.a).apply(self.local_anchor_b);
        let d = body_b.sweep.c + r_b - body_a.sweep.c - r_a;
        let length = d.length();
        if length < f32::EPSILON {
            return true;
        }
        let u = d / length;
        let c = (length - self.rest_length)
            .clamp(-tuning.max_linear_correction, tuning.max_linear_correction);

        let cr_a = cross(r_a, u);
        let cr_b = cross(r_b, u);
        let inv_mass = body_a.inv_mass
            + body_b.inv_mass
            + body_a.inv_inertia * cr_a * cr_a
            + body_b.inv_inertia * cr_b * cr_b;
        let impulse = if inv_mass > 0.0 { -c / inv_mass } else { 0.0 };
        let p = impulse * u;

        body_a.sweep.c -= body_a.inv_mass * p;
        body_a.sweep.a -= body_a.inv_inertia * cross(r_a, p);
        body_b.sweep.c += body_b.inv_mass * p;
        body_b.sweep.a += body_b.inv_inertia * cross(r_b, p);

        c.abs() < tuning.linear_slop
    }
}

/// Pins two anchor points together while leaving relative rotation free.
#[derive(Debug, Clone)]
pub struct RevoluteJoint {
    pub body_a: Handle,
    pub body_b: Handle,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    mass: Mat2,
    impulse: Vec2,
}

impl RevoluteJoint {
    pub fn new(body_a: Handle, body_b: Handle, local_anchor_a: Vec2, local_anchor_b: Vec2) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            mass: Mat2::ZERO,
            impulse: Vec2::ZERO,
        }
    }

    fn effective_mass(body_a: &RigidBody, body_b: &RigidBody, r_a: Vec2, r_b: Vec2) -> Mat2 {
        let m = body_a.inv_mass + body_b.inv_mass;
        let i_a = body_a.inv_inertia;
        let i_b = body_b.inv_inertia;
        let k11 = m + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
        let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
        let k22 = m + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
        let k = Mat2::from_cols(Vec2::new(k11, k12), Vec2::new(k12, k22));
        if k.determinant().abs() > f32::EPSILON {
            k.inverse()
        } else {
            Mat2::ZERO
        }
    }

    fn init_velocity(&mut self, step: &TimeStep, bodies: &mut Arena<RigidBody>) {
        let Some((body_a, body_b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return;
        };
        self.r_a = Rot2::from_angle(body_a.sweep.a).apply(self.local_anchor_a);
        self.r_b = Rot2::from_angle(body_b.sweep.a).apply(self.local_anchor_b);
        self.mass = Self::effective_mass(body_a, body_b, self.r_a, self.r_b);

        if step.warm_starting {
            let p = self.impulse;
            body_a.velocity.linear -= body_a.inv_mass * p;
            body_a.velocity.angular -= body_a.inv_inertia * cross(self.r_a, p);
            body_b.velocity.linear += body_b.inv_mass * p;
            body_b.velocity.angular += body_b.inv_inertia * cross(self.r_b, p);
        } else {
            self.impulse = Vec2::ZERO;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut Arena<RigidBody>) {
        let Some((body_a, body_b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return;
        };
        let c_dot = body_b.velocity.linear + cross_scalar(body_b.velocity.angular, self.r_b)
            - body_a.velocity.linear
            - cross_scalar(body_a.velocity.angular, self.r_a);
        let p = self.mass * -c_dot;
        self.impulse += p;

        body_a.velocity.linear -= body_a.inv_mass * p;
        body_a.velocity.angular -= body_a.inv_inertia * cross(self.r_a, p);
        body_b.velocity.linear += body_b.inv_mass * p;
        body_b.velocity.angular += body_b.inv_inertia * cross(self.r_b, p);
    }

    fn solve_position(&mut self, bodies: &mut Arena<RigidBody>, tuning: &SolverTuning) -> bool {
        let Some((body_a, body_b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return true;
        };
        let r_a = Rot2::from_angle(body_a.sweep.a).apply(self.local_anchor_a);
        let r_b = Rot2::from_angle(body_b.sweep.a).apply(self.local_anchor_b);
        let mut c = body_b.sweep.c + r_b - body_a.sweep.c - r_a;
        let error = c.length();
        if error > tuning.max_linear_correction {
            c *= tuning.max_linear_correction / error;
        }

        let mass = Self::effective_mass(body_a, body_b, r_a, r_b);
        let p = mass * -c;

        body_a.sweep.c -= body_a.inv_mass * p;
        body_a.sweep.a -= body_a.inv_inertia * cross(r_a, p);
        body_b.sweep.c += body_b.inv_mass * p;
        body_b.sweep.a += body_b.inv_inertia * cross(r_b, p);

        error < tuning.linear_slop
    }
}

/// Constraint between two bodies. Concrete variants keep their Jacobian
/// math to themselves; the island only ever talks to the four capability
/// methods below and never branches on kind.
#[derive(Debug, Clone)]
pub enum Joint {
    Distance(DistanceJoint),
    Revolute(RevoluteJoint),
}

impl Joint {
    pub fn bodies(&self) -> (Handle, Handle) {
        match self {
            Joint::Distance(j) => (j.body_a, j.body_b),
            Joint::Revolute(j) => (j.body_a, j.body_b),
        }
    }

    pub fn init_velocity_constraints(&mut self, step: &TimeStep, bodies: &mut Arena<RigidBody>) {
        match self {
            Joint::Distance(j) => j.init_velocity(step, bodies),
            Joint::Revolute(j) => j.init_velocity(step, bodies),
        }
    }

    pub fn solve_velocity_constraints(&mut self, _step: &TimeStep, bodies: &mut Arena<RigidBody>) {
        match self {
            Joint::Distance(j) => j.solve_velocity(bodies),
            Joint::Revolute(j) => j.solve_velocity(bodies),
        }
    }

    /// Hook ahead of the position pass. Both current variants re-derive
    /// their geometry inside each position iteration, so there is nothing
    /// to cache here yet.
    pub fn init_position_constraints(&mut self, _bodies: &Arena<RigidBody>) {}

    /// One direct position correction; returns whether the joint error is
    /// within tolerance.
    pub fn solve_position_constraints(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        tuning: &SolverTuning,
    ) -> bool {
        match self {
            Joint::Distance(j) => j.solve_position(bodies, tuning),
            Joint::Revolute(j) => j.solve_position(bodies, tuning),
        }
    }
}
