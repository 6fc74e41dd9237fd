use glam::Vec2;

use crate::{
    config::SolverTuning,
    core::{
        manifold::{Contact, FeatureId, MAX_MANIFOLD_POINTS},
        types::{cross, cross_scalar, Rot2},
        RigidBody,
    },
    dynamics::timestep::TimeStep,
    utils::allocator::{Arena, Handle},
};

/// Per-point solver state for one contact constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintPoint {
    /// Anchor relative to body A's center, in A's local frame.
    local_anchor_a: Vec2,
    /// Anchor relative to body B's center, in B's local frame.
    local_anchor_b: Vec2,
    /// Current world-space arm from body A's center.
    r_a: Vec2,
    /// Current world-space arm from body B's center.
    r_b: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
    /// Separation reported by the narrow phase at solver construction.
    pub separation: f32,
    /// Resolved normal impulse magnitude, read by reporting.
    pub normal_impulse: f32,
    /// Resolved tangent impulse magnitude, read by reporting.
    pub tangent_impulse: f32,
    pub feature: FeatureId,
}

/// One contact's worth of velocity/position constraint state.
#[derive(Debug, Clone)]
pub struct ContactConstraint {
    /// Index of the backing contact in the caller's contact storage.
    pub contact_index: usize,
    body_a: Handle,
    body_b: Handle,
    pub normal: Vec2,
    friction: f32,
    restitution: f32,
    points: [ConstraintPoint; MAX_MANIFOLD_POINTS],
    count: usize,
}

impl ContactConstraint {
    pub fn points(&self) -> &[ConstraintPoint] {
        &self.points[..self.count]
    }
}

/// Iterative resolver for the island's contact set.
///
/// Constructed fresh for every `solve`/`solve_toi` call; warm-start
/// impulses are seeded from the manifolds only when the step requests it.
pub struct ContactSolver {
    constraints: Vec<ContactConstraint>,
    warm_starting: bool,
    restitution_threshold: f32,
}

impl ContactSolver {
    /// Builds constraint state from the island's contact indices. Contacts
    /// with empty manifolds contribute nothing.
    pub fn new(
        step: &TimeStep,
        tuning: &SolverTuning,
        contact_indices: &[usize],
        contacts: &[Contact],
        bodies: &Arena<RigidBody>,
    ) -> Self {
        let mut constraints = Vec::with_capacity(contact_indices.len());
        for &contact_index in contact_indices {
            let contact = &contacts[contact_index];
            if contact.manifold.is_empty() {
                continue;
            }
            let (Some(body_a), Some(body_b)) =
                (bodies.get(contact.body_a), bodies.get(contact.body_b))
            else {
                continue;
            };

            let mut constraint = ContactConstraint {
                contact_index,
                body_a: contact.body_a,
                body_b: contact.body_b,
                normal: contact.manifold.normal,
                friction: contact.friction,
                restitution: contact.restitution,
                points: [ConstraintPoint::default(); MAX_MANIFOLD_POINTS],
                count: contact.manifold.len(),
            };

            for (slot, point) in constraint.points[..constraint.count]
                .iter_mut()
                .zip(contact.manifold.points())
            {
                let world = body_a.transform.transform_point(point.local_point);
                let rot_a = Rot2::from_angle(body_a.sweep.a);
                let rot_b = Rot2::from_angle(body_b.sweep.a);
                slot.local_anchor_a = rot_a.apply_inverse(world - body_a.sweep.c);
                slot.local_anchor_b = rot_b.apply_inverse(world - body_b.sweep.c);
                slot.separation = point.separation;
                slot.feature = point.feature;
                if step.warm_starting {
                    slot.normal_impulse = point.normal_impulse;
                    slot.tangent_impulse = point.tangent_impulse;
                }
            }
            constraints.push(constraint);
        }

        Self {
            constraints,
            warm_starting: step.warm_starting,
            restitution_threshold: tuning.restitution_threshold,
        }
    }

    pub fn constraints(&self) -> &[ContactConstraint] {
        &self.constraints
    }

    /// Computes effective masses and restitution biases from the current
    /// body poses, then reapplies warm-start impulses as the initial guess.
    pub fn init_velocity_constraints(&mut self, bodies: &mut Arena<RigidBody>) {
        for constraint in &mut self.constraints {
            let Some((body_a, body_b)) = bodies.get2_mut(constraint.body_a, constraint.body_b)
            else {
                continue;
            };

            let normal = constraint.normal;
            let tangent = Vec2::new(normal.y, -normal.x);
            let inv_mass = body_a.inv_mass + body_b.inv_mass;
            let rot_a = Rot2::from_angle(body_a.sweep.a);
            let rot_b = Rot2::from_angle(body_b.sweep.a);

            for point in &mut constraint.points[..constraint.count] {
                point.r_a = rot_a.apply(point.local_anchor_a);
                point.r_b = rot_b.apply(point.local_anchor_b);

                let rn_a = cross(point.r_a, normal);
                let rn_b = cross(point.r_b, normal);
                let k_normal =
                    inv_mass + body_a.inv_inertia * rn_a * rn_a + body_b.inv_inertia * rn_b * rn_b;
                point.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let rt_a = cross(point.r_a, tangent);
                let rt_b = cross(point.r_b, tangent);
                let k_tangent =
                    inv_mass + body_a.inv_inertia * rt_a * rt_a + body_b.inv_inertia * rt_b * rt_b;
                point.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                point.velocity_bias = 0.0;
                let v_rel = normal.dot(
                    body_b.velocity.linear + cross_scalar(body_b.velocity.angular, point.r_b)
                        - body_a.velocity.linear
                        - cross_scalar(body_a.velocity.angular, point.r_a),
                );
                if v_rel < -self.restitution_threshold {
                    point.velocity_bias = -constraint.restitution * v_rel;
                }

                if self.warm_starting {
                    let impulse =
                        point.normal_impulse * normal + point.tangent_impulse * tangent;
                    body_a.velocity.linear -= body_a.inv_mass * impulse;
                    body_a.velocity.angular -= body_a.inv_inertia * cross(point.r_a, impulse);
                    body_b.velocity.linear += body_b.inv_mass * impulse;
                    body_b.velocity.angular += body_b.inv_inertia * cross(point.r_b, impulse);
                }
            }
        }
    }

    /// One Gauss-Seidel sweep over every contact point: friction first,
    /// then the non-penetration constraint, both with accumulated clamping.
    pub fn solve_velocity_constraints(&mut self, bodies: &mut Arena<RigidBody>) {
        for constraint in &mut self.constraints {
            let Some((body_a, body_b)) = bodies.get2_mut(constraint.body_a, constraint.body_b)
            else {
                continue;
            };

            let normal = constraint.normal;
            let tangent = Vec2::new(normal.y, -normal.x);
            let friction = constraint.friction;

            for point in &mut constraint.points[..constraint.count] {
                let dv = body_b.velocity.linear + cross_scalar(body_b.velocity.angular, point.r_b)
                    - body_a.velocity.linear
                    - cross_scalar(body_a.velocity.angular, point.r_a);

                let vt = dv.dot(tangent);
                let mut lambda = point.tangent_mass * -vt;
                let max_friction = friction * point.normal_impulse;
                let new_impulse =
                    (point.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                lambda = new_impulse - point.tangent_impulse;
                point.tangent_impulse = new_impulse;

                let impulse = lambda * tangent;
                body_a.velocity.linear -= body_a.inv_mass * impulse;
                body_a.velocity.angular -= body_a.inv_inertia * cross(point.r_a, impulse);
                body_b.velocity.linear += body_b.inv_mass * impulse;
                body_b.velocity.angular += body_b.inv_inertia * cross(point.r_b, impulse);

                let dv = body_b.velocity.linear + cross_scalar(body_b.velocity.angular, point.r_b)
                    - body_a.velocity.linear
                    - cross_scalar(body_a.velocity.angular, point.r_a);

                let vn = dv.dot(normal);
                let mut lambda = -point.normal_mass * (vn - point.velocity_bias);
                let new_impulse = (point.normal_impulse + lambda).max(0.0);
                lambda = new_impulse - point.normal_impulse;
                point.normal_impulse = new_impulse;

                let impulse = lambda * normal;
                body_a.velocity.linear -= body_a.inv_mass * impulse;
                body_a.velocity.angular -= body_a.inv_inertia * cross(point.r_a, impulse);
                body_b.velocity.linear += body_b.inv_mass * impulse;
                body_b.velocity.angular += body_b.inv_inertia * cross(point.r_b, impulse);
            }
        }
    }

    /// Commits accumulated impulses back to the manifolds so the next full
    /// step can warm start from them. TOI sub-steps skip this on purpose.
    pub fn finalize_velocity_constraints(&self, contacts: &mut [Contact]) {
        for constraint in &self.constraints {
            let manifold = &mut contacts[constraint.contact_index].manifold;
            for (point, slot) in constraint.points().iter().zip(manifold.points_mut()) {
                slot.normal_impulse = point.normal_impulse;
                slot.tangent_impulse = point.tangent_impulse;
            }
        }
    }

    /// One position correction sweep. Geometry is re-derived from the
    /// current sweeps each call; reusing stale anchors diverges.
    ///
    /// Returns true once the worst separation is within `3 * linear_slop`;
    /// the pass never pushes separation all the way to the slop itself.
    pub fn solve_position_constraints(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        bias_factor: f32,
        tuning: &SolverTuning,
    ) -> bool {
        let mut min_separation = 0.0_f32;

        for constraint in &mut self.constraints {
            let Some((body_a, body_b)) = bodies.get2_mut(constraint.body_a, constraint.body_b)
            else {
                continue;
            };
            let normal = constraint.normal;
            let inv_mass = body_a.inv_mass + body_b.inv_mass;

            for point in &mut constraint.points[..constraint.count] {
                let rot_a = Rot2::from_angle(body_a.sweep.a);
                let rot_b = Rot2::from_angle(body_b.sweep.a);
                let r_a = rot_a.apply(point.local_anchor_a);
                let r_b = rot_b.apply(point.local_anchor_b);
                let p_a = body_a.sweep.c + r_a;
                let p_b = body_b.sweep.c + r_b;

                // Both anchors coincided at init, so their drift along the
                // normal tracks the separation change.
                let separation = (p_b - p_a).dot(normal) + point.separation;
                min_separation = min_separation.min(separation);

                let c = (bias_factor * (separation + tuning.linear_slop))
                    .clamp(-tuning.max_linear_correction, 0.0);

                let rn_a = cross(r_a, normal);
                let rn_b = cross(r_b, normal);
                let k = inv_mass
                    + body_a.inv_inertia * rn_a * rn_a
                    + body_b.inv_inertia * rn_b * rn_b;
                let impulse = if k > 0.0 { -c / k } else { 0.0 };
                let p = impulse * normal;

                body_a.sweep.c -= body_a.inv_mass * p;
                body_a.sweep.a -= body_a.inv_inertia * cross(r_a, p);
                body_b.sweep.c += body_b.inv_mass * p;
                body_b.sweep.a += body_b.inv_inertia * cross(r_b, p);
            }
        }

        min_separation >= -3.0 * tuning.linear_slop
    }
}
