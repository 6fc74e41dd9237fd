use glam::Vec2;
use log::debug;

use crate::{
    config::SolverTuning,
    core::{manifold::Contact, RigidBody},
    dynamics::{
        contact_solver::{ContactConstraint, ContactSolver},
        joint::Joint,
        timestep::TimeStep,
    },
    events::{ContactPointInfo, SharedListener},
    utils::{
        allocator::{Arena, Handle},
        logging::ScopedTimer,
    },
};

/// What one island solve actually did, returned to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolveMetrics {
    /// Velocity sweeps run (always the step's fixed count).
    pub velocity_iterations: u32,
    /// Position correction iterations actually performed before the
    /// early-out or the cap.
    pub position_iterations: u32,
    pub contacts: usize,
    pub joints: usize,
    /// Whether the whole island was put to sleep this step.
    pub slept: bool,
}

/// A connected batch of bodies plus the contacts/joints coupling them,
/// advanced together for one step.
///
/// The island owns nothing: it holds body handles and contact/joint indices
/// into caller storage, granted exclusive mutation rights for the duration
/// of one `solve`/`solve_toi` call. Capacities are fixed at construction
/// and exceeding them on append is a programming error, not a recoverable
/// condition: the island builder mis-sized the island.
pub struct Island {
    body_capacity: usize,
    contact_capacity: usize,
    joint_capacity: usize,
    bodies: Vec<Handle>,
    contacts: Vec<usize>,
    joints: Vec<usize>,
    listener: Option<SharedListener>,
}

impl Island {
    pub fn new(
        body_capacity: usize,
        contact_capacity: usize,
        joint_capacity: usize,
        listener: Option<SharedListener>,
    ) -> Self {
        Self {
            body_capacity,
            contact_capacity,
            joint_capacity,
            bodies: Vec::with_capacity(body_capacity),
            contacts: Vec::with_capacity(contact_capacity),
            joints: Vec::with_capacity(joint_capacity),
            listener,
        }
    }

    /// Resets counts for reuse. Backing storage is kept.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }

    pub fn push_body(&mut self, handle: Handle) {
        assert!(
            self.bodies.len() < self.body_capacity,
            "island body capacity {} exceeded",
            self.body_capacity
        );
        self.bodies.push(handle);
    }

    pub fn push_contact(&mut self, contact_index: usize) {
        assert!(
            self.contacts.len() < self.contact_capacity,
            "island contact capacity {} exceeded",
            self.contact_capacity
        );
        self.contacts.push(contact_index);
    }

    pub fn push_joint(&mut self, joint_index: usize) {
        assert!(
            self.joints.len() < self.joint_capacity,
            "island joint capacity {} exceeded",
            self.joint_capacity
        );
        self.joints.push(joint_index);
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Advances every dynamic body in the island by one full step.
    ///
    /// The phase order is load-bearing for stability: integrate velocities,
    /// init constraints (warm start), fixed velocity sweeps, commit warm
    /// start impulses, integrate positions, optional position correction,
    /// report, sleep.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &self,
        step: &TimeStep,
        gravity: Vec2,
        tuning: &SolverTuning,
        bodies: &mut Arena<RigidBody>,
        contacts: &mut [Contact],
        joints: &mut [Joint],
        correct_positions: bool,
        allow_sleep: bool,
    ) -> SolveMetrics {
        let _timer = ScopedTimer::new("island_solve");
        let mut metrics = SolveMetrics {
            velocity_iterations: step.velocity_iterations,
            contacts: self.contacts.len(),
            joints: self.joints.len(),
            ..Default::default()
        };

        self.integrate_velocities(step, gravity, tuning, bodies);

        let mut contact_solver =
            ContactSolver::new(step, tuning, &self.contacts, contacts, bodies);
        contact_solver.init_velocity_constraints(bodies);
        for &joint_index in &self.joints {
            joints[joint_index].init_velocity_constraints(step, bodies);
        }

        // Fixed-count sweeps, no early exit: velocity residual is not a
        // reliable stopping signal.
        for _ in 0..step.velocity_iterations {
            contact_solver.solve_velocity_constraints(bodies);
            for &joint_index in &self.joints {
                joints[joint_index].solve_velocity_constraints(step, bodies);
            }
        }

        contact_solver.finalize_velocity_constraints(contacts);

        self.integrate_positions(step, bodies);

        if correct_positions {
            for &joint_index in &self.joints {
                joints[joint_index].init_position_constraints(bodies);
            }
            metrics.position_iterations = self.correct_positions(
                step,
                tuning.contact_baumgarte,
                tuning,
                bodies,
                Some(joints),
                &mut contact_solver,
            );
        }

        self.report(contact_solver.constraints(), contacts, bodies);

        if allow_sleep {
            metrics.slept = self.update_sleep(step.dt, tuning, bodies);
        }

        metrics
    }

    /// Resolves one narrow TOI time slice: contacts only, no warm starting,
    /// no force/gravity/damping integration, stiffer position bias, and no
    /// impulse persistence.
    pub fn solve_toi(
        &self,
        sub_step: &TimeStep,
        tuning: &SolverTuning,
        bodies: &mut Arena<RigidBody>,
        contacts: &mut [Contact],
    ) -> SolveMetrics {
        let _timer = ScopedTimer::new("island_solve_toi");
        debug_assert!(!sub_step.warm_starting, "TOI sub-steps never warm start");
        let mut metrics = SolveMetrics {
            velocity_iterations: sub_step.velocity_iterations,
            contacts: self.contacts.len(),
            ..Default::default()
        };

        let mut contact_solver =
            ContactSolver::new(sub_step, tuning, &self.contacts, contacts, bodies);
        contact_solver.init_velocity_constraints(bodies);

        for _ in 0..sub_step.velocity_iterations {
            contact_solver.solve_velocity_constraints(bodies);
        }

        // No finalize: large sub-step impulses would corrupt the next full
        // step's warm start.

        self.integrate_positions(sub_step, bodies);

        metrics.position_iterations = self.correct_positions(
            sub_step,
            tuning.toi_baumgarte,
            tuning,
            bodies,
            None,
            &mut contact_solver,
        );

        self.report(contact_solver.constraints(), contacts, bodies);

        metrics
    }

    fn integrate_velocities(
        &self,
        step: &TimeStep,
        gravity: Vec2,
        tuning: &SolverTuning,
        bodies: &mut Arena<RigidBody>,
    ) {
        for &handle in &self.bodies {
            let Some(body) = bodies.get_mut(handle) else {
                continue;
            };
            if body.is_static() {
                continue;
            }

            body.velocity.linear +=
                step.dt * (body.gravity_scale * gravity + body.inv_mass * body.force);
            body.velocity.angular += step.dt * body.inv_inertia * body.torque;
            body.force = Vec2::ZERO;
            body.torque = 0.0;

            // First-order approximation of exponential decay; the clamp
            // keeps large damping from reversing the velocity.
            body.velocity.linear *= (1.0 - step.dt * body.linear_damping).clamp(0.0, 1.0);
            body.velocity.angular *= (1.0 - step.dt * body.angular_damping).clamp(0.0, 1.0);

            let speed_sq = body.velocity.linear.length_squared();
            if speed_sq > tuning.max_linear_velocity * tuning.max_linear_velocity {
                body.velocity.linear *= tuning.max_linear_velocity / speed_sq.sqrt();
            }
            body.velocity.angular = body
                .velocity
                .angular
                .clamp(-tuning.max_angular_velocity, tuning.max_angular_velocity);
        }
    }

    fn integrate_positions(&self, step: &TimeStep, bodies: &mut Arena<RigidBody>) {
        for &handle in &self.bodies {
            let Some(body) = bodies.get_mut(handle) else {
                continue;
            };
            if body.is_static() {
                continue;
            }
            // Snapshot the pre-step pose for continuous-collision use.
            body.sweep.snapshot();
            body.sweep.c += step.dt * body.velocity.linear;
            body.sweep.a += step.dt * body.velocity.angular;
            body.synchronize_transform();
        }
    }

    /// Runs the position correction loop, breaking out the first iteration
    /// where contacts and every joint report satisfied. Returns the number
    /// of iterations actually performed.
    fn correct_positions(
        &self,
        step: &TimeStep,
        bias_factor: f32,
        tuning: &SolverTuning,
        bodies: &mut Arena<RigidBody>,
        mut joints: Option<&mut [Joint]>,
        contact_solver: &mut ContactSolver,
    ) -> u32 {
        let mut iterations = 0;
        for _ in 0..step.position_iterations {
            iterations += 1;
            let contacts_satisfied =
                contact_solver.solve_position_constraints(bodies, bias_factor, tuning);
            let mut joints_satisfied = true;
            if let Some(joints) = joints.as_deref_mut() {
                for &joint_index in &self.joints {
                    joints_satisfied &=
                        joints[joint_index].solve_position_constraints(bodies, tuning);
                }
            }
            if contacts_satisfied && joints_satisfied {
                break;
            }
        }

        // Positional adjustments moved the sweeps; refresh the cached
        // transforms before anyone reads them.
        for &handle in &self.bodies {
            if let Some(body) = bodies.get_mut(handle) {
                if !body.is_static() {
                    body.synchronize_transform();
                }
            }
        }

        iterations
    }

    /// Forwards finalized per-point results to the sink, deduplicating new
    /// versus persisted touches. Impulse magnitudes come from the resolver,
    /// not the manifold; TOI solves intentionally never persist theirs.
    fn report(
        &self,
        constraints: &[ContactConstraint],
        contacts: &mut [Contact],
        bodies: &Arena<RigidBody>,
    ) {
        let Some(listener) = &self.listener else {
            return;
        };
        let mut listener = listener.lock();

        for constraint in constraints {
            let contact = &mut contacts[constraint.contact_index];
            let Some(body_a) = bodies.get(contact.body_a) else {
                continue;
            };
            let transform = body_a.transform;
            let shape_a = contact.shape_a;
            let shape_b = contact.shape_b;

            for (slot, resolved) in contact
                .manifold
                .points_mut()
                .iter_mut()
                .zip(constraint.points())
            {
                let info = ContactPointInfo {
                    shape_a,
                    shape_b,
                    position: transform.transform_point(slot.local_point),
                    normal: constraint.normal,
                    separation: slot.separation,
                    normal_impulse: resolved.normal_impulse,
                    tangent_impulse: resolved.tangent_impulse,
                    feature: slot.feature,
                };
                if slot.consume_new() {
                    listener.on_added(&info);
                } else {
                    listener.on_persisted(&info);
                }
            }
        }
    }

    /// All-or-nothing sleep: the island sleeps only once every non-static
    /// body has stayed below both tolerances for the full grace period.
    /// Bodies in one island are dynamically coupled, so a partial sleep
    /// would be physically incoherent.
    fn update_sleep(&self, dt: f32, tuning: &SolverTuning, bodies: &mut Arena<RigidBody>) -> bool {
        let linear_tol_sq = tuning.linear_sleep_tolerance_sq();
        let angular_tol_sq = tuning.angular_sleep_tolerance_sq();
        let mut min_sleep_time = f32::MAX;

        for &handle in &self.bodies {
            let Some(body) = bodies.get_mut(handle) else {
                continue;
            };
            if body.is_static() {
                continue;
            }
            let angular_sq = body.velocity.angular * body.velocity.angular;
            if !body.can_sleep
                || angular_sq > angular_tol_sq
                || body.velocity.linear.length_squared() > linear_tol_sq
            {
                body.sleep_time = 0.0;
                min_sleep_time = 0.0;
            } else {
                body.sleep_time += dt;
                min_sleep_time = min_sleep_time.min(body.sleep_time);
            }
        }

        if min_sleep_time == f32::MAX || min_sleep_time < tuning.time_to_sleep {
            return false;
        }

        debug!("island sleeping {} bodies", self.bodies.len());
        for &handle in &self.bodies {
            if let Some(body) = bodies.get_mut(handle) {
                if !body.is_static() {
                    body.put_to_sleep();
                }
            }
        }
        true
    }
}
