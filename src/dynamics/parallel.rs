//! Dispatch of disjoint islands across execution units.
//!
//! Islands with disjoint constraint graphs never share a body, so they can
//! be solved in parallel without changing any island's numeric result. The
//! batch type makes that contract structural: every batch carries exclusive
//! `&mut` borrows of exactly the storage its island references, so two
//! batches over shared storage do not compile.

use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    config::SolverTuning,
    core::{manifold::Contact, RigidBody},
    dynamics::{island::SolveMetrics, Island, Joint, TimeStep},
    utils::allocator::Arena,
};

/// One island together with the storage slice it exclusively owns for the
/// duration of the dispatch.
pub struct IslandBatch<'a> {
    pub island: &'a Island,
    pub bodies: &'a mut Arena<RigidBody>,
    pub contacts: &'a mut [Contact],
    pub joints: &'a mut [Joint],
}

impl IslandBatch<'_> {
    fn solve(
        &mut self,
        step: &TimeStep,
        gravity: Vec2,
        tuning: &SolverTuning,
        correct_positions: bool,
        allow_sleep: bool,
    ) -> SolveMetrics {
        self.island.solve(
            step,
            gravity,
            tuning,
            self.bodies,
            self.contacts,
            self.joints,
            correct_positions,
            allow_sleep,
        )
    }
}

/// Solves every batch, in parallel when the `parallel` feature is enabled.
/// Within each island the solve stays strictly sequential and deterministic.
pub fn solve_batches(
    batches: &mut [IslandBatch<'_>],
    step: &TimeStep,
    gravity: Vec2,
    tuning: &SolverTuning,
    correct_positions: bool,
    allow_sleep: bool,
) -> Vec<SolveMetrics> {
    #[cfg(feature = "parallel")]
    {
        batches
            .par_iter_mut()
            .map(|batch| batch.solve(step, gravity, tuning, correct_positions, allow_sleep))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        batches
            .iter_mut()
            .map(|batch| batch.solve(step, gravity, tuning, correct_positions, allow_sleep))
            .collect()
    }
}
