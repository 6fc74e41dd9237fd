use std::sync::Arc;

use impulse2d::*;
use parking_lot::Mutex;

const DT: f32 = 1.0 / 60.0;
const GRAVITY: Vec2 = Vec2::new(0.0, -10.0);

#[derive(Default)]
struct EventLog {
    added: Vec<FeatureId>,
    persisted: Vec<FeatureId>,
    last_normal_impulse: f32,
}

#[derive(Default)]
struct RecordingListener {
    log: Arc<Mutex<EventLog>>,
}

impl ContactListener for RecordingListener {
    fn on_added(&mut self, point: &ContactPointInfo) {
        let mut log = self.log.lock();
        log.added.push(point.feature);
        log.last_normal_impulse = point.normal_impulse;
    }

    fn on_persisted(&mut self, point: &ContactPointInfo) {
        let mut log = self.log.lock();
        log.persisted.push(point.feature);
        log.last_normal_impulse = point.normal_impulse;
    }
}

fn recording_listener() -> (Arc<Mutex<EventLog>>, SharedListener) {
    let listener = RecordingListener::default();
    let log = listener.log.clone();
    (log, shared_listener(listener))
}

/// A dynamic body resting on static ground, penetrating slightly and
/// approaching along the contact normal.
fn falling_on_ground(
    bodies: &mut Arena<RigidBody>,
) -> (Handle, Handle, Vec<Contact>) {
    let mut faller = RigidBody::dynamic(Vec2::new(0.0, 0.5));
    faller.velocity.linear = Vec2::new(0.0, -1.0);
    let faller = bodies.insert(faller);
    let ground = bodies.insert(RigidBody::fixed(Vec2::new(0.0, -0.5)));

    let mut manifold = Manifold::new(Vec2::new(0.0, -1.0));
    manifold.push(ManifoldPoint::new(
        Vec2::new(0.0, -0.5),
        -0.01,
        FeatureId(42),
    ));
    let contacts = vec![Contact::new(faller, ground, manifold)
        .with_shapes(1, 2)
        .with_material(0.5, 0.0)];
    (faller, ground, contacts)
}

#[test]
fn zero_inverse_mass_bodies_are_never_integrated() {
    let mut bodies = Arena::new();
    let mut wall = RigidBody::kinematic(Vec2::new(3.0, 0.0));
    wall.velocity.linear = Vec2::new(5.0, 0.0);
    let wall = bodies.insert(wall);

    let mut island = Island::new(1, 0, 0, None);
    island.push_body(wall);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    island.solve(
        &step,
        GRAVITY,
        &tuning,
        &mut bodies,
        &mut [],
        &mut [],
        true,
        true,
    );
    let sub = TimeStep::sub_step(DT * 0.25, 4, 4);
    island.solve_toi(&sub, &tuning, &mut bodies, &mut []);

    let body = bodies.get(wall).unwrap();
    assert_eq!(body.velocity.linear, Vec2::new(5.0, 0.0));
    assert_eq!(body.sweep.c, Vec2::new(3.0, 0.0));
    assert!(!body.asleep, "kinematic bodies are skipped by sleep too");
}

#[test]
fn zero_mass_via_set_mass_is_not_integrated() {
    let mut bodies = Arena::new();
    let mut body = RigidBody::dynamic(Vec2::new(0.0, 2.0));
    body.set_mass(0.0, 10.0);
    let handle = bodies.insert(body);

    let mut island = Island::new(1, 0, 0, None);
    island.push_body(handle);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    island.solve(
        &step,
        GRAVITY,
        &tuning,
        &mut bodies,
        &mut [],
        &mut [],
        true,
        false,
    );

    let body = bodies.get(handle).unwrap();
    assert_eq!(body.velocity.linear, Vec2::ZERO);
    assert_eq!(body.velocity.angular, 0.0);
    assert_eq!(body.sweep.c, Vec2::new(0.0, 2.0));
}

#[test]
fn integrated_velocities_are_clamped() {
    let mut bodies = Arena::new();
    let mut body = RigidBody::dynamic(Vec2::ZERO);
    body.velocity.linear = Vec2::new(1.0e6, 0.0);
    body.velocity.angular = -1.0e6;
    let handle = bodies.insert(body);

    let mut island = Island::new(1, 0, 0, None);
    island.push_body(handle);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    island.solve(
        &step,
        GRAVITY,
        &tuning,
        &mut bodies,
        &mut [],
        &mut [],
        false,
        false,
    );

    let body = bodies.get(handle).unwrap();
    assert!(body.velocity.linear.length() <= tuning.max_linear_velocity * 1.001);
    assert!(body.velocity.angular.abs() <= tuning.max_angular_velocity);
    assert!(body.velocity.angular < 0.0, "clamp keeps the sign");
}

#[test]
fn overdamped_body_is_fully_stopped_never_reversed() {
    let mut bodies = Arena::new();
    let mut body = RigidBody::dynamic(Vec2::ZERO);
    body.velocity.linear = Vec2::new(3.0, 1.0);
    body.velocity.angular = 2.0;
    // damping * dt = 2 > 1: the multiplier clamps to exactly zero.
    body.linear_damping = 120.0;
    body.angular_damping = 120.0;
    let handle = bodies.insert(body);

    let mut island = Island::new(1, 0, 0, None);
    island.push_body(handle);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    island.solve(
        &step,
        Vec2::ZERO,
        &tuning,
        &mut bodies,
        &mut [],
        &mut [],
        false,
        false,
    );

    let body = bodies.get(handle).unwrap();
    assert_eq!(body.velocity.linear, Vec2::ZERO);
    assert_eq!(body.velocity.angular, 0.0);
}

#[test]
fn sleep_is_all_or_nothing_per_island() {
    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    let steps_past_grace = (tuning.time_to_sleep / DT).ceil() as usize + 5;

    // One restless body keeps the whole island awake.
    let mut bodies = Arena::new();
    let quiet_a = bodies.insert(RigidBody::dynamic(Vec2::new(0.0, 0.0)));
    let quiet_b = bodies.insert(RigidBody::dynamic(Vec2::new(1.0, 0.0)));
    let mut restless = RigidBody::dynamic(Vec2::new(2.0, 0.0));
    restless.velocity.linear = Vec2::new(1.0, 0.0);
    let restless = bodies.insert(restless);

    let mut island = Island::new(3, 0, 0, None);
    island.push_body(quiet_a);
    island.push_body(quiet_b);
    island.push_body(restless);

    for _ in 0..steps_past_grace {
        island.solve(
            &step,
            Vec2::ZERO,
            &tuning,
            &mut bodies,
            &mut [],
            &mut [],
            false,
            true,
        );
    }
    for handle in [quiet_a, quiet_b, restless] {
        assert!(!bodies.get(handle).unwrap().asleep, "mixed island slept");
    }

    // The same island with every body below tolerance sleeps together.
    let mut bodies = Arena::new();
    let handles: Vec<_> = (0..3)
        .map(|i| bodies.insert(RigidBody::dynamic(Vec2::new(i as f32, 0.0))))
        .collect();
    let mut island = Island::new(3, 0, 0, None);
    for &handle in &handles {
        island.push_body(handle);
    }

    let mut slept = false;
    for _ in 0..steps_past_grace {
        let metrics = island.solve(
            &step,
            Vec2::ZERO,
            &tuning,
            &mut bodies,
            &mut [],
            &mut [],
            false,
            true,
        );
        slept |= metrics.slept;
    }
    assert!(slept);
    for &handle in &handles {
        let body = bodies.get(handle).unwrap();
        assert!(body.asleep);
        assert_eq!(body.velocity.linear, Vec2::ZERO);
        assert_eq!(body.velocity.angular, 0.0);
    }
}

#[test]
fn new_point_reports_added_once_then_persisted() {
    let (recorder, listener) = recording_listener();
    let mut bodies = Arena::new();
    let (faller, ground, mut contacts) = falling_on_ground(&mut bodies);

    let mut island = Island::new(2, 1, 0, Some(listener));
    island.push_body(faller);
    island.push_body(ground);
    island.push_contact(0);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    for _ in 0..3 {
        island.solve(
            &step,
            GRAVITY,
            &tuning,
            &mut bodies,
            &mut contacts,
            &mut [],
            true,
            false,
        );
    }

    let recorder = recorder.lock();
    assert_eq!(recorder.added, vec![FeatureId(42)], "added fires exactly once");
    assert_eq!(recorder.persisted.len(), 2);
    assert!(recorder.persisted.iter().all(|&f| f == FeatureId(42)));
}

#[test]
fn resting_contact_stops_the_faller() {
    let mut bodies = Arena::new();
    let (faller, ground, mut contacts) = falling_on_ground(&mut bodies);

    let mut island = Island::new(2, 1, 0, None);
    island.push_body(faller);
    island.push_body(ground);
    island.push_contact(0);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    island.solve(
        &step,
        GRAVITY,
        &tuning,
        &mut bodies,
        &mut contacts,
        &mut [],
        true,
        false,
    );

    let body = bodies.get(faller).unwrap();
    assert!(
        body.velocity.linear.y > -0.05,
        "contact failed to arrest the fall: vy = {}",
        body.velocity.linear.y
    );
    assert_eq!(bodies.get(ground).unwrap().sweep.c, Vec2::new(0.0, -0.5));
    // Accumulated impulses were committed for the next step's warm start.
    assert!(contacts[0].manifold.points()[0].normal_impulse > 0.0);
}

#[test]
fn toi_sub_step_leaves_warm_start_state_untouched() {
    let (recorder, listener) = recording_listener();
    let mut bodies = Arena::new();
    let (faller, ground, mut contacts) = falling_on_ground(&mut bodies);

    let mut island = Island::new(2, 1, 0, Some(listener));
    island.push_body(faller);
    island.push_body(ground);
    island.push_contact(0);

    let sub = TimeStep::sub_step(DT * 0.5, 8, 8);
    let tuning = SolverTuning::default();
    island.solve_toi(&sub, &tuning, &mut bodies, &mut contacts);

    // The sub-step resolved and reported a real impulse...
    assert!(recorder.lock().last_normal_impulse > 0.0);
    // ...but persisted nothing for warm starting.
    let point = contacts[0].manifold.points()[0];
    assert_eq!(point.normal_impulse, 0.0);
    assert_eq!(point.tangent_impulse, 0.0);

    // A following full solve therefore starts from a zero initial guess
    // and still commits its own impulses afterwards.
    let step = TimeStep::new(DT);
    island.solve(
        &step,
        GRAVITY,
        &tuning,
        &mut bodies,
        &mut contacts,
        &mut [],
        true,
        false,
    );
    assert!(contacts[0].manifold.points()[0].normal_impulse >= 0.0);
}

#[test]
fn single_falling_body_end_to_end() {
    let (recorder, listener) = recording_listener();
    let mut bodies = Arena::new();
    let handle = bodies.insert(RigidBody::dynamic(Vec2::ZERO));

    let mut island = Island::new(1, 0, 0, Some(listener));
    island.push_body(handle);

    let step = TimeStep::new(DT);
    let tuning = SolverTuning::default();
    island.solve(
        &step,
        GRAVITY,
        &tuning,
        &mut bodies,
        &mut [],
        &mut [],
        true,
        true,
    );

    let body = bodies.get(handle).unwrap();
    let expected_vy = -10.0 * DT;
    assert!((body.velocity.linear.y - expected_vy).abs() < 1e-6);
    assert!(body.velocity.linear.x.abs() < 1e-6);
    assert!((body.sweep.c.y - expected_vy * DT).abs() < 1e-6);
    // Pre-step pose was snapshotted before integration.
    assert_eq!(body.sweep.c0, Vec2::ZERO);

    let recorder = recorder.lock();
    assert!(recorder.added.is_empty());
    assert!(recorder.persisted.is_empty());
}

#[test]
fn position_correction_early_out_records_iterations() {
    let tuning = SolverTuning::default();

    // Already-separated pair: satisfied on the first iteration.
    let mut bodies = Arena::new();
    let a = bodies.insert(RigidBody::dynamic(Vec2::new(0.0, 0.5)));
    let b = bodies.insert(RigidBody::fixed(Vec2::new(0.0, -0.5)));
    let mut manifold = Manifold::new(Vec2::new(0.0, -1.0));
    manifold.push(ManifoldPoint::new(Vec2::new(0.0, -0.5), 0.0, FeatureId(0)));
    let mut contacts = vec![Contact::new(a, b, manifold)];

    let mut island = Island::new(2, 1, 0, None);
    island.push_body(a);
    island.push_body(b);
    island.push_contact(0);

    let step = TimeStep::new(DT).with_iterations(8, 10);
    let metrics = island.solve(
        &step,
        Vec2::ZERO,
        &tuning,
        &mut bodies,
        &mut contacts,
        &mut [],
        true,
        false,
    );
    assert_eq!(metrics.position_iterations, 1);

    // A deep penetration cannot converge within the cap.
    let mut bodies = Arena::new();
    let a = bodies.insert(RigidBody::dynamic(Vec2::new(0.0, 0.5)));
    let b = bodies.insert(RigidBody::fixed(Vec2::new(0.0, -0.5)));
    let mut manifold = Manifold::new(Vec2::new(0.0, -1.0));
    manifold.push(ManifoldPoint::new(Vec2::new(0.0, -0.5), -0.2, FeatureId(0)));
    let mut contacts = vec![Contact::new(a, b, manifold)];

    let mut island = Island::new(2, 1, 0, None);
    island.push_body(a);
    island.push_body(b);
    island.push_contact(0);

    let metrics = island.solve(
        &step,
        Vec2::ZERO,
        &tuning,
        &mut bodies,
        &mut contacts,
        &mut [],
        true,
        false,
    );
    assert_eq!(metrics.position_iterations, 10);
}
