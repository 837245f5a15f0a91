// Finite-difference solver: initialization, stability, history and latent heat

use approx::assert_abs_diff_eq;
use geotherm_rust::diffusion_solver::{BoundaryCondition, DiffusionSolver};
use geotherm_rust::geometry::IntrusionShape;
use geotherm_rust::grid::{Axis, GridDomain};
use geotherm_rust::material::{LatentHeat, MaterialProperties};
use geotherm_rust::velocity::{FlowPattern, VelocityField};
use geotherm_rust::GeothermError;
use glam::DVec3;
use more_asserts::{assert_gt, assert_lt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn pluton_solver(velocity: Option<Arc<VelocityField>>) -> DiffusionSolver {
    let domain = GridDomain::cubic(10, 10, 10, 10.0).unwrap();
    let mask = IntrusionShape::Spherical {
        center: DVec3::new(50.0, 50.0, 50.0),
        radius: 20.0,
    }
    .build_mask(&domain);
    let props = MaterialProperties::new(1e-6, 20.0, 1200.0);
    DiffusionSolver::initialize(domain, props, velocity, Some(&mask)).unwrap()
}

#[test]
fn test_fresh_field_equals_background() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..25 {
        let domain = GridDomain::new(
            rng.random_range(1..8),
            rng.random_range(1..8),
            rng.random_range(1..8),
            rng.random_range(1.0..20.0),
            rng.random_range(1.0..20.0),
            rng.random_range(1.0..20.0),
        )
        .unwrap();
        let background = rng.random_range(-50.0..500.0);
        let props = MaterialProperties::new(1e-6, background, 1200.0);
        let solver = DiffusionSolver::initialize(domain, props, None, None).unwrap();
        assert!(solver.temperature().iter().all(|&t| t == background));
    }
}

#[test]
fn test_planar_block_shows_in_slice() {
    let domain = GridDomain::cubic(10, 10, 10, 10.0).unwrap();
    let mask = IntrusionShape::Planar {
        origin: DVec3::new(20.0, 20.0, 40.0),
        width: 50.0,
        height: 30.0,
        thickness: 20.0,
    }
    .build_mask(&domain);
    let solver = DiffusionSolver::initialize(domain, MaterialProperties::default(), None, Some(&mask)).unwrap();

    // z = 50 m cuts through the block, which covers x 2..=7 and y 2..=5
    let slice = solver.get_slice(Axis::Z, 5).unwrap();
    for ((i, j), &t) in slice.indexed_iter() {
        let inside = (2..=7).contains(&i) && (2..=5).contains(&j);
        assert_eq!(t, if inside { 1200.0 } else { 20.0 }, "cell ({}, {})", i, j);
    }

    let above = solver.get_slice(Axis::Z, 7).unwrap();
    assert!(above.iter().all(|&t| t == 20.0));
}

#[test]
fn test_pluton_center_cools() {
    println!("🌋 10x10x10 grid, 10 m cells, pluton r = 20 m");
    let mut solver = pluton_solver(None);
    solver.add_history_point(5, 5, 5).unwrap();

    // a single 1e7 s step: every neighbor of the center is still magma
    assert_eq!(solver.simulate_to(1e7).unwrap(), 1);
    assert_eq!(solver.center_temperature(), 1200.0);

    // the cooling front reaches the center two cells in
    assert_eq!(solver.simulate_to(1e8).unwrap(), 9);
    let center = solver.center_temperature();
    println!("   center after 1e8 s: {:.2} °C", center);
    assert_lt!(center, 1200.0);
    assert_gt!(center, 20.0);

    let history = solver.history_at(5, 5, 5).unwrap();
    assert_eq!(history.len(), 11);
    for pair in history.samples().windows(2) {
        assert_lt!(pair[0].0, pair[1].0);
    }
}

#[test]
fn test_history_point_one_past_the_edge_is_rejected() {
    let mut solver = pluton_solver(None);
    let nx = solver.domain().nx;
    let err = solver.add_history_point(nx, 0, 0).unwrap_err();
    assert!(matches!(err, GeothermError::InvalidPoint { i, .. } if i == nx));
    assert!(solver.history().is_empty());
}

#[test]
fn test_oversized_steps_match_the_stability_bound() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..10 {
        let kappa = rng.random_range(1e-7..1e-5);
        let h = rng.random_range(1.0..50.0);
        let domain = GridDomain::cubic(5, 5, 5, h).unwrap();
        let mask = IntrusionShape::Spherical {
            center: domain.center_position(),
            radius: h,
        }
        .build_mask(&domain);
        let props = MaterialProperties::new(kappa, 20.0, 1200.0);

        let mut huge = DiffusionSolver::initialize(domain, props, None, Some(&mask)).unwrap();
        let mut bounded = huge.clone();
        let limit = 0.2 * h * h / kappa;

        let report = huge.simulate_step(limit * rng.random_range(1.5..1e6)).unwrap();
        assert!(report.clamped);
        bounded.simulate_step(bounded.max_stable_dt()).unwrap();

        assert_abs_diff_eq!(report.dt, limit, epsilon = limit * 1e-12);
        assert_eq!(huge.temperature(), bounded.temperature());
    }
}

#[test]
fn test_clock_strictly_increases() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut solver = pluton_solver(None);
    let mut last = solver.current_time();
    for _ in 0..20 {
        solver.simulate_step(rng.random_range(1.0..1e8)).unwrap();
        assert_gt!(solver.current_time(), last);
        last = solver.current_time();
    }
}

#[test]
fn test_simulate_to_is_idempotent() {
    let mut solver = pluton_solver(None);
    solver.add_history_point(5, 5, 7).unwrap();
    solver.simulate_to(5e7).unwrap();
    let field = solver.temperature().clone();
    let history = solver.history().to_vec();

    for target in [0.0, 1e7, 5e7] {
        assert_eq!(solver.simulate_to(target).unwrap(), 0);
    }
    assert_eq!(solver.temperature(), &field);
    assert_eq!(solver.history(), history.as_slice());
    assert_eq!(solver.current_time(), 5e7);
}

#[test]
fn test_latent_heat_released_only_inside_crystallization_interval() {
    println!("🧊 single cell cooling through the crystallization interval");
    let domain = GridDomain::cubic(1, 1, 1, 10.0).unwrap();
    let props = MaterialProperties::new(1e-6, 1200.0, 1200.0).with_latent_heat(LatentHeat {
        solidus_c: 700.0,
        liquidus_c: 1200.0,
        latent_heat_j_kg: 4.0e5,
    });
    // ghost cells at 0 °C pull the cell down
    let mut solver = DiffusionSolver::initialize(domain, props, None, None).unwrap();
    let dt = 0.005 * 100.0 / 1e-6;

    let mut inside_steps = 0;
    let mut below_steps = 0;
    for _ in 0..10_000 {
        let before = solver.temperature()[[0, 0, 0]];
        if before < 650.0 {
            break;
        }
        let report = solver.simulate_step(dt).unwrap();
        if before < 700.0 {
            assert_eq!(report.latent_release, 0.0, "no release below the solidus at {:.1} °C", before);
            below_steps += 1;
        } else {
            assert_gt!(report.latent_release, 0.0);
            inside_steps += 1;
        }
    }
    println!("   {} steps releasing heat, {} steps below solidus", inside_steps, below_steps);
    assert_gt!(inside_steps, 0);
    assert_gt!(below_steps, 0);
    assert_lt!(solver.temperature()[[0, 0, 0]], 650.0);
}

#[test]
fn test_no_latent_release_while_liquid_is_unchanging() {
    let domain = GridDomain::cubic(3, 3, 3, 10.0).unwrap();
    let props = MaterialProperties::new(1e-6, 1200.0, 1200.0).with_latent_heat(LatentHeat::default());
    let mut solver = DiffusionSolver::initialize(domain, props, None, None)
        .unwrap()
        .with_boundary(BoundaryCondition::Background);
    for _ in 0..5 {
        assert_eq!(solver.simulate_step(1e6).unwrap().latent_release, 0.0);
    }
    assert!(solver.temperature().iter().all(|&t| t == 1200.0));
}

#[test]
fn test_upward_flow_carries_heat_up() {
    let domain = GridDomain::cubic(10, 10, 10, 10.0).unwrap();
    let flow = FlowPattern::Upward { max_velocity: 1e-6 }.build(&domain).unwrap();
    let mut still = pluton_solver(None);
    let mut moving = pluton_solver(Some(Arc::new(flow)));

    still.simulate_step(1e6).unwrap();
    moving.simulate_step(1e6).unwrap();

    // first country-rock cells above and below the pluton
    assert_gt!(moving.temperature()[[5, 5, 8]], still.temperature()[[5, 5, 8]]);
    assert_lt!(moving.temperature()[[5, 5, 2]], still.temperature()[[5, 5, 2]]);
}

#[test]
fn test_convection_cell_run_stays_finite() {
    let domain = GridDomain::cubic(12, 12, 12, 10.0).unwrap();
    let flow = FlowPattern::ConvectionCell { max_velocity: 1e-7 }.build(&domain).unwrap();
    let mask = IntrusionShape::Spherical {
        center: domain.center_position(),
        radius: 20.0,
    }
    .build_mask(&domain);
    let mut solver = DiffusionSolver::initialize(
        domain,
        MaterialProperties::default(),
        Some(Arc::new(flow)),
        Some(&mask),
    )
    .unwrap();
    solver.simulate_to(2e8).unwrap();
    assert!(solver.check_finite().is_ok());
    assert_lt!(solver.center_temperature(), 1200.0);
}
