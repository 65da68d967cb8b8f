//! Integration test: the regression scenario.
//!
//! Uniform density 1, viscosity 0.1 and velocity (1, 0, 0) on a periodic
//! box with spacing 0.1, `cfl = 0.5` and no forcing. The stability
//! bounds are `conv = 10`, `diff = 60`, `comb = 140`, so the first
//! adaptive step is `1 / 140`.

use eddy_core::PhysicsConfig;
use eddy_engine::{FlowConfig, Simulation, SimulationClock, StepConfig, TimeStepController};
use eddy_test_utils::{recording_operators, scenario_arena, CallLog};

const SCENARIO_DT: f64 = 1.0 / 140.0;

fn scenario(stepping: StepConfig) -> Simulation {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = CallLog::new();
    Simulation::new(FlowConfig {
        levels: scenario_arena(),
        operators: recording_operators(&log, 0.1),
        stepping,
        physics: PhysicsConfig::default(),
    })
    .unwrap()
}

#[test]
fn scenario_bounds_and_dt() {
    let arena = scenario_arena();
    let controller = TimeStepController::new(&StepConfig::default(), &PhysicsConfig::default());
    let d = controller
        .compute_dt(arena.levels(), &SimulationClock::new(), false)
        .unwrap();
    assert!((d.bounds.conv - 10.0).abs() < 1e-12);
    assert!((d.bounds.diff - 60.0).abs() < 1e-9);
    assert_eq!(d.bounds.forc, 0.0);
    assert!((d.bounds.comb - 140.0).abs() < 1e-9);
    assert!((d.dt - SCENARIO_DT).abs() < 1e-15);
    assert_eq!(d.fallback, None);
}

#[test]
fn first_step_without_initialization_uses_stable_dt() {
    let mut sim = scenario(StepConfig {
        max_step: Some(3),
        initial_projection: false,
        initial_iterations: 0,
        ..StepConfig::default()
    });
    let report = sim.advance().unwrap();
    assert!((report.dt - SCENARIO_DT).abs() < 1e-15);
    assert!(!report.decision.growth_limited);
}

#[test]
fn initial_iterations_limit_first_step_growth() {
    let mut sim = scenario(StepConfig {
        max_step: Some(3),
        ..StepConfig::default()
    });
    sim.initialize().unwrap();
    let initial = sim.clock().previous_dt().unwrap();
    assert!((initial - 0.1 * SCENARIO_DT).abs() < 1e-15);
    assert_eq!(sim.clock().nstep(), 0);
    assert_eq!(sim.clock().cur_time(), 0.0);

    let first = sim.advance().unwrap();
    assert!(first.decision.growth_limited);
    assert!((first.dt - 1.1 * initial).abs() < 1e-15);
    let second = sim.advance().unwrap();
    assert!(second.dt <= 1.1 * first.dt * (1.0 + 1e-12));
}

#[test]
fn uniform_scenario_stays_uniform() {
    let mut sim = scenario(StepConfig {
        max_step: Some(5),
        ..StepConfig::default()
    });
    let summary = sim.evolve(|_, _| {}).unwrap();
    assert_eq!(summary.steps, 5);
    let level = &sim.levels().levels()[0];
    for cell in level.grid().iter_cells() {
        assert_eq!(level.vel.vector_at(cell), [1.0, 0.0, 0.0]);
    }
}
