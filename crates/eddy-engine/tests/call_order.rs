//! Integration test: collaborator call order.
//!
//! Drives a simulation whose collaborators only record their calls, and
//! checks the order and arguments against the step sequence: ghost fill,
//! compute dt, predictor, corrector.

use eddy_core::PhysicsConfig;
use eddy_engine::{FlowConfig, Simulation, StepConfig};
use eddy_test_utils::{periodic_grid, recording_operators, scenario_arena, CallLog};

const STAGE: [&str; 4] = ["convection", "derived", "diffusion", "projection"];

fn simulation(log: &CallLog, stepping: StepConfig) -> Simulation {
    Simulation::new(FlowConfig {
        levels: scenario_arena(),
        operators: recording_operators(log, 0.1),
        stepping,
        physics: PhysicsConfig::default(),
    })
    .unwrap()
}

fn bare() -> StepConfig {
    StepConfig {
        max_step: Some(10),
        initial_projection: false,
        initial_iterations: 0,
        ..StepConfig::default()
    }
}

// ── One step ─────────────────────────────────────────────────────────

#[test]
fn step_runs_predictor_then_corrector() {
    let log = CallLog::new();
    let mut sim = simulation(&log, bare());
    let report = sim.advance().unwrap();
    let dt = report.dt;

    let expected: Vec<_> = STAGE.iter().chain(STAGE.iter()).copied().collect();
    assert_eq!(log.ops_without_fills(), expected);

    // Predictor term at the old time, corrector term at the new time.
    let conv = log.calls_to("convection");
    assert_eq!(conv[0].time, Some(0.0));
    assert_eq!(conv[1].time, Some(dt));

    // Both projections at the new time with scale dt.
    for call in log.calls_to("projection") {
        assert_eq!(call.time, Some(dt));
        assert_eq!(call.arg, Some(dt));
    }
    for call in log.calls_to("diffusion") {
        assert_eq!(call.arg, Some(dt));
    }
}

#[test]
fn ghosts_are_filled_before_every_stencil_read() {
    let log = CallLog::new();
    let mut sim = simulation(&log, bare());
    sim.advance().unwrap();
    let ops = log.ops();

    // Scalars and velocity are filled before the step starts.
    let first_conv = ops.iter().position(|&o| o == "convection").unwrap();
    let fills_before = ops[..first_conv]
        .iter()
        .filter(|&&o| o == "fill_physical_bc")
        .count();
    assert_eq!(fills_before, 3);

    // Every fill is a halo exchange followed by the face fill.
    for (i, &op) in ops.iter().enumerate() {
        if op == "fill_boundary" {
            assert_eq!(ops[i + 1], "fill_physical_bc");
        }
    }

    // Velocity ghosts are refreshed between the explicit update and
    // diffusion, and again after projection.
    for pair in ops.windows(2) {
        if pair[1] == "diffusion" {
            assert_eq!(pair[0], "fill_physical_bc");
        }
    }
    assert_eq!(ops.last(), Some(&"fill_physical_bc"));
}

#[test]
fn initialization_precedes_first_step() {
    let log = CallLog::new();
    let mut sim = simulation(
        &log,
        StepConfig {
            initial_projection: true,
            initial_iterations: 2,
            ..bare()
        },
    );
    sim.advance().unwrap();

    let mut expected = vec!["derived", "projection"];
    for _ in 0..2 {
        expected.extend(STAGE);
    }
    expected.extend(STAGE);
    expected.extend(STAGE);
    assert_eq!(log.ops_without_fills(), expected);

    let proj = log.calls_to("projection");
    assert_eq!(proj[0].arg, Some(1.0));
    // Initial iterations project to cur_time + dt_initial without
    // advancing the clock.
    let dt_initial = proj[1].arg.unwrap();
    assert_eq!(proj[1].time, Some(dt_initial));
    assert_eq!(proj[2].time, Some(dt_initial));
}

#[test]
fn every_level_runs_each_phase_before_the_next() {
    let log = CallLog::new();
    let mut levels = scenario_arena();
    let fine = periodic_grid(20, 1.0);
    levels.push_level(fine).unwrap();
    for level in levels.levels_mut() {
        level.ro.fill(1.0);
    }
    let mut sim = Simulation::new(FlowConfig {
        levels,
        operators: recording_operators(&log, 0.1),
        stepping: bare(),
        physics: PhysicsConfig::default(),
    })
    .unwrap();
    sim.advance().unwrap();

    let mut expected = Vec::new();
    for _ in 0..2 {
        for op in STAGE {
            expected.extend([op, op]);
        }
    }
    assert_eq!(log.ops_without_fills(), expected);
}
