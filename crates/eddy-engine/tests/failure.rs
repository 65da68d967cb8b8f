//! Integration test: failure propagation.
//!
//! A collaborator failure or a non-finite value ends the step with an
//! error naming the stage and level. The clock must not advance.

use eddy_core::{LevelField, LevelId, PhysicsConfig, SolverError, Stage, StepError};
use eddy_engine::{FlowConfig, Simulation, StepConfig};
use eddy_operator::OperatorSet;
use eddy_test_utils::{
    recording_operators, scenario_arena, CallLog, FailingDiffusion, FailingProjection,
    RecordingBoundary, RecordingConvection, RecordingDerived, RecordingDiffusion,
    RecordingProjection,
};

fn simulation(operators: OperatorSet, stepping: StepConfig) -> Simulation {
    Simulation::new(FlowConfig {
        levels: scenario_arena(),
        operators,
        stepping,
        physics: PhysicsConfig::default(),
    })
    .unwrap()
}

fn stepping(initial_iterations: u32) -> StepConfig {
    StepConfig {
        max_step: Some(10),
        initial_projection: false,
        initial_iterations,
        ..StepConfig::default()
    }
}

fn with_diffusion(log: &CallLog, diffusion: FailingDiffusion) -> OperatorSet {
    let mut ops = recording_operators(log, 0.1);
    ops.diffusion = Box::new(diffusion);
    ops
}

#[test]
fn predictor_failure_is_reported_without_retry() {
    let log = CallLog::new();
    let mut sim = simulation(with_diffusion(&log, FailingDiffusion::new(0)), stepping(0));
    match sim.advance() {
        Err(StepError::Solver {
            stage: Stage::Predictor,
            level: LevelId(0),
            source: SolverError::NotConverged { solver, .. },
        }) => assert_eq!(solver, "failing_diffusion"),
        other => panic!("expected predictor NotConverged, got {other:?}"),
    }
    // The stage stopped at diffusion; no projection, no corrector.
    assert_eq!(log.count("projection"), 0);
    assert_eq!(log.count("convection"), 1);
    assert_eq!(sim.clock().nstep(), 0);
    assert_eq!(sim.clock().cur_time(), 0.0);
    assert_eq!(sim.clock().previous_dt(), None);
}

#[test]
fn failure_after_good_steps_keeps_last_good_clock() {
    let log = CallLog::new();
    // Two diffusion solves per step: two good steps, then the predictor
    // of the third fails.
    let mut sim = simulation(with_diffusion(&log, FailingDiffusion::new(4)), stepping(0));
    sim.advance().unwrap();
    let second = sim.advance().unwrap();
    let before = sim.clock().clone();
    assert!(sim.advance().is_err());
    assert_eq!(sim.clock(), &before);
    assert_eq!(sim.clock().nstep(), 2);
    assert_eq!(sim.clock().cur_time(), second.time);
    assert_eq!(sim.clock().previous_dt(), Some(second.dt));
}

#[test]
fn initial_iteration_failure_names_its_stage() {
    let log = CallLog::new();
    let mut ops = recording_operators(&log, 0.1);
    ops.projection = Box::new(FailingProjection::new(1));
    let mut sim = simulation(ops, stepping(3));
    match sim.initialize() {
        Err(StepError::Solver {
            stage: Stage::InitialIteration,
            source: SolverError::Breakdown { .. },
            ..
        }) => {}
        other => panic!("expected initial iteration Breakdown, got {other:?}"),
    }
}

#[test]
fn non_finite_velocity_fails_the_step() {
    let log = CallLog::new();
    let ops = OperatorSet::new(
        RecordingBoundary::new(log.clone()),
        RecordingConvection::new(log.clone()).with_value([0.0, f64::NAN, 0.0]),
        RecordingDiffusion::new(log.clone()),
        RecordingProjection::new(log.clone()),
        RecordingDerived::new(log.clone(), 0.1),
    );
    let mut sim = simulation(ops, stepping(0));
    match sim.advance() {
        Err(StepError::NonFinite {
            level: LevelId(0),
            field: LevelField::Velocity,
            cell: Some(0),
        }) => {}
        other => panic!("expected NonFinite velocity, got {other:?}"),
    }
    // Both stages ran; the check follows the corrector.
    assert_eq!(log.count("projection"), 2);
    assert_eq!(sim.clock().nstep(), 0);
    let err = sim.advance().unwrap_err();
    assert!(err.to_string().starts_with("non-finite vel on level 0"), "{err}");
}
