//! Predictor-corrector stages of one projection step.
//!
//! Both stages share one shape:
//!
//! 1. advective term (`conv_old` from `vel_old` at `t`, or `conv` from
//!    the predicted `vel` at `t + dt`)
//! 2. derived quantities, then `eta` ghosts
//! 3. explicit update: `vel += dt conv_old` (predictor) or
//!    `vel = vel_old + dt/2 (conv + conv_old)` (corrector), then gravity
//! 4. lagged pressure gradient applied to momentum:
//!    `vel = (rho vel - dt (gp + gp0)) / rho`
//! 5. velocity ghosts at `t + dt`
//! 6. implicit diffusion
//! 7. projection with `scale = dt`
//! 8. velocity ghosts at `t + dt`
//!
//! Each step runs across every level before the next starts.

use std::time::Instant;

use eddy_arena::LevelState;
use eddy_core::{LevelField, LevelId, PhysicsConfig, SolverError, Stage, StepError};
use eddy_operator::{OperatorSet, ProjectionFields, SolveStats};

fn solver_error(stage: Stage, level: usize) -> impl Fn(SolverError) -> StepError {
    move |source| StepError::Solver {
        stage,
        level: LevelId::from(level),
        source,
    }
}

/// Which explicit update a stage applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StageKind {
    Predictor,
    Corrector,
}

/// What one stage did.
#[derive(Clone, Debug, PartialEq)]
pub struct StageReport {
    /// Which stage ran.
    pub stage: Stage,
    /// Diffusion solve statistics, merged over levels.
    pub diffusion: SolveStats,
    /// Projection statistics, merged over levels.
    pub projection: SolveStats,
    /// Wall-clock time of the stage, in microseconds.
    pub elapsed_us: u64,
}

/// Runs predictor and corrector stages with one set of collaborators.
///
/// Borrows the collaborators and constants for as long as it lives; the
/// levels are borrowed per call.
#[derive(Clone, Copy, Debug)]
pub struct PredictorCorrector<'a> {
    ops: &'a OperatorSet,
    physics: &'a PhysicsConfig,
}

impl<'a> PredictorCorrector<'a> {
    /// Bind collaborators and physical constants.
    pub fn new(ops: &'a OperatorSet, physics: &'a PhysicsConfig) -> Self {
        Self { ops, physics }
    }

    /// Refresh velocity ghosts at `time`.
    pub fn fill_velocity_bc(&self, levels: &mut [LevelState], time: f64) {
        for level in levels.iter_mut() {
            let grid = *level.grid();
            self.ops.boundary.fill(&grid, &mut level.vel, time, false);
        }
    }

    /// Refresh density and viscosity ghosts at `time`, extrapolating at
    /// faces that would otherwise impose a value.
    pub fn fill_scalar_bc(&self, levels: &mut [LevelState], time: f64) {
        for level in levels.iter_mut() {
            let grid = *level.grid();
            self.ops.boundary.fill(&grid, &mut level.ro, time, true);
            self.ops.boundary.fill(&grid, &mut level.eta, time, true);
        }
    }

    /// Project the initial velocity with `scale = 1` and discard the
    /// resulting pressure.
    ///
    /// Leaves `p` and `gp` at zero and velocity ghosts filled at `time`.
    pub fn initial_projection(
        &self,
        levels: &mut [LevelState],
        time: f64,
    ) -> Result<SolveStats, StepError> {
        let stage = Stage::InitialProjection;
        self.fill_scalar_bc(levels, time);
        self.fill_velocity_bc(levels, time);
        self.update_derived(levels, time, stage)?;

        let mut stats = SolveStats::default();
        for (i, level) in levels.iter_mut().enumerate() {
            let grid = *level.grid();
            let s = self
                .ops
                .projection
                .project(&grid, ProjectionFields::of(level), time, 1.0)
                .map_err(solver_error(stage, i))?;
            stats = stats.merge(s);
            level.reset_pressure();
        }
        self.fill_velocity_bc(levels, time);
        Ok(stats)
    }

    /// First stage: advance from `cur_time` to `cur_time + dt` using the
    /// advective term of `vel_old`.
    pub fn apply_predictor(
        &self,
        levels: &mut [LevelState],
        cur_time: f64,
        dt: f64,
    ) -> Result<StageReport, StepError> {
        self.run(levels, cur_time, dt, StageKind::Predictor, Stage::Predictor)
    }

    /// Second stage: redo the step from `vel_old` with the trapezoidal
    /// average of the old and predicted advective terms.
    pub fn apply_corrector(
        &self,
        levels: &mut [LevelState],
        cur_time: f64,
        dt: f64,
    ) -> Result<StageReport, StepError> {
        self.run(levels, cur_time, dt, StageKind::Corrector, Stage::Corrector)
    }

    /// Predictor pass reported under [`Stage::InitialIteration`].
    pub(crate) fn initial_iteration(
        &self,
        levels: &mut [LevelState],
        cur_time: f64,
        dt: f64,
    ) -> Result<StageReport, StepError> {
        self.run(
            levels,
            cur_time,
            dt,
            StageKind::Predictor,
            Stage::InitialIteration,
        )
    }

    /// Reject NaN or infinite velocity, pressure or pressure gradient.
    pub fn check_finite(levels: &[LevelState]) -> Result<(), StepError> {
        for (i, level) in levels.iter().enumerate() {
            for field in [
                LevelField::Velocity,
                LevelField::Pressure,
                LevelField::PressureGradient,
            ] {
                if let Some((_, cell)) = level.field(field).first_non_finite() {
                    return Err(StepError::NonFinite {
                        level: LevelId::from(i),
                        field,
                        cell: Some(cell),
                    });
                }
            }
        }
        Ok(())
    }

    fn update_derived(
        &self,
        levels: &mut [LevelState],
        time: f64,
        stage: Stage,
    ) -> Result<(), StepError> {
        for (i, level) in levels.iter_mut().enumerate() {
            self.ops
                .derived
                .update(level)
                .map_err(solver_error(stage, i))?;
            let grid = *level.grid();
            self.ops.boundary.fill(&grid, &mut level.eta, time, true);
        }
        Ok(())
    }

    fn run(
        &self,
        levels: &mut [LevelState],
        cur_time: f64,
        dt: f64,
        kind: StageKind,
        stage: Stage,
    ) -> Result<StageReport, StepError> {
        let start = Instant::now();
        let new_time = cur_time + dt;
        let ops = self.ops;

        // 1. Advective term.
        for (i, level) in levels.iter_mut().enumerate() {
            let grid = *level.grid();
            match kind {
                StageKind::Predictor => {
                    ops.convection
                        .compute(&grid, &level.vel_old, cur_time, &mut level.conv_old)
                }
                StageKind::Corrector => {
                    ops.convection
                        .compute(&grid, &level.vel, new_time, &mut level.conv)
                }
            }
            .map_err(solver_error(stage, i))?;
        }

        // 2. Transport properties of the state the term was taken from.
        let derived_time = match kind {
            StageKind::Predictor => cur_time,
            StageKind::Corrector => new_time,
        };
        self.update_derived(levels, derived_time, stage)?;

        // 3-4. Explicit forcing.
        let PhysicsConfig { gravity, gp0, .. } = *self.physics;
        for level in levels.iter_mut() {
            match kind {
                StageKind::Predictor => level.vel.axpy(dt, &level.conv_old),
                StageKind::Corrector => {
                    level.vel.copy_from(&level.vel_old);
                    level.vel.axpy(0.5 * dt, &level.conv);
                    level.vel.axpy(0.5 * dt, &level.conv_old);
                }
            }
            for (d, g) in gravity.iter().enumerate() {
                level.vel.add_constant(d, dt * g);
            }
            level.vel.scale_by(&level.ro);
            level.vel.axpy(-dt, &level.gp);
            for (d, g) in gp0.iter().enumerate() {
                level.vel.add_constant(d, -dt * g);
            }
            level.vel.divide_by(&level.ro);
        }

        // 5.
        self.fill_velocity_bc(levels, new_time);

        // 6. Implicit diffusion.
        let mut diffusion = SolveStats::default();
        for (i, level) in levels.iter_mut().enumerate() {
            let grid = *level.grid();
            let s = ops
                .diffusion
                .solve(&grid, &mut level.vel, &level.ro, &level.eta, dt)
                .map_err(solver_error(stage, i))?;
            diffusion = diffusion.merge(s);
        }

        // 7. Projection.
        let mut projection = SolveStats::default();
        for (i, level) in levels.iter_mut().enumerate() {
            let grid = *level.grid();
            let s = ops
                .projection
                .project(&grid, ProjectionFields::of(level), new_time, dt)
                .map_err(solver_error(stage, i))?;
            projection = projection.merge(s);
        }

        // 8.
        self.fill_velocity_bc(levels, new_time);

        let elapsed_us = start.elapsed().as_micros() as u64;
        log::debug!(
            "{stage}: diffusion {} iterations, projection {} iterations, {elapsed_us} us",
            diffusion.iterations,
            projection.iterations
        );
        Ok(StageReport {
            stage,
            diffusion,
            projection,
            elapsed_us,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_arena::LevelArena;
    use eddy_test_utils::{
        periodic_grid, recording_operators, uniform_flow, CallLog, FailingDiffusion,
        RecordingBoundary, RecordingConvection, RecordingDerived, RecordingProjection,
    };

    fn arena(vel: [f64; 3], ro: f64) -> LevelArena {
        uniform_flow(periodic_grid(4, 1.0), vel, ro, 0.1)
    }

    fn constant_conv_ops(log: &CallLog, conv: [f64; 3]) -> OperatorSet {
        OperatorSet::new(
            RecordingBoundary::new(log.clone()),
            RecordingConvection::new(log.clone()).with_value(conv),
            eddy_test_utils::RecordingDiffusion::new(log.clone()),
            RecordingProjection::new(log.clone()),
            RecordingDerived::new(log.clone(), 0.1),
        )
    }

    #[test]
    fn predictor_calls_collaborators_in_order() {
        let log = CallLog::new();
        let ops = recording_operators(&log, 0.1);
        let physics = PhysicsConfig::default();
        let mut levels = arena([1.0, 0.0, 0.0], 1.0);
        PredictorCorrector::new(&ops, &physics)
            .apply_predictor(levels.levels_mut(), 0.5, 0.1)
            .unwrap();
        assert_eq!(
            log.ops_without_fills(),
            ["convection", "derived", "diffusion", "projection"]
        );
        let conv = &log.calls_to("convection")[0];
        assert_eq!(conv.time, Some(0.5));
        let proj = &log.calls_to("projection")[0];
        assert_eq!(proj.time, Some(0.6));
        assert_eq!(proj.arg, Some(0.1));
        assert_eq!(log.calls_to("diffusion")[0].arg, Some(0.1));
    }

    #[test]
    fn corrector_averages_advective_terms() {
        let log = CallLog::new();
        let physics = PhysicsConfig::default();
        let mut levels = arena([1.0, 0.0, 0.0], 1.0);
        levels.levels_mut()[0].save_velocity();

        let ops = constant_conv_ops(&log, [2.0, 0.0, 0.0]);
        let pc = PredictorCorrector::new(&ops, &physics);
        pc.apply_predictor(levels.levels_mut(), 0.0, 0.25).unwrap();
        assert_eq!(levels.levels()[0].vel.get(0, [1, 1, 1]), 1.5);

        // A different term in the corrector: the result uses the average.
        let ops = constant_conv_ops(&log, [4.0, 0.0, 0.0]);
        let pc = PredictorCorrector::new(&ops, &physics);
        pc.apply_corrector(levels.levels_mut(), 0.0, 0.25).unwrap();
        // 1 + 0.125 * 4 + 0.125 * 2
        assert_eq!(levels.levels()[0].vel.get(0, [2, 0, 3]), 1.75);
        let corr = log.calls_to("convection");
        assert_eq!(corr.last().unwrap().time, Some(0.25));
    }

    #[test]
    fn pressure_gradient_acts_on_momentum() {
        let log = CallLog::new();
        let ops = recording_operators(&log, 0.1);
        let physics = PhysicsConfig {
            gravity: [0.0, 0.0, -10.0],
            gp0: [4.0, 0.0, 0.0],
            ..PhysicsConfig::default()
        };
        let mut levels = arena([0.0; 3], 2.0);
        PredictorCorrector::new(&ops, &physics)
            .apply_predictor(levels.levels_mut(), 0.0, 0.5)
            .unwrap();
        let v = levels.levels()[0].vel.vector_at([0, 0, 0]);
        // -dt gp0 / rho and dt g; the lagged gp is re-absorbed by the
        // recording projection.
        assert_eq!(v, [-1.0, 0.0, -5.0]);
    }

    #[test]
    fn diffusion_failure_names_stage_and_level() {
        let log = CallLog::new();
        let ops = OperatorSet::new(
            RecordingBoundary::new(log.clone()),
            RecordingConvection::new(log.clone()),
            FailingDiffusion::new(0),
            RecordingProjection::new(log.clone()),
            RecordingDerived::new(log.clone(), 0.1),
        );
        let physics = PhysicsConfig::default();
        let mut levels = arena([1.0, 0.0, 0.0], 1.0);
        match PredictorCorrector::new(&ops, &physics).apply_corrector(levels.levels_mut(), 0.0, 0.1)
        {
            Err(StepError::Solver {
                stage: Stage::Corrector,
                level,
                source: SolverError::NotConverged { .. },
            }) => assert_eq!(level, LevelId(0)),
            other => panic!("expected corrector solver failure, got {other:?}"),
        }
        assert_eq!(log.count("projection"), 0);
    }

    #[test]
    fn initial_projection_discards_pressure() {
        let log = CallLog::new();
        let ops = recording_operators(&log, 0.1);
        let physics = PhysicsConfig::default();
        let mut levels = arena([1.0, 0.0, 0.0], 1.0);
        levels.levels_mut()[0].p.fill(3.0);
        levels.levels_mut()[0].gp.fill(1.0);
        PredictorCorrector::new(&ops, &physics)
            .initial_projection(levels.levels_mut(), 0.0)
            .unwrap();
        assert_eq!(log.calls_to("projection")[0].arg, Some(1.0));
        let level = &levels.levels()[0];
        assert_eq!(level.p.get(0, [1, 1, 1]), 0.0);
        assert_eq!(level.gp.vector_at([1, 1, 1]), [0.0; 3]);
    }

    #[test]
    fn non_finite_velocity_is_located() {
        let mut levels = arena([1.0, 0.0, 0.0], 1.0);
        levels.levels_mut()[0].vel.set(1, [2, 0, 0], f64::NAN);
        match PredictorCorrector::check_finite(levels.levels()) {
            Err(StepError::NonFinite {
                field: LevelField::Velocity,
                cell: Some(2),
                ..
            }) => {}
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }
}
