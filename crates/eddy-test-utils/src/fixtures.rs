//! Mock collaborators.
//!
//! - [`RecordingBoundary`], [`RecordingConvection`], [`RecordingDerived`],
//!   [`RecordingDiffusion`], [`RecordingProjection`]: log every call to a
//!   [`CallLog`] and apply trivial, exactly predictable updates.
//! - [`FailingDiffusion`], [`FailingProjection`]: succeed N times, then
//!   fail deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};

use eddy_arena::{FieldBuffer, LevelState};
use eddy_core::SolverError;
use eddy_operator::{
    BoundaryFill, Convection, DerivedQuantities, DiffusionSolve, OperatorSet, Projection,
    ProjectionFields, SolveStats,
};
use eddy_space::Grid3;

use crate::CallLog;

/// Logs ghost fills and leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct RecordingBoundary {
    pub log: CallLog,
}

impl RecordingBoundary {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl BoundaryFill for RecordingBoundary {
    fn name(&self) -> &str {
        "recording_boundary"
    }

    fn fill_boundary(&self, _grid: &Grid3, _field: &mut FieldBuffer) {
        self.log.record("fill_boundary", None, None);
    }

    fn fill_physical_bc(&self, _grid: &Grid3, _field: &mut FieldBuffer, time: f64, _extrap: bool) {
        self.log.record("fill_physical_bc", Some(time), None);
    }
}

/// Writes a constant advective term.
#[derive(Clone, Debug, Default)]
pub struct RecordingConvection {
    pub log: CallLog,
    pub value: [f64; 3],
}

impl RecordingConvection {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            value: [0.0; 3],
        }
    }

    /// Use `value` as the advective term in every cell.
    pub fn with_value(mut self, value: [f64; 3]) -> Self {
        self.value = value;
        self
    }
}

impl Convection for RecordingConvection {
    fn name(&self) -> &str {
        "recording_convection"
    }

    fn compute(
        &self,
        grid: &Grid3,
        _vel: &FieldBuffer,
        time: f64,
        out: &mut FieldBuffer,
    ) -> Result<(), SolverError> {
        self.log.record("convection", Some(time), None);
        for cell in grid.iter_cells() {
            for (c, &v) in self.value.iter().enumerate().take(out.components()) {
                out.set(c, cell, v);
            }
        }
        Ok(())
    }
}

/// Sets the viscosity to a constant.
#[derive(Clone, Debug)]
pub struct RecordingDerived {
    pub log: CallLog,
    pub eta: f64,
}

impl RecordingDerived {
    pub fn new(log: CallLog, eta: f64) -> Self {
        Self { log, eta }
    }
}

impl DerivedQuantities for RecordingDerived {
    fn name(&self) -> &str {
        "recording_derived"
    }

    fn update(&self, level: &mut LevelState) -> Result<(), SolverError> {
        self.log.record("derived", None, None);
        level.eta.fill_component(0, self.eta);
        Ok(())
    }
}

/// Logs `dt` and leaves the velocity untouched.
#[derive(Clone, Debug, Default)]
pub struct RecordingDiffusion {
    pub log: CallLog,
}

impl RecordingDiffusion {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl DiffusionSolve for RecordingDiffusion {
    fn name(&self) -> &str {
        "recording_diffusion"
    }

    fn solve(
        &self,
        _grid: &Grid3,
        _vel: &mut FieldBuffer,
        _ro: &FieldBuffer,
        _eta: &FieldBuffer,
        dt: f64,
    ) -> Result<SolveStats, SolverError> {
        self.log.record("diffusion", None, Some(dt));
        Ok(SolveStats {
            iterations: 1,
            residual: 0.0,
        })
    }
}

/// Logs `time` and `scale`; adds back the lagged gradient and leaves
/// `p` and `gp` unchanged.
///
/// With a constant `gp` this is the exact projection of a field whose
/// only compressive part is the lagged gradient term.
#[derive(Clone, Debug, Default)]
pub struct RecordingProjection {
    pub log: CallLog,
}

impl RecordingProjection {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl Projection for RecordingProjection {
    fn name(&self) -> &str {
        "recording_projection"
    }

    fn project(
        &self,
        _grid: &Grid3,
        fields: ProjectionFields<'_>,
        time: f64,
        scale: f64,
    ) -> Result<SolveStats, SolverError> {
        self.log.record("projection", Some(time), Some(scale));
        let mut lagged = fields.gp.clone();
        lagged.divide_by(fields.ro);
        fields.vel.axpy(scale, &lagged);
        Ok(SolveStats {
            iterations: 2,
            residual: 0.0,
        })
    }
}

/// Bundle the five recording mocks around one log.
///
/// The convective term is zero and the viscosity is set to `eta`.
pub fn recording_operators(log: &CallLog, eta: f64) -> OperatorSet {
    OperatorSet::new(
        RecordingBoundary::new(log.clone()),
        RecordingConvection::new(log.clone()),
        RecordingDiffusion::new(log.clone()),
        RecordingProjection::new(log.clone()),
        RecordingDerived::new(log.clone(), eta),
    )
}

/// Diffusion solve that succeeds `succeed_count` times, then fails with
/// [`SolverError::NotConverged`].
#[derive(Debug)]
pub struct FailingDiffusion {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingDiffusion {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl DiffusionSolve for FailingDiffusion {
    fn name(&self) -> &str {
        "failing_diffusion"
    }

    fn solve(
        &self,
        _grid: &Grid3,
        _vel: &mut FieldBuffer,
        _ro: &FieldBuffer,
        _eta: &FieldBuffer,
        _dt: f64,
    ) -> Result<SolveStats, SolverError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(SolverError::NotConverged {
                solver: self.name().into(),
                iterations: 100,
                residual: 1.0,
            });
        }
        Ok(SolveStats::default())
    }
}

/// Projection that succeeds `succeed_count` times, then fails with
/// [`SolverError::Breakdown`]. Successful calls leave every field alone.
#[derive(Debug)]
pub struct FailingProjection {
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingProjection {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }
}

impl Projection for FailingProjection {
    fn name(&self) -> &str {
        "failing_projection"
    }

    fn project(
        &self,
        _grid: &Grid3,
        _fields: ProjectionFields<'_>,
        _time: f64,
        _scale: f64,
    ) -> Result<SolveStats, SolverError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(SolverError::Breakdown {
                solver: self.name().into(),
                reason: "injected failure".into(),
            });
        }
        Ok(SolveStats::default())
    }
}
