//! Error types for the eddy flow solver.
//!
//! Organized by subsystem: collaborator solves ([`SolverError`]) and the
//! step driver ([`StepError`]). Configuration errors live next to the
//! configuration types they describe.

use std::error::Error;
use std::fmt;

use crate::field::LevelField;
use crate::id::LevelId;

/// The part of the step sequence in which a failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The projection applied to the initial condition before stepping.
    InitialProjection,
    /// One of the pressure-settling iterations run before the first step.
    InitialIteration,
    /// The predictor stage of a step.
    Predictor,
    /// The corrector stage of a step.
    Corrector,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialProjection => write!(f, "initial projection"),
            Self::InitialIteration => write!(f, "initial iteration"),
            Self::Predictor => write!(f, "predictor"),
            Self::Corrector => write!(f, "corrector"),
        }
    }
}

/// Errors reported by a collaborator operator (convection, diffusion,
/// projection, derived quantities).
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    /// An iterative solve ran out of iterations before reaching tolerance.
    NotConverged {
        /// Name of the solver.
        solver: String,
        /// Iterations performed.
        iterations: usize,
        /// Residual norm when the solve gave up.
        residual: f64,
    },
    /// The iteration broke down (for example a non-positive curvature
    /// in conjugate gradient).
    Breakdown {
        /// Name of the solver.
        solver: String,
        /// What went wrong.
        reason: String,
    },
    /// The operator cannot handle this grid or boundary configuration.
    Unsupported {
        /// Name of the solver.
        solver: String,
        /// Which configuration is unsupported.
        reason: String,
    },
    /// Field shapes do not agree with each other or with the grid.
    ShapeMismatch {
        /// Description of the mismatch.
        reason: String,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConverged {
                solver,
                iterations,
                residual,
            } => write!(
                f,
                "{solver} did not converge after {iterations} iterations (residual {residual:e})"
            ),
            Self::Breakdown { solver, reason } => write!(f, "{solver} broke down: {reason}"),
            Self::Unsupported { solver, reason } => write!(f, "{solver} unsupported: {reason}"),
            Self::ShapeMismatch { reason } => write!(f, "shape mismatch: {reason}"),
        }
    }
}

impl Error for SolverError {}

/// Errors from the step driver.
///
/// A failed step leaves the clock where it was. The field state may be
/// partially updated and should not be checkpointed.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// A collaborator failed. There is no retry.
    Solver {
        /// Stage that invoked the collaborator.
        stage: Stage,
        /// Level the collaborator was working on.
        level: LevelId,
        /// The collaborator's error.
        source: SolverError,
    },
    /// A NaN or infinity was found in a field after the corrector.
    NonFinite {
        /// Level holding the value.
        level: LevelId,
        /// Field holding the value.
        field: LevelField,
        /// Linear interior cell index of the first offending value.
        cell: Option<usize>,
    },
    /// The level arena holds no levels.
    NoLevels,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solver {
                stage,
                level,
                source,
            } => write!(f, "{stage} failed on level {level}: {source}"),
            Self::NonFinite { level, field, cell } => match cell {
                Some(c) => write!(f, "non-finite {field} on level {level} at cell {c}"),
                None => write!(f, "non-finite {field} on level {level}"),
            },
            Self::NoLevels => write!(f, "no levels allocated"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Solver { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_failure_chains_source() {
        let err = StepError::Solver {
            stage: Stage::Corrector,
            level: LevelId(1),
            source: SolverError::NotConverged {
                solver: "projection".into(),
                iterations: 1000,
                residual: 1e-3,
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("corrector failed on level 1"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn non_finite_names_field_and_cell() {
        let err = StepError::NonFinite {
            level: LevelId(0),
            field: LevelField::Velocity,
            cell: Some(7),
        };
        assert_eq!(err.to_string(), "non-finite vel on level 0 at cell 7");
        assert!(err.source().is_none());
    }
}
