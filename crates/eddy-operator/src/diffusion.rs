//! The [`DiffusionSolve`] trait.

use eddy_arena::FieldBuffer;
use eddy_core::SolverError;
use eddy_space::Grid3;

/// Iteration statistics reported by an implicit solve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SolveStats {
    /// Iterations performed, summed over components where applicable.
    pub iterations: usize,
    /// Final residual norm; the largest over components.
    pub residual: f64,
}

impl SolveStats {
    /// Combine the statistics of two solves.
    pub fn merge(self, other: SolveStats) -> SolveStats {
        SolveStats {
            iterations: self.iterations + other.iterations,
            residual: self.residual.max(other.residual),
        }
    }
}

/// Implicit viscous update.
///
/// Solves `rho * u - dt * div(eta grad u) = rho * u_rhs` in place, with
/// `vel` holding `u_rhs` on entry and `u` on exit. Assumed stable for any
/// `dt > 0`; a failed solve is reported, never retried.
pub trait DiffusionSolve: Send + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Solve for the new velocity.
    fn solve(
        &self,
        grid: &Grid3,
        vel: &mut FieldBuffer,
        ro: &FieldBuffer,
        eta: &FieldBuffer,
        dt: f64,
    ) -> Result<SolveStats, SolverError>;
}
