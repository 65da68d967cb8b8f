//! The [`Convection`] trait.

use eddy_arena::FieldBuffer;
use eddy_core::SolverError;
use eddy_space::Grid3;

/// Produces the explicit advective term `-(u.grad)u`.
///
/// `vel` has valid ghost cells on entry. Implementations write every
/// interior cell of `out` and may leave its ghosts untouched.
pub trait Convection: Send + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Evaluate the advective term of `vel` at `time` into `out`.
    fn compute(
        &self,
        grid: &Grid3,
        vel: &FieldBuffer,
        time: f64,
        out: &mut FieldBuffer,
    ) -> Result<(), SolverError>;
}
