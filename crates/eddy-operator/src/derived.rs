//! The [`DerivedQuantities`] trait.

use eddy_arena::LevelState;
use eddy_core::SolverError;

/// Recomputes quantities derived from the current velocity: strain rate,
/// effective viscosity and any diagnostics.
///
/// Invoked once per stage before the explicit forcing is assembled.
/// `level.vel` has valid ghost cells on entry. Implementations write
/// interior values; the integrator refreshes `eta` ghosts afterwards.
pub trait DerivedQuantities: Send + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Update the derived fields of `level`.
    fn update(&self, level: &mut LevelState) -> Result<(), SolverError>;
}
