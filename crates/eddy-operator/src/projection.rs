//! The [`Projection`] trait and its split-borrow field view.

use eddy_arena::{FieldBuffer, LevelState};
use eddy_core::SolverError;
use eddy_space::Grid3;

use crate::diffusion::SolveStats;

/// The fields a projection reads and writes, borrowed disjointly from one
/// level.
pub struct ProjectionFields<'a> {
    /// Velocity to project, overwritten with the projected velocity.
    pub vel: &'a mut FieldBuffer,
    /// Density.
    pub ro: &'a FieldBuffer,
    /// Pressure, overwritten.
    pub p: &'a mut FieldBuffer,
    /// Pressure gradient, read as the lagged gradient and overwritten.
    pub gp: &'a mut FieldBuffer,
}

impl<'a> ProjectionFields<'a> {
    /// Borrow the projection fields of `level`.
    pub fn of(level: &'a mut LevelState) -> Self {
        Self {
            vel: &mut level.vel,
            ro: &level.ro,
            p: &mut level.p,
            gp: &mut level.gp,
        }
    }
}

/// Elliptic pressure projection.
///
/// The velocity handed in has had `-scale * gp / rho` applied by the
/// integrator. An implementation adds that lagged term back, solves
/// `div(grad(phi) / rho) = div(u*)`, and leaves:
///
/// - `vel = u* - grad(phi) / rho`, divergence-free to solver tolerance;
/// - `p = phi / scale`;
/// - `gp = grad p`.
///
/// `scale` is used exactly as given. Failure is reported, never retried.
pub trait Projection: Send + 'static {
    /// Human-readable name for logs and errors.
    fn name(&self) -> &str;

    /// Project `fields.vel` at `time`.
    fn project(
        &self,
        grid: &Grid3,
        fields: ProjectionFields<'_>,
        time: f64,
        scale: f64,
    ) -> Result<SolveStats, SolverError>;
}
