//! Strain rate, effective viscosity and flow diagnostics.

use eddy_arena::LevelState;
use eddy_core::{FieldKind, FluidModel, SolverError};
use eddy_operator::DerivedQuantities;

use crate::stencil::velocity_gradient;

/// Name of the vorticity-magnitude diagnostic.
pub const VORTICITY: &str = "vorticity";
/// Name of the velocity-divergence diagnostic.
pub const DIVERGENCE: &str = "divu";

/// `sqrt(2 S:S)` from a velocity gradient `g[a][b] = d u_a / d x_b`.
pub fn strain_rate(g: &[[f64; 3]; 3]) -> f64 {
    let diag = 2.0 * (g[0][0] * g[0][0] + g[1][1] * g[1][1] + g[2][2] * g[2][2]);
    let xy = g[0][1] + g[1][0];
    let yz = g[1][2] + g[2][1];
    let zx = g[2][0] + g[0][2];
    (diag + xy * xy + yz * yz + zx * zx).sqrt()
}

/// Magnitude of `curl u`.
pub fn vorticity(g: &[[f64; 3]; 3]) -> f64 {
    let wx = g[2][1] - g[1][2];
    let wy = g[0][2] - g[2][0];
    let wz = g[1][0] - g[0][1];
    (wx * wx + wy * wy + wz * wz).sqrt()
}

/// Recomputes `strain_rate` and `eta` from the velocity and a
/// [`FluidModel`], and records the `vorticity` and `divu` diagnostics.
#[derive(Clone, Copy, Debug, Default)]
pub struct RheologyUpdate {
    model: FluidModel,
}

impl RheologyUpdate {
    /// Create an update for `model`.
    pub fn new(model: FluidModel) -> Self {
        Self { model }
    }

    /// The constitutive model.
    pub fn model(&self) -> &FluidModel {
        &self.model
    }
}

impl From<FluidModel> for RheologyUpdate {
    fn from(model: FluidModel) -> Self {
        Self::new(model)
    }
}

impl DerivedQuantities for RheologyUpdate {
    fn name(&self) -> &str {
        "rheology_update"
    }

    fn update(&self, level: &mut LevelState) -> Result<(), SolverError> {
        let grid = *level.grid();
        if level.ghost() == 0 {
            return Err(SolverError::ShapeMismatch {
                reason: format!("{}: needs at least one ghost layer", self.name()),
            });
        }
        let inv_h = grid.inv_cell_size();

        let mut curl = Vec::with_capacity(grid.cell_count());
        let mut div = Vec::with_capacity(grid.cell_count());
        for cell in grid.iter_cells() {
            let g = velocity_gradient(&level.vel, cell, inv_h);
            let sr = strain_rate(&g);
            level.strain_rate.set(0, cell, sr);
            level.eta.set(0, cell, self.model.viscosity(sr));
            curl.push(vorticity(&g));
            div.push(g[0][0] + g[1][1] + g[2][2]);
        }

        let out = level.diagnostic_mut(VORTICITY, FieldKind::Scalar);
        for (cell, v) in grid.iter_cells().zip(curl) {
            out.set(0, cell, v);
        }
        let out = level.diagnostic_mut(DIVERGENCE, FieldKind::Scalar);
        for (cell, v) in grid.iter_cells().zip(div) {
            out.set(0, cell, v);
        }
        Ok(())
    }
}
