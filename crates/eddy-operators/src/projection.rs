//! Cell-centred approximate projection on fully periodic boxes.

use eddy_arena::FieldBuffer;
use eddy_core::{FieldKind, SolverError};
use eddy_operator::{Projection, ProjectionFields, SolveStats};
use eddy_space::Grid3;

use crate::ghost::fill_periodic;
use crate::krylov::{conjugate_gradient, CgConfig, LinearOperator};
use crate::stencil::{divergence, gradient, require_stencil, shift};

/// `-div(grad(phi) / rho)` with centred gradient and divergence.
///
/// Built from the same stencils used to correct the velocity, so the
/// corrected velocity's centred divergence equals the CG residual. The
/// operator is only semi-definite; the right-hand side always lies in its
/// range.
struct PressureOperator<'a> {
    grid: &'a Grid3,
    inv_ro: FieldBuffer,
    phi: FieldBuffer,
    flux: FieldBuffer,
    div: FieldBuffer,
    diag: Vec<f64>,
}

impl<'a> PressureOperator<'a> {
    fn new(grid: &'a Grid3, ro: &FieldBuffer) -> Self {
        let ghost = ro.ghost();
        let mut inv_ro = FieldBuffer::for_grid(FieldKind::Scalar, grid, ghost);
        for cell in grid.iter_cells() {
            inv_ro.set(0, cell, 1.0 / ro.get(0, cell));
        }
        fill_periodic(grid, &mut inv_ro);

        // phi_i enters the result through the gradients of its two
        // neighbours on each axis, each with weight 1 / (4 h^2 rho).
        let inv_h2 = grid.inv_cell_size().map(|ih| ih * ih);
        let diag = grid
            .iter_cells()
            .map(|cell| {
                let mut d = 0.0;
                for (axis, &w) in inv_h2.iter().enumerate() {
                    let lo = inv_ro.get(0, shift(cell, axis, -1));
                    let hi = inv_ro.get(0, shift(cell, axis, 1));
                    d += 0.25 * w * (lo + hi);
                }
                d
            })
            .collect();

        Self {
            grid,
            inv_ro,
            phi: FieldBuffer::for_grid(FieldKind::Scalar, grid, ghost),
            flux: FieldBuffer::for_grid(FieldKind::Vector3, grid, ghost),
            div: FieldBuffer::for_grid(FieldKind::Scalar, grid, ghost),
            diag,
        }
    }

    /// `flux = grad(phi) / rho` in the interior, periodic ghosts.
    fn scaled_gradient(&mut self) {
        fill_periodic(self.grid, &mut self.phi);
        gradient(self.grid, &self.phi, &mut self.flux);
        self.flux.scale_by(&self.inv_ro);
        fill_periodic(self.grid, &mut self.flux);
    }

    fn load(&mut self, x: &[f64]) {
        for (cell, &v) in self.grid.iter_cells().zip(x) {
            self.phi.set(0, cell, v);
        }
    }
}

impl LinearOperator for PressureOperator<'_> {
    fn dimension(&self) -> usize {
        self.grid.cell_count()
    }

    fn apply(&mut self, x: &[f64], y: &mut [f64]) {
        self.load(x);
        self.scaled_gradient();
        divergence(self.grid, &self.flux, &mut self.div);
        for (cell, out) in self.grid.iter_cells().zip(y.iter_mut()) {
            *out = -self.div.get(0, cell);
        }
    }

    fn diagonal(&self) -> Option<&[f64]> {
        Some(&self.diag)
    }
}

fn remove_mean(v: &mut [f64]) {
    if v.is_empty() {
        return;
    }
    let mean = v.iter().sum::<f64>() / v.len() as f64;
    v.iter_mut().for_each(|x| *x -= mean);
}

/// Projection for boxes that are periodic on every axis.
///
/// 1. `u* = u + scale * gp / rho` (undo the lagged gradient)
/// 2. solve `div(grad(phi) / rho) = div(u*)` by CG
/// 3. `u = u* - grad(phi) / rho`
/// 4. `p = phi / scale`, `gp = grad p`
///
/// Non-periodic boxes are rejected with [`SolverError::Unsupported`].
#[derive(Clone, Debug, Default)]
pub struct ApproximateProjection {
    cg: CgConfig,
}

impl ApproximateProjection {
    /// Create a projection with the given CG settings.
    pub fn new(cg: CgConfig) -> Self {
        Self { cg }
    }

    /// The CG settings.
    pub fn config(&self) -> &CgConfig {
        &self.cg
    }
}

impl Projection for ApproximateProjection {
    fn name(&self) -> &str {
        "approximate_projection"
    }

    fn project(
        &self,
        grid: &Grid3,
        fields: ProjectionFields<'_>,
        _time: f64,
        scale: f64,
    ) -> Result<SolveStats, SolverError> {
        let ProjectionFields { vel, ro, p, gp } = fields;
        require_stencil(grid, &[&*vel, ro, &*p, &*gp], self.name())?;
        if !grid.is_fully_periodic() {
            return Err(SolverError::Unsupported {
                solver: self.name().into(),
                reason: "requires periodic edges on every axis".into(),
            });
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SolverError::Unsupported {
                solver: self.name().into(),
                reason: format!("scale must be positive, got {scale}"),
            });
        }

        let mut op = PressureOperator::new(grid, ro);

        // u* = u + scale * gp / rho
        let mut lagged = gp.clone();
        lagged.scale_by(&op.inv_ro);
        vel.axpy(scale, &lagged);
        fill_periodic(grid, vel);

        divergence(grid, vel, &mut op.div);
        let mut rhs: Vec<f64> = grid.iter_cells().map(|c| -op.div.get(0, c)).collect();
        remove_mean(&mut rhs);

        let mut phi = vec![0.0; grid.cell_count()];
        let out = conjugate_gradient(&mut op, &rhs, &mut phi, &self.cg);
        log::debug!(
            "{}: {} iterations, residual {:e} (initial {:e})",
            self.name(),
            out.iterations,
            out.residual_norm,
            out.initial_residual_norm
        );
        if out.breakdown {
            return Err(SolverError::Breakdown {
                solver: self.name().into(),
                reason: "non-positive curvature".into(),
            });
        }
        if !out.converged {
            return Err(SolverError::NotConverged {
                solver: self.name().into(),
                iterations: out.iterations,
                residual: out.residual_norm,
            });
        }
        remove_mean(&mut phi);

        // u = u* - grad(phi) / rho
        op.load(&phi);
        op.scaled_gradient();
        vel.axpy(-1.0, &op.flux);

        // p = phi / scale, gp = grad p
        for (cell, &v) in grid.iter_cells().zip(&phi) {
            p.set(0, cell, v / scale);
        }
        fill_periodic(grid, p);
        gradient(grid, p, gp);

        Ok(SolveStats {
            iterations: out.iterations,
            residual: out.residual_norm,
        })
    }
}
