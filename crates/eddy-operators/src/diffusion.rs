//! Implicit viscous update by conjugate gradient.

use eddy_arena::FieldBuffer;
use eddy_core::{FieldKind, SolverError};
use eddy_operator::{DiffusionSolve, SolveStats};
use eddy_space::Grid3;

use crate::ghost::{fill_faces, fill_periodic};
use crate::krylov::{conjugate_gradient, CgConfig, LinearOperator};
use crate::stencil::{require_stencil, shift};

/// `A u = rho u - dt div(eta grad u)` on one velocity component, compact
/// 7-point stencil with arithmetic face averages of `eta`.
///
/// Ghost cells of the iterate are refilled with the homogeneous version
/// of the level's boundary conditions before every application, which
/// keeps the operator symmetric.
struct HelmholtzOperator<'a> {
    grid: &'a Grid3,
    ro: &'a FieldBuffer,
    eta: &'a FieldBuffer,
    dt: f64,
    work: FieldBuffer,
    diag: Vec<f64>,
}

impl<'a> HelmholtzOperator<'a> {
    fn new(grid: &'a Grid3, ro: &'a FieldBuffer, eta: &'a FieldBuffer, dt: f64) -> Self {
        let inv_h2 = grid.inv_cell_size().map(|ih| ih * ih);
        let diag = grid
            .iter_cells()
            .map(|cell| {
                let e = eta.get(0, cell);
                let mut d = ro.get(0, cell);
                for (axis, &w) in inv_h2.iter().enumerate() {
                    for side in [-1, 1] {
                        let face = 0.5 * (e + eta.get(0, shift(cell, axis, side)));
                        d += dt * face * w;
                    }
                }
                d
            })
            .collect();
        Self {
            grid,
            ro,
            eta,
            dt,
            work: FieldBuffer::for_grid(FieldKind::Scalar, grid, ro.ghost()),
            diag,
        }
    }
}

impl LinearOperator for HelmholtzOperator<'_> {
    fn dimension(&self) -> usize {
        self.grid.cell_count()
    }

    fn apply(&mut self, x: &[f64], y: &mut [f64]) {
        for (cell, &v) in self.grid.iter_cells().zip(x) {
            self.work.set(0, cell, v);
        }
        fill_periodic(self.grid, &mut self.work);
        fill_faces(self.grid, &mut self.work, false);

        let inv_h2 = self.grid.inv_cell_size().map(|ih| ih * ih);
        for (cell, out) in self.grid.iter_cells().zip(y.iter_mut()) {
            let u = self.work.get(0, cell);
            let e = self.eta.get(0, cell);
            let mut flux = 0.0;
            for (axis, &w) in inv_h2.iter().enumerate() {
                for side in [-1, 1] {
                    let nb = shift(cell, axis, side);
                    let face = 0.5 * (e + self.eta.get(0, nb));
                    flux += face * w * (self.work.get(0, nb) - u);
                }
            }
            *out = self.ro.get(0, cell) * u - self.dt * flux;
        }
    }

    fn diagonal(&self) -> Option<&[f64]> {
        Some(&self.diag)
    }
}

/// Backward-Euler viscous solve, one CG solve per velocity component.
///
/// Reads `eta` and `ro` ghost cells for face averages; the integrator
/// refreshes both before calling.
#[derive(Clone, Debug, Default)]
pub struct ImplicitDiffusion {
    cg: CgConfig,
}

impl ImplicitDiffusion {
    /// Create a solver with the given CG settings.
    pub fn new(cg: CgConfig) -> Self {
        Self { cg }
    }

    /// The CG settings.
    pub fn config(&self) -> &CgConfig {
        &self.cg
    }
}

impl DiffusionSolve for ImplicitDiffusion {
    fn name(&self) -> &str {
        "implicit_diffusion"
    }

    fn solve(
        &self,
        grid: &Grid3,
        vel: &mut FieldBuffer,
        ro: &FieldBuffer,
        eta: &FieldBuffer,
        dt: f64,
    ) -> Result<SolveStats, SolverError> {
        require_stencil(grid, &[&*vel, ro, eta], self.name())?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SolverError::Unsupported {
                solver: self.name().into(),
                reason: format!("dt must be positive, got {dt}"),
            });
        }

        let mut op = HelmholtzOperator::new(grid, ro, eta, dt);
        let mut stats = SolveStats::default();
        for c in 0..vel.components() {
            let mut x: Vec<f64> = grid.iter_cells().map(|cell| vel.get(c, cell)).collect();
            let b: Vec<f64> = grid
                .iter_cells()
                .zip(&x)
                .map(|(cell, &u)| ro.get(0, cell) * u)
                .collect();
            let out = conjugate_gradient(&mut op, &b, &mut x, &self.cg);
            log::debug!(
                "{} component {c}: {} iterations, residual {:e}",
                self.name(),
                out.iterations,
                out.residual_norm
            );
            if out.breakdown {
                return Err(SolverError::Breakdown {
                    solver: self.name().into(),
                    reason: format!("non-positive curvature on component {c}"),
                });
            }
            if !out.converged {
                return Err(SolverError::NotConverged {
                    solver: self.name().into(),
                    iterations: out.iterations,
                    residual: out.residual_norm,
                });
            }
            for (cell, &v) in grid.iter_cells().zip(&x) {
                vel.set(c, cell, v);
            }
            stats = stats.merge(SolveStats {
                iterations: out.iterations,
                residual: out.residual_norm,
            });
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::GhostFill;
    use eddy_operator::BoundaryFill;

    fn scalar(grid: &Grid3, value: f64) -> FieldBuffer {
        let mut f = FieldBuffer::for_grid(FieldKind::Scalar, grid, 1);
        f.fill(value);
        f
    }

    #[test]
    fn uniform_velocity_is_unchanged() {
        let grid = Grid3::periodic_cube(6, 1.0).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        vel.fill_component(0, 1.0);
        let stats = ImplicitDiffusion::default()
            .solve(&grid, &mut vel, &scalar(&grid, 1.0), &scalar(&grid, 0.1), 0.01)
            .unwrap();
        assert_eq!(stats.iterations, 0);
        assert!(vel.cells().all(|c| vel.get(0, c) == 1.0 && vel.get(1, c) == 0.0));
    }

    #[test]
    fn sine_mode_decays_at_discrete_rate() {
        let n = 16;
        let grid = Grid3::periodic_cube(n, 1.0).unwrap();
        let h = 1.0 / n as f64;
        let k = 2.0 * std::f64::consts::PI;
        let (mu, dt) = (0.05, 0.01);
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        for cell in grid.iter_cells() {
            let x = grid.cell_center(cell)[0];
            vel.set(1, cell, (k * x).sin());
        }
        ImplicitDiffusion::default()
            .solve(&grid, &mut vel, &scalar(&grid, 1.0), &scalar(&grid, mu), dt)
            .unwrap();
        // Discrete eigenvalue of the 3-point Laplacian for this mode.
        let lambda = 4.0 / (h * h) * (k * h / 2.0).sin().powi(2);
        let factor = 1.0 / (1.0 + dt * mu * lambda);
        for cell in grid.iter_cells() {
            let x = grid.cell_center(cell)[0];
            assert!((vel.get(1, cell) - factor * (k * x).sin()).abs() < 1e-8);
        }
    }

    #[test]
    fn clamped_walls_conserve_momentum() {
        use eddy_space::EdgeBehavior;
        let grid = Grid3::new([8, 4, 4], [0.125, 0.25, 0.25], [EdgeBehavior::Clamp; 3]).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        for cell in grid.iter_cells() {
            vel.set(2, cell, if cell[0] < 4 { 1.0 } else { 0.0 });
        }
        let ro = scalar(&grid, 1.0);
        let mut eta = scalar(&grid, 0.2);
        GhostFill.fill(&grid, &mut eta, 0.0, true);
        let before = vel.sum_abs(2, &vec![false; grid.cell_count()]);
        ImplicitDiffusion::default()
            .solve(&grid, &mut vel, &ro, &eta, 0.05)
            .unwrap();
        let total: f64 = grid.iter_cells().map(|c| vel.get(2, c)).sum();
        assert!((total - before).abs() < 1e-7);
        // Smoothing reduces the jump across the middle plane.
        assert!(vel.get(2, [3, 0, 0]) < 1.0);
        assert!(vel.get(2, [4, 0, 0]) > 0.0);
    }

    #[test]
    fn exhausted_iterations_are_reported() {
        let grid = Grid3::periodic_cube(8, 1.0).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        for cell in grid.iter_cells() {
            vel.set(0, cell, ((cell[0] * 7 + cell[1] * 3 + cell[2]) % 5) as f64);
        }
        let solver = ImplicitDiffusion::new(CgConfig {
            max_iter: 1,
            rtol: 1e-14,
            atol: 0.0,
            jacobi: false,
        });
        match solver.solve(&grid, &mut vel, &scalar(&grid, 1.0), &scalar(&grid, 1.0), 1.0) {
            Err(SolverError::NotConverged { iterations: 1, .. }) => {}
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_dt() {
        let grid = Grid3::periodic_cube(4, 1.0).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        let ro = scalar(&grid, 1.0);
        match ImplicitDiffusion::default().solve(&grid, &mut vel, &ro, &ro, 0.0) {
            Err(SolverError::Unsupported { .. }) => {}
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }
}
