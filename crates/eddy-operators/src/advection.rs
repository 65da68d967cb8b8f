//! Explicit advective term `-(u.grad)u`.

use eddy_arena::FieldBuffer;
use eddy_core::SolverError;
use eddy_operator::Convection;
use eddy_space::{Cell, Grid3};

use crate::stencil::{central_diff, require_stencil, shift};

/// Difference scheme for the advective derivative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdvectionScheme {
    /// Second-order centred differences.
    #[default]
    Centred,
    /// First-order differences taken from the upwind side of each
    /// velocity component.
    Upwind,
}

/// Non-conservative advective term with a selectable scheme.
///
/// ```
/// use eddy_operators::{AdvectionScheme, AdvectiveTerm};
/// use eddy_operator::Convection;
///
/// let term = AdvectiveTerm::new(AdvectionScheme::Upwind);
/// assert_eq!(term.scheme(), AdvectionScheme::Upwind);
/// assert_eq!(term.name(), "advective_term");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct AdvectiveTerm {
    scheme: AdvectionScheme,
}

impl AdvectiveTerm {
    /// Create a term using `scheme`.
    pub fn new(scheme: AdvectionScheme) -> Self {
        Self { scheme }
    }

    /// The difference scheme in use.
    pub fn scheme(&self) -> AdvectionScheme {
        self.scheme
    }

    /// `d vel[comp] / d x_axis`, with `u` the advecting velocity along
    /// `axis`.
    fn derivative(
        &self,
        vel: &FieldBuffer,
        comp: usize,
        cell: Cell,
        axis: usize,
        inv_h: f64,
        u: f64,
    ) -> f64 {
        match self.scheme {
            AdvectionScheme::Centred => central_diff(vel, comp, cell, axis, inv_h),
            AdvectionScheme::Upwind => {
                let here = vel.get(comp, cell);
                if u > 0.0 {
                    inv_h * (here - vel.get(comp, shift(cell, axis, -1)))
                } else {
                    inv_h * (vel.get(comp, shift(cell, axis, 1)) - here)
                }
            }
        }
    }
}

impl Convection for AdvectiveTerm {
    fn name(&self) -> &str {
        "advective_term"
    }

    fn compute(
        &self,
        grid: &Grid3,
        vel: &FieldBuffer,
        _time: f64,
        out: &mut FieldBuffer,
    ) -> Result<(), SolverError> {
        require_stencil(grid, &[vel, &*out], self.name())?;
        let inv_h = grid.inv_cell_size();
        for cell in grid.iter_cells() {
            let u = vel.vector_at(cell);
            for c in 0..vel.components() {
                let acc: f64 = u
                    .iter()
                    .zip(inv_h)
                    .enumerate()
                    .map(|(d, (&ud, ih))| ud * self.derivative(vel, c, cell, d, ih, ud))
                    .sum();
                out.set(c, cell, -acc);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::GhostFill;
    use eddy_core::FieldKind;
    use eddy_operator::BoundaryFill;

    fn shear(grid: &Grid3) -> FieldBuffer {
        // u = (sin(2 pi y), 0, 0), v = 0: (u.grad)u = 0 everywhere.
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, grid, 1);
        for cell in grid.iter_cells() {
            let y = grid.cell_center(cell)[1];
            vel.set(0, cell, (2.0 * std::f64::consts::PI * y).sin());
        }
        GhostFill.fill(grid, &mut vel, 0.0, false);
        vel
    }

    #[test]
    fn uniform_flow_has_no_advection() {
        let grid = Grid3::periodic_cube(4, 1.0).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        vel.fill(0.0);
        vel.fill_component(0, 2.0);
        vel.fill_component(1, -1.0);
        GhostFill.fill(&grid, &mut vel, 0.0, false);
        for scheme in [AdvectionScheme::Centred, AdvectionScheme::Upwind] {
            let mut out = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
            AdvectiveTerm::new(scheme).compute(&grid, &vel, 0.0, &mut out).unwrap();
            assert!(grid.iter_cells().all(|c| out.vector_at(c) == [0.0; 3]));
        }
    }

    #[test]
    fn parallel_shear_has_no_advection() {
        let grid = Grid3::periodic_cube(8, 1.0).unwrap();
        let vel = shear(&grid);
        let mut out = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        AdvectiveTerm::default().compute(&grid, &vel, 0.0, &mut out).unwrap();
        for cell in grid.iter_cells() {
            assert_eq!(out.vector_at(cell), [0.0; 3]);
        }
    }

    #[test]
    fn linear_profile_advects_exactly() {
        // u = x on a clamped box: -(u du/dx) = -x in the interior.
        use eddy_space::EdgeBehavior;
        let grid = Grid3::new([6, 2, 2], [0.5, 1.0, 1.0], [EdgeBehavior::Clamp; 3]).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        for cell in grid.iter_cells() {
            vel.set(0, cell, grid.cell_center(cell)[0]);
        }
        GhostFill.fill(&grid, &mut vel, 0.0, false);
        for scheme in [AdvectionScheme::Centred, AdvectionScheme::Upwind] {
            let mut out = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
            AdvectiveTerm::new(scheme).compute(&grid, &vel, 0.0, &mut out).unwrap();
            for i in 1..5 {
                let x = grid.cell_center([i, 0, 0])[0];
                assert!((out.get(0, [i, 0, 0]) + x).abs() < 1e-12, "{scheme:?} at {i}");
            }
        }
    }

    #[test]
    fn upwind_reads_from_the_upstream_side() {
        let grid = Grid3::periodic_cube(4, 1.0).unwrap();
        let mut vel = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        vel.fill_component(0, 1.0);
        // A bump in v at x = 2, carried in +x by u = 1.
        for j in 0..4 {
            for k in 0..4 {
                vel.set(1, [2, j, k], 1.0);
            }
        }
        GhostFill.fill(&grid, &mut vel, 0.0, false);
        let mut out = FieldBuffer::for_grid(FieldKind::Vector3, &grid, 1);
        AdvectiveTerm::new(AdvectionScheme::Upwind)
            .compute(&grid, &vel, 0.0, &mut out)
            .unwrap();
        let h_inv = 4.0;
        assert_eq!(out.get(1, [1, 0, 0]), 0.0);
        assert_eq!(out.get(1, [2, 0, 0]), -h_inv);
        assert_eq!(out.get(1, [3, 0, 0]), h_inv);
    }
}
