//! Centred finite-difference stencils on cell-centred fields.
//!
//! Every stencil here reads one ghost layer; callers refresh ghosts first.

use eddy_arena::FieldBuffer;
use eddy_core::{FieldKind, SolverError};
use eddy_space::{Cell, Grid3};

use crate::ghost::{fill_faces, fill_periodic};

/// `cell` moved `by` cells along `axis`.
#[inline]
pub fn shift(mut cell: Cell, axis: usize, by: isize) -> Cell {
    cell[axis] += by;
    cell
}

/// Centred first derivative of `field[comp]` along `axis`.
#[inline]
pub fn central_diff(field: &FieldBuffer, comp: usize, cell: Cell, axis: usize, inv_h: f64) -> f64 {
    0.5 * inv_h * (field.get(comp, shift(cell, axis, 1)) - field.get(comp, shift(cell, axis, -1)))
}

/// Velocity gradient tensor at `cell`: `g[a][b] = d u_a / d x_b`.
pub fn velocity_gradient(vel: &FieldBuffer, cell: Cell, inv_h: [f64; 3]) -> [[f64; 3]; 3] {
    let mut g = [[0.0; 3]; 3];
    for (a, row) in g.iter_mut().enumerate() {
        for (b, v) in row.iter_mut().enumerate() {
            *v = central_diff(vel, a, cell, b, inv_h[b]);
        }
    }
    g
}

/// Write the centred gradient of the scalar `field` into the interior of
/// the vector `out`.
pub fn gradient(grid: &Grid3, field: &FieldBuffer, out: &mut FieldBuffer) {
    let inv_h = grid.inv_cell_size();
    for cell in grid.iter_cells() {
        for (d, &ih) in inv_h.iter().enumerate() {
            out.set(d, cell, central_diff(field, 0, cell, d, ih));
        }
    }
}

/// Write the centred divergence of the vector `field` into the interior
/// of the scalar `out`.
pub fn divergence(grid: &Grid3, field: &FieldBuffer, out: &mut FieldBuffer) {
    let inv_h = grid.inv_cell_size();
    for cell in grid.iter_cells() {
        let div: f64 = (0..3).map(|d| central_diff(field, d, cell, d, inv_h[d])).sum();
        out.set(0, cell, div);
    }
}

/// Largest `|div u|` over the interior of `vel`.
///
/// Works on a copy whose ghosts are refreshed with homogeneous fills, so
/// `vel` itself is not touched.
pub fn max_abs_divergence(grid: &Grid3, vel: &FieldBuffer) -> f64 {
    let mut u = vel.clone();
    fill_periodic(grid, &mut u);
    fill_faces(grid, &mut u, false);
    let mut div = FieldBuffer::for_grid(FieldKind::Scalar, grid, vel.ghost());
    divergence(grid, &u, &mut div);
    div.max_abs(0, &vec![false; grid.cell_count()])
}

/// Reject fields that cannot host a centred stencil on `grid`.
pub(crate) fn require_stencil(
    grid: &Grid3,
    fields: &[&FieldBuffer],
    solver: &str,
) -> Result<(), SolverError> {
    for f in fields {
        if f.dims() != grid.cells() {
            return Err(SolverError::ShapeMismatch {
                reason: format!(
                    "{solver}: field extents {:?} differ from grid {:?}",
                    f.dims(),
                    grid.cells()
                ),
            });
        }
        if f.ghost() == 0 {
            return Err(SolverError::ShapeMismatch {
                reason: format!("{solver}: needs at least one ghost layer"),
            });
        }
    }
    Ok(())
}
