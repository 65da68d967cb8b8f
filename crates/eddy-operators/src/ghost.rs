//! Ghost-cell fills for single-box levels.
//!
//! Axes are filled one after another over the full padded extent of the
//! other two axes, so edge and corner ghosts end up consistent with the
//! faces they touch.

use eddy_arena::FieldBuffer;
use eddy_operator::BoundaryFill;
use eddy_space::{EdgeBehavior, Grid3};

/// Where a ghost cell takes its value from.
fn source_index(idx: isize, n: isize, edge: EdgeBehavior, extrap: bool) -> Option<isize> {
    match edge {
        EdgeBehavior::Wrap => Some(idx.rem_euclid(n)),
        EdgeBehavior::Clamp => Some(idx.clamp(0, n - 1)),
        EdgeBehavior::Absorb if extrap => Some(idx.clamp(0, n - 1)),
        EdgeBehavior::Absorb => None,
    }
}

fn fill_axis(field: &mut FieldBuffer, axis: usize, edge: EdgeBehavior, extrap: bool) {
    let dims = field.dims();
    let g = field.ghost() as isize;
    let n = dims[axis] as isize;
    let a = (axis + 1) % 3;
    let b = (axis + 2) % 3;
    let (na, nb) = (dims[a] as isize, dims[b] as isize);
    for c in 0..field.components() {
        for ib in -g..nb + g {
            for ia in -g..na + g {
                for layer in 0..g {
                    for idx in [-1 - layer, n + layer] {
                        let mut cell = [0isize; 3];
                        cell[axis] = idx;
                        cell[a] = ia;
                        cell[b] = ib;
                        let value = match source_index(idx, n, edge, extrap) {
                            Some(src) => {
                                let mut from = cell;
                                from[axis] = src;
                                field.get(c, from)
                            }
                            None => 0.0,
                        };
                        field.set(c, cell, value);
                    }
                }
            }
        }
    }
}

/// Copy periodic images into the ghost cells of every periodic axis.
pub fn fill_periodic(grid: &Grid3, field: &mut FieldBuffer) {
    for axis in 0..3 {
        if grid.edge(axis).is_periodic() {
            fill_axis(field, axis, EdgeBehavior::Wrap, false);
        }
    }
}

/// Fill the ghost cells of every non-periodic axis.
///
/// `Clamp` faces copy the adjacent interior cell. `Absorb` faces hold
/// zero, or copy the adjacent interior cell when `extrap` is set.
pub fn fill_faces(grid: &Grid3, field: &mut FieldBuffer, extrap: bool) {
    for axis in 0..3 {
        let edge = grid.edge(axis);
        if !edge.is_periodic() {
            fill_axis(field, axis, edge, extrap);
        }
    }
}

/// Homogeneous ghost fill driven by each axis's [`EdgeBehavior`].
///
/// The boundary values do not depend on time.
#[derive(Clone, Copy, Debug, Default)]
pub struct GhostFill;

impl BoundaryFill for GhostFill {
    fn name(&self) -> &str {
        "ghost_fill"
    }

    fn fill_boundary(&self, grid: &Grid3, field: &mut FieldBuffer) {
        fill_periodic(grid, field);
    }

    fn fill_physical_bc(&self, grid: &Grid3, field: &mut FieldBuffer, _time: f64, extrap: bool) {
        fill_faces(grid, field, extrap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_core::FieldKind;

    fn ramp(grid: &Grid3, ghost: usize) -> FieldBuffer {
        let mut f = FieldBuffer::for_grid(FieldKind::Scalar, grid, ghost);
        for cell in grid.iter_cells() {
            f.set(0, cell, 1.0 + cell[0] as f64 + 10.0 * cell[1] as f64);
        }
        f
    }

    #[test]
    fn periodic_ghosts_wrap() {
        let grid = Grid3::periodic_cube(4, 1.0).unwrap();
        let mut f = ramp(&grid, 2);
        GhostFill.fill(&grid, &mut f, 0.0, false);
        assert_eq!(f.get(0, [-1, 0, 0]), f.get(0, [3, 0, 0]));
        assert_eq!(f.get(0, [-2, 1, 0]), f.get(0, [2, 1, 0]));
        assert_eq!(f.get(0, [5, 2, 3]), f.get(0, [1, 2, 3]));
        // Corner ghosts see both wraps.
        assert_eq!(f.get(0, [-1, -1, 0]), f.get(0, [3, 3, 0]));
    }

    #[test]
    fn wrap_handles_ghost_wider_than_box() {
        let grid = Grid3::new([1, 2, 2], [1.0; 3], [EdgeBehavior::Wrap; 3]).unwrap();
        let mut f = ramp(&grid, 2);
        fill_periodic(&grid, &mut f);
        assert_eq!(f.get(0, [-2, 1, 0]), f.get(0, [0, 1, 0]));
        assert_eq!(f.get(0, [2, 1, 0]), f.get(0, [0, 1, 0]));
    }

    #[test]
    fn clamp_and_absorb_faces() {
        let grid = Grid3::new(
            [3, 3, 2],
            [1.0; 3],
            [EdgeBehavior::Clamp, EdgeBehavior::Absorb, EdgeBehavior::Wrap],
        )
        .unwrap();
        let mut f = ramp(&grid, 1);
        GhostFill.fill(&grid, &mut f, 0.0, false);
        assert_eq!(f.get(0, [-1, 1, 0]), f.get(0, [0, 1, 0]));
        assert_eq!(f.get(0, [3, 1, 0]), f.get(0, [2, 1, 0]));
        assert_eq!(f.get(0, [1, -1, 0]), 0.0);
        assert_eq!(f.get(0, [1, 3, 0]), 0.0);

        fill_faces(&grid, &mut f, true);
        assert_eq!(f.get(0, [1, -1, 0]), f.get(0, [1, 0, 0]));
    }

    #[test]
    fn periodic_pass_leaves_walls_alone() {
        let grid = Grid3::new(
            [2, 2, 2],
            [1.0; 3],
            [EdgeBehavior::Absorb, EdgeBehavior::Wrap, EdgeBehavior::Wrap],
        )
        .unwrap();
        let mut f = ramp(&grid, 1);
        f.set(0, [-1, 0, 0], 7.0);
        fill_periodic(&grid, &mut f);
        assert_eq!(f.get(0, [-1, 0, 0]), 7.0);
    }
}
