//! The [`BoundaryFill`] trait.

use eddy_arena::FieldBuffer;
use eddy_space::Grid3;

/// Refreshes ghost cells.
///
/// Must be called after every explicit mutation of a field that is later
/// read through a neighbour stencil. When the call returns, every ghost
/// cell of `field` is valid; there is nothing left in flight.
///
/// # Examples
///
/// A fill for a single-patch periodic box needs only the halo pass:
///
/// ```
/// use eddy_arena::FieldBuffer;
/// use eddy_core::FieldKind;
/// use eddy_operator::BoundaryFill;
/// use eddy_space::Grid3;
///
/// struct HaloOnly;
///
/// impl BoundaryFill for HaloOnly {
///     fn name(&self) -> &str { "halo_only" }
///
///     fn fill_boundary(&self, grid: &Grid3, field: &mut FieldBuffer) {
///         let [nx, _, _] = grid.cells();
///         for c in 0..field.components() {
///             for cell in grid.iter_cells() {
///                 if cell[0] == 0 {
///                     let v = field.get(c, cell);
///                     field.set(c, [nx as isize, cell[1], cell[2]], v);
///                 }
///             }
///         }
///     }
///
///     fn fill_physical_bc(&self, _: &Grid3, _: &mut FieldBuffer, _: f64, _: bool) {}
/// }
///
/// let grid = Grid3::periodic_cube(4, 1.0).unwrap();
/// let mut f = FieldBuffer::for_grid(FieldKind::Scalar, &grid, 1);
/// f.set(0, [0, 1, 1], 2.0);
/// HaloOnly.fill(&grid, &mut f, 0.0, false);
/// assert_eq!(f.get(0, [4, 1, 1]), 2.0);
/// ```
pub trait BoundaryFill: Send + 'static {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Exchange halo data: periodic images and, on a multi-patch level,
    /// neighbour patches.
    fn fill_boundary(&self, grid: &Grid3, field: &mut FieldBuffer);

    /// Write ghost cells beyond non-periodic domain faces at `time`.
    ///
    /// With `extrap` set, faces that would impose a value extrapolate
    /// from the interior instead.
    fn fill_physical_bc(&self, grid: &Grid3, field: &mut FieldBuffer, time: f64, extrap: bool);

    /// Halo exchange followed by the physical boundary fill.
    fn fill(&self, grid: &Grid3, field: &mut FieldBuffer, time: f64, extrap: bool) {
        self.fill_boundary(grid, field);
        self.fill_physical_bc(grid, field, time, extrap);
    }
}
