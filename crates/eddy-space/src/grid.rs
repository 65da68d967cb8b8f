//! Uniform Cartesian box geometry.

use eddy_core::SPACEDIM;

use crate::edge::EdgeBehavior;
use crate::error::SpaceError;

/// Signed cell coordinate `[i, j, k]`. Interior cells have
/// `0 <= c[d] < cells[d]`; ghost cells lie outside that range.
pub type Cell = [isize; SPACEDIM];

/// One refinement level's box: cell counts, cell sizes and edge
/// behaviour per axis.
///
/// The box's low corner sits at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid3 {
    cells: [usize; SPACEDIM],
    cell_size: [f64; SPACEDIM],
    edges: [EdgeBehavior; SPACEDIM],
}

impl Grid3 {
    /// Create a grid.
    ///
    /// Returns `Err(SpaceError::EmptySpace)` if any axis has zero cells,
    /// and `Err(SpaceError::InvalidCellSize)` for a non-positive or
    /// non-finite cell size.
    pub fn new(
        cells: [usize; SPACEDIM],
        cell_size: [f64; SPACEDIM],
        edges: [EdgeBehavior; SPACEDIM],
    ) -> Result<Self, SpaceError> {
        if cells.contains(&0) {
            return Err(SpaceError::EmptySpace);
        }
        for (axis, &h) in cell_size.iter().enumerate() {
            if !(h.is_finite() && h > 0.0) {
                return Err(SpaceError::InvalidCellSize { axis, value: h });
            }
        }
        cells
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&total| total <= isize::MAX as usize)
            .ok_or(SpaceError::CellCountOverflow)?;
        Ok(Self {
            cells,
            cell_size,
            edges,
        })
    }

    /// A periodic cube of `n^3` cells with side `length`.
    pub fn periodic_cube(n: usize, length: f64) -> Result<Self, SpaceError> {
        let h = length / n.max(1) as f64;
        Self::new([n; SPACEDIM], [h; SPACEDIM], [EdgeBehavior::Wrap; SPACEDIM])
    }

    /// Cell counts per axis.
    pub fn cells(&self) -> [usize; SPACEDIM] {
        self.cells
    }

    /// Cell sizes per axis.
    pub fn cell_size(&self) -> [f64; SPACEDIM] {
        self.cell_size
    }

    /// Reciprocal cell sizes per axis.
    pub fn inv_cell_size(&self) -> [f64; SPACEDIM] {
        self.cell_size.map(|h| 1.0 / h)
    }

    /// Smallest cell size over all axes.
    pub fn min_cell_size(&self) -> f64 {
        self.cell_size.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Edge behaviour of `axis`.
    pub fn edge(&self, axis: usize) -> EdgeBehavior {
        self.edges[axis]
    }

    /// Edge behaviour of all axes.
    pub fn edges(&self) -> [EdgeBehavior; SPACEDIM] {
        self.edges
    }

    /// Whether every axis is periodic.
    pub fn is_fully_periodic(&self) -> bool {
        self.edges.iter().all(EdgeBehavior::is_periodic)
    }

    /// Domain extent per axis.
    pub fn lengths(&self) -> [f64; SPACEDIM] {
        [
            self.cells[0] as f64 * self.cell_size[0],
            self.cells[1] as f64 * self.cell_size[1],
            self.cells[2] as f64 * self.cell_size[2],
        ]
    }

    /// Number of interior cells.
    pub fn cell_count(&self) -> usize {
        self.cells.iter().product()
    }

    /// Whether `cell` lies in the interior.
    pub fn contains(&self, cell: Cell) -> bool {
        (0..SPACEDIM).all(|d| cell[d] >= 0 && (cell[d] as usize) < self.cells[d])
    }

    /// Canonical linear index of an interior cell, x fastest.
    ///
    /// # Panics
    ///
    /// Debug builds panic if `cell` is not an interior cell.
    pub fn linear_index(&self, cell: Cell) -> usize {
        debug_assert!(self.contains(cell), "cell {cell:?} outside {:?}", self.cells);
        let [nx, ny, _] = self.cells;
        cell[0] as usize + nx * (cell[1] as usize + ny * cell[2] as usize)
    }

    /// Cell-centre position of `cell`.
    pub fn cell_center(&self, cell: Cell) -> [f64; SPACEDIM] {
        [
            (cell[0] as f64 + 0.5) * self.cell_size[0],
            (cell[1] as f64 + 0.5) * self.cell_size[1],
            (cell[2] as f64 + 0.5) * self.cell_size[2],
        ]
    }

    /// The grid covering the same domain refined by `ratio` on every axis.
    pub fn refined(&self, ratio: usize) -> Result<Self, SpaceError> {
        if ratio < 2 {
            return Err(SpaceError::InvalidRefinement { ratio });
        }
        let mut cells = [0usize; SPACEDIM];
        for d in 0..SPACEDIM {
            cells[d] = self.cells[d]
                .checked_mul(ratio)
                .ok_or(SpaceError::CellCountOverflow)?;
        }
        Self::new(cells, self.cell_size.map(|h| h / ratio as f64), self.edges)
    }

    /// Iterate interior cells in canonical order.
    pub fn iter_cells(&self) -> CellIter {
        CellIter::over(self.cells)
    }
}

/// Iterator over interior cells in canonical order (x fastest, z slowest).
#[derive(Clone, Debug)]
pub struct CellIter {
    cells: [usize; SPACEDIM],
    next: Cell,
    done: bool,
}

impl CellIter {
    /// Iterate the cells of a box with the given extents.
    pub fn over(cells: [usize; SPACEDIM]) -> Self {
        Self {
            cells,
            next: [0; SPACEDIM],
            done: cells.contains(&0),
        }
    }
}

impl Iterator for CellIter {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.done {
            return None;
        }
        let out = self.next;
        for d in 0..SPACEDIM {
            self.next[d] += 1;
            if (self.next[d] as usize) < self.cells[d] {
                return Some(out);
            }
            self.next[d] = 0;
        }
        self.done = true;
        Some(out)
    }
}
