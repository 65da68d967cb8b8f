//! Ghost-padded field storage.

use eddy_core::{FieldKind, SPACEDIM};
use eddy_space::{Cell, CellIter, Grid3};

/// A scalar or vector field over one level's box, padded by `ghost`
/// layers on every side.
///
/// Storage is component-major: all values of component 0 (interior and
/// ghosts, x fastest) precede those of component 1. Cells are addressed
/// with signed coordinates; `[-1, 0, 0]` is the first ghost cell on the
/// low x face.
///
/// Arithmetic helpers (`axpy`, `scale_by`, ...) touch interior cells only.
/// Ghost cells are refreshed by the boundary collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBuffer {
    kind: FieldKind,
    dims: [usize; SPACEDIM],
    ghost: usize,
    padded: [usize; SPACEDIM],
    comp_len: usize,
    data: Vec<f64>,
}

impl FieldBuffer {
    /// Allocate a zero-filled buffer with interior extents `dims`.
    pub fn new(kind: FieldKind, dims: [usize; SPACEDIM], ghost: usize) -> Self {
        let padded = dims.map(|n| n + 2 * ghost);
        let comp_len = padded.iter().product();
        Self {
            kind,
            dims,
            ghost,
            padded,
            comp_len,
            data: vec![0.0; comp_len * kind.components()],
        }
    }

    /// Allocate a zero-filled buffer covering `grid`.
    pub fn for_grid(kind: FieldKind, grid: &Grid3, ghost: usize) -> Self {
        Self::new(kind, grid.cells(), ghost)
    }

    /// Value shape of this field.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Number of components per cell.
    pub fn components(&self) -> usize {
        self.kind.components()
    }

    /// Interior extents.
    pub fn dims(&self) -> [usize; SPACEDIM] {
        self.dims
    }

    /// Ghost layers per side.
    pub fn ghost(&self) -> usize {
        self.ghost
    }

    /// Extents including ghost layers.
    pub fn padded_dims(&self) -> [usize; SPACEDIM] {
        self.padded
    }

    /// Number of interior cells.
    pub fn interior_len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Whether `other` has the same kind, extents and ghost width.
    pub fn same_shape(&self, other: &FieldBuffer) -> bool {
        self.kind == other.kind && self.dims == other.dims && self.ghost == other.ghost
    }

    /// Offset of `cell` within one component's padded storage.
    #[inline]
    pub fn offset(&self, cell: Cell) -> usize {
        let g = self.ghost as isize;
        debug_assert!(
            (0..SPACEDIM).all(|d| cell[d] >= -g && cell[d] < self.dims[d] as isize + g),
            "cell {cell:?} outside padded box"
        );
        let i = (cell[0] + g) as usize;
        let j = (cell[1] + g) as usize;
        let k = (cell[2] + g) as usize;
        i + self.padded[0] * (j + self.padded[1] * k)
    }

    /// Value of component `comp` at `cell`.
    #[inline]
    pub fn get(&self, comp: usize, cell: Cell) -> f64 {
        self.data[comp * self.comp_len + self.offset(cell)]
    }

    /// Overwrite component `comp` at `cell`.
    #[inline]
    pub fn set(&mut self, comp: usize, cell: Cell, value: f64) {
        let at = comp * self.comp_len + self.offset(cell);
        self.data[at] = value;
    }

    /// All components at `cell`. Scalar fields fill only slot 0.
    pub fn vector_at(&self, cell: Cell) -> [f64; SPACEDIM] {
        let mut out = [0.0; SPACEDIM];
        for (c, v) in out.iter_mut().enumerate().take(self.components()) {
            *v = self.get(c, cell);
        }
        out
    }

    /// Padded storage of component `comp`.
    pub fn component(&self, comp: usize) -> &[f64] {
        &self.data[comp * self.comp_len..(comp + 1) * self.comp_len]
    }

    /// Mutable padded storage of component `comp`.
    pub fn component_mut(&mut self, comp: usize) -> &mut [f64] {
        &mut self.data[comp * self.comp_len..(comp + 1) * self.comp_len]
    }

    /// Raw storage, ghosts included.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Interior cells in canonical order.
    pub fn cells(&self) -> CellIter {
        CellIter::over(self.dims)
    }

    /// Heap bytes held by this buffer.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    /// Set every value, ghosts included.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Set every interior value of component `comp`.
    pub fn fill_component(&mut self, comp: usize, value: f64) {
        let base = comp * self.comp_len;
        for o in self.interior_offsets() {
            self.data[base + o] = value;
        }
    }

    /// Copy all values, ghosts included, from `other`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn copy_from(&mut self, other: &FieldBuffer) {
        assert!(self.same_shape(other), "copy_from: shape mismatch");
        self.data.copy_from_slice(&other.data);
    }

    /// `self += a * x` over interior cells, all components.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn axpy(&mut self, a: f64, x: &FieldBuffer) {
        assert!(self.same_shape(x), "axpy: shape mismatch");
        for c in 0..self.components() {
            let base = c * self.comp_len;
            for o in self.interior_offsets() {
                self.data[base + o] += a * x.data[base + o];
            }
        }
    }

    /// Add `value` to every interior value of component `comp`.
    pub fn add_constant(&mut self, comp: usize, value: f64) {
        let base = comp * self.comp_len;
        for o in self.interior_offsets() {
            self.data[base + o] += value;
        }
    }

    /// Multiply every component by the scalar field `s`, interior only.
    ///
    /// # Panics
    ///
    /// Panics if `s` is not a scalar over the same box.
    pub fn scale_by(&mut self, s: &FieldBuffer) {
        self.zip_scalar(s, |v, w| v * w);
    }

    /// Divide every component by the scalar field `s`, interior only.
    ///
    /// # Panics
    ///
    /// Panics if `s` is not a scalar over the same box.
    pub fn divide_by(&mut self, s: &FieldBuffer) {
        self.zip_scalar(s, |v, w| v / w);
    }

    fn zip_scalar(&mut self, s: &FieldBuffer, op: impl Fn(f64, f64) -> f64) {
        assert!(
            s.kind == FieldKind::Scalar && s.dims == self.dims && s.ghost == self.ghost,
            "scalar operand shape mismatch"
        );
        for c in 0..self.components() {
            let base = c * self.comp_len;
            for o in self.interior_offsets() {
                self.data[base + o] = op(self.data[base + o], s.data[o]);
            }
        }
    }

    // ── Masked reductions ──────────────────────────────────────────

    /// Largest `|value|` of component `comp` over uncovered cells.
    /// Zero when every cell is covered.
    pub fn max_abs(&self, comp: usize, covered: &[bool]) -> f64 {
        self.uncovered(comp, covered).fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Sum of `|value|` of component `comp` over uncovered cells.
    pub fn sum_abs(&self, comp: usize, covered: &[bool]) -> f64 {
        self.uncovered(comp, covered).map(f64::abs).sum()
    }

    /// Smallest value of component `comp` over uncovered cells.
    /// `f64::INFINITY` when every cell is covered.
    pub fn min_value(&self, comp: usize, covered: &[bool]) -> f64 {
        self.uncovered(comp, covered).fold(f64::INFINITY, f64::min)
    }

    /// Largest value of component `comp` over uncovered cells.
    /// `f64::NEG_INFINITY` when every cell is covered.
    pub fn max_value(&self, comp: usize, covered: &[bool]) -> f64 {
        self.uncovered(comp, covered).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Largest `|self - other|` of component `comp` over uncovered cells.
    pub fn max_abs_diff(&self, other: &FieldBuffer, comp: usize, covered: &[bool]) -> f64 {
        self.uncovered_diff(other, comp, covered)
            .fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Sum of `|self - other|` of component `comp` over uncovered cells.
    pub fn sum_abs_diff(&self, other: &FieldBuffer, comp: usize, covered: &[bool]) -> f64 {
        self.uncovered_diff(other, comp, covered).map(f64::abs).sum()
    }

    /// First interior value that is NaN or infinite, as
    /// `(component, linear cell index)`.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        for c in 0..self.components() {
            let base = c * self.comp_len;
            if let Some(n) = self
                .interior_offsets()
                .position(|o| !self.data[base + o].is_finite())
            {
                return Some((c, n));
            }
        }
        None
    }

    /// Padded offsets of interior cells, canonical order.
    fn interior_offsets(&self) -> impl Iterator<Item = usize> {
        let [nx, ny, nz] = self.dims;
        let [px, py, _] = self.padded;
        let g = self.ghost;
        (0..nz).flat_map(move |k| {
            (0..ny).flat_map(move |j| (0..nx).map(move |i| (i + g) + px * ((j + g) + py * (k + g))))
        })
    }

    fn uncovered<'a>(
        &'a self,
        comp: usize,
        covered: &'a [bool],
    ) -> impl Iterator<Item = f64> + 'a {
        assert_eq!(covered.len(), self.interior_len(), "covered mask length");
        let base = comp * self.comp_len;
        self.interior_offsets()
            .zip(covered)
            .filter(|&(_, &c)| !c)
            .map(move |(o, _)| self.data[base + o])
    }

    fn uncovered_diff<'a>(
        &'a self,
        other: &'a FieldBuffer,
        comp: usize,
        covered: &'a [bool],
    ) -> impl Iterator<Item = f64> + 'a {
        assert!(self.same_shape(other), "difference of mismatched fields");
        assert_eq!(covered.len(), self.interior_len(), "covered mask length");
        let base = comp * self.comp_len;
        self.interior_offsets()
            .zip(covered)
            .filter(|&(_, &c)| !c)
            .map(move |(o, _)| self.data[base + o] - other.data[base + o])
    }
}
