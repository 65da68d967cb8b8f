//! The field bundle owned by one refinement level.

use indexmap::IndexMap;

use eddy_core::{FieldKind, LevelField};
use eddy_space::{Cell, Grid3};

use crate::buffer::FieldBuffer;
use crate::error::ArenaError;

/// Reduction applied by [`LevelState::norm`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Norm {
    /// Maximum absolute value.
    Max,
    /// Sum of absolute values.
    L1,
}

/// All fields of one level.
///
/// The named slots are public so that a stage can borrow several of them
/// at once (for example `vel` mutably and `ro` shared). Every buffer has
/// the level's extents and ghost width. Fields start at zero; initial
/// conditions are written by the caller.
#[derive(Clone, Debug)]
pub struct LevelState {
    grid: Grid3,
    ghost: usize,
    /// Velocity at the new time.
    pub vel: FieldBuffer,
    /// Velocity at the start of the step.
    pub vel_old: FieldBuffer,
    /// Advective term of the corrector stage.
    pub conv: FieldBuffer,
    /// Advective term of the predictor stage.
    pub conv_old: FieldBuffer,
    /// Pressure gradient.
    pub gp: FieldBuffer,
    /// Pressure.
    pub p: FieldBuffer,
    /// Density.
    pub ro: FieldBuffer,
    /// Effective viscosity.
    pub eta: FieldBuffer,
    /// Strain-rate magnitude.
    pub strain_rate: FieldBuffer,
    covered: Vec<bool>,
    diagnostics: IndexMap<&'static str, FieldBuffer>,
}

impl LevelState {
    /// Allocate zeroed fields for `grid` with `ghost` layers.
    pub fn new(grid: Grid3, ghost: usize) -> Self {
        let vector = || FieldBuffer::for_grid(FieldKind::Vector3, &grid, ghost);
        let scalar = || FieldBuffer::for_grid(FieldKind::Scalar, &grid, ghost);
        Self {
            grid,
            ghost,
            vel: vector(),
            vel_old: vector(),
            conv: vector(),
            conv_old: vector(),
            gp: vector(),
            p: scalar(),
            ro: scalar(),
            eta: scalar(),
            strain_rate: scalar(),
            covered: vec![false; grid.cell_count()],
            diagnostics: IndexMap::new(),
        }
    }

    /// Geometry of this level.
    pub fn grid(&self) -> &Grid3 {
        &self.grid
    }

    /// Ghost layers per side.
    pub fn ghost(&self) -> usize {
        self.ghost
    }

    /// Covered mask in canonical cell order. `true` marks a cell that is
    /// overlaid by a finer level or lies inside solid geometry.
    pub fn covered(&self) -> &[bool] {
        &self.covered
    }

    /// Number of cells that take part in reductions.
    pub fn uncovered_count(&self) -> usize {
        self.covered.iter().filter(|&&c| !c).count()
    }

    /// Replace the covered mask.
    pub fn set_covered(&mut self, mask: Vec<bool>) -> Result<(), ArenaError> {
        if mask.len() != self.grid.cell_count() {
            return Err(ArenaError::MaskSizeMismatch {
                expected: self.grid.cell_count(),
                got: mask.len(),
            });
        }
        self.covered = mask;
        Ok(())
    }

    /// Mark the half-open box `[lo, hi)` as covered. Cells outside the
    /// level are ignored.
    pub fn cover_box(&mut self, lo: Cell, hi: Cell) {
        for cell in self.grid.iter_cells() {
            if (0..3).all(|d| cell[d] >= lo[d] && cell[d] < hi[d]) {
                let n = self.grid.linear_index(cell);
                self.covered[n] = true;
            }
        }
    }

    /// Shared access to a named slot.
    pub fn field(&self, which: LevelField) -> &FieldBuffer {
        match which {
            LevelField::Velocity => &self.vel,
            LevelField::VelocityOld => &self.vel_old,
            LevelField::Convection => &self.conv,
            LevelField::ConvectionOld => &self.conv_old,
            LevelField::Pressure => &self.p,
            LevelField::PressureGradient => &self.gp,
            LevelField::Density => &self.ro,
            LevelField::Viscosity => &self.eta,
            LevelField::StrainRate => &self.strain_rate,
        }
    }

    /// Mutable access to a named slot.
    pub fn field_mut(&mut self, which: LevelField) -> &mut FieldBuffer {
        match which {
            LevelField::Velocity => &mut self.vel,
            LevelField::VelocityOld => &mut self.vel_old,
            LevelField::Convection => &mut self.conv,
            LevelField::ConvectionOld => &mut self.conv_old,
            LevelField::Pressure => &mut self.p,
            LevelField::PressureGradient => &mut self.gp,
            LevelField::Density => &mut self.ro,
            LevelField::Viscosity => &mut self.eta,
            LevelField::StrainRate => &mut self.strain_rate,
        }
    }

    /// Norm of one component of a slot over uncovered cells.
    pub fn norm(&self, which: LevelField, comp: usize, norm: Norm) -> f64 {
        let f = self.field(which);
        match norm {
            Norm::Max => f.max_abs(comp, &self.covered),
            Norm::L1 => f.sum_abs(comp, &self.covered),
        }
    }

    /// Smallest value of one component of a slot over uncovered cells.
    pub fn min_value(&self, which: LevelField, comp: usize) -> f64 {
        self.field(which).min_value(comp, &self.covered)
    }

    /// Largest value of one component of a slot over uncovered cells.
    pub fn max_value(&self, which: LevelField, comp: usize) -> f64 {
        self.field(which).max_value(comp, &self.covered)
    }

    /// A named diagnostic field, if it has been produced.
    pub fn diagnostic(&self, name: &str) -> Option<&FieldBuffer> {
        self.diagnostics.get(name)
    }

    /// A named diagnostic field, allocated zeroed on first use.
    pub fn diagnostic_mut(&mut self, name: &'static str, kind: FieldKind) -> &mut FieldBuffer {
        let (grid, ghost) = (self.grid, self.ghost);
        self.diagnostics
            .entry(name)
            .or_insert_with(|| FieldBuffer::for_grid(kind, &grid, ghost))
    }

    /// Diagnostic fields in the order they were first produced.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&'static str, &FieldBuffer)> {
        self.diagnostics.iter().map(|(k, v)| (*k, v))
    }

    /// Snapshot the velocity: `vel_old <- vel`, ghosts included.
    pub fn save_velocity(&mut self) {
        self.vel_old.copy_from(&self.vel);
    }

    /// Roll the velocity back: `vel <- vel_old`, ghosts included.
    pub fn restore_velocity(&mut self) {
        self.vel.copy_from(&self.vel_old);
    }

    /// Zero the pressure and its gradient.
    pub fn reset_pressure(&mut self) {
        self.p.fill(0.0);
        self.gp.fill(0.0);
    }

    /// Heap bytes held by this level.
    pub fn memory_bytes(&self) -> usize {
        LevelField::ALL
            .iter()
            .map(|&f| self.field(f).memory_bytes())
            .chain(self.diagnostics.values().map(FieldBuffer::memory_bytes))
            .sum::<usize>()
            + self.covered.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_space::EdgeBehavior;

    fn level() -> LevelState {
        let grid = Grid3::new([4, 2, 2], [0.25, 0.5, 0.5], [EdgeBehavior::Wrap; 3]).unwrap();
        LevelState::new(grid, 1)
    }

    #[test]
    fn slots_match_kinds() {
        let lev = level();
        for f in LevelField::ALL {
            assert_eq!(lev.field(f).kind(), f.kind(), "{f}");
            assert_eq!(lev.field(f).dims(), [4, 2, 2]);
        }
    }

    #[test]
    fn cover_box_masks_norms() {
        let mut lev = level();
        lev.vel.fill_component(0, 1.0);
        lev.vel.set(0, [3, 1, 1], 9.0);
        assert_eq!(lev.norm(LevelField::Velocity, 0, Norm::Max), 9.0);
        lev.cover_box([2, 0, 0], [4, 2, 2]);
        assert_eq!(lev.uncovered_count(), 8);
        assert_eq!(lev.norm(LevelField::Velocity, 0, Norm::Max), 1.0);
        assert_eq!(lev.norm(LevelField::Velocity, 0, Norm::L1), 8.0);
    }

    #[test]
    fn set_covered_checks_length() {
        let mut lev = level();
        assert_eq!(
            lev.set_covered(vec![true; 3]),
            Err(ArenaError::MaskSizeMismatch {
                expected: 16,
                got: 3
            })
        );
        assert!(lev.set_covered(vec![true; 16]).is_ok());
        assert_eq!(lev.uncovered_count(), 0);
    }

    #[test]
    fn save_and_restore_velocity() {
        let mut lev = level();
        lev.vel.fill(2.0);
        lev.save_velocity();
        lev.vel.fill(5.0);
        assert_eq!(lev.vel_old.get(1, [-1, 0, 0]), 2.0);
        lev.restore_velocity();
        assert_eq!(lev.vel.get(1, [0, 0, 0]), 2.0);
    }

    #[test]
    fn diagnostics_keep_insertion_order() {
        let mut lev = level();
        lev.diagnostic_mut("vorticity", FieldKind::Scalar).fill(1.0);
        lev.diagnostic_mut("divu", FieldKind::Scalar);
        let names: Vec<_> = lev.diagnostics().map(|(n, _)| n).collect();
        assert_eq!(names, ["vorticity", "divu"]);
        assert_eq!(lev.diagnostic("vorticity").unwrap().get(0, [0, 0, 0]), 1.0);
        assert!(lev.diagnostic("strainrate").is_none());
    }

    #[test]
    fn density_extrema() {
        let mut lev = level();
        lev.ro.fill(1.0);
        lev.ro.set(0, [1, 1, 1], 0.25);
        assert_eq!(lev.min_value(LevelField::Density, 0), 0.25);
        assert_eq!(lev.max_value(LevelField::Density, 0), 1.0);
    }
}
