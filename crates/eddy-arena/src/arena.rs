//! Indexed collection of level states.

use eddy_core::LevelId;
use eddy_space::Grid3;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::level::LevelState;

/// Owns the [`LevelState`] of every refinement level, coarsest first.
///
/// Allocation and reallocation happen here, driven by the external
/// refinement layer between steps. Moving data between levels is that
/// layer's job; [`regrid`](LevelArena::regrid) hands back zeroed fields.
#[derive(Clone, Debug)]
pub struct LevelArena {
    config: ArenaConfig,
    levels: Vec<LevelState>,
}

impl LevelArena {
    /// Create an empty arena.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            config,
            levels: Vec::new(),
        })
    }

    /// The arena configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Allocate a new finest level over `grid`.
    pub fn push_level(&mut self, grid: Grid3) -> Result<LevelId, ArenaError> {
        if self.levels.len() >= self.config.max_levels {
            return Err(ArenaError::TooManyLevels {
                max: self.config.max_levels,
            });
        }
        self.levels
            .push(LevelState::new(grid, self.config.ghost_width));
        Ok(LevelId::from(self.levels.len() - 1))
    }

    /// Replace the fields of `level` with zeroed fields over `grid`.
    /// The covered mask is reset.
    pub fn regrid(&mut self, level: LevelId, grid: Grid3) -> Result<(), ArenaError> {
        let ghost = self.config.ghost_width;
        let slot = self
            .levels
            .get_mut(level.index())
            .ok_or(ArenaError::UnknownLevel { level })?;
        *slot = LevelState::new(grid, ghost);
        Ok(())
    }

    /// Destroy every level at index `num_levels` and above.
    pub fn truncate(&mut self, num_levels: usize) {
        self.levels.truncate(num_levels);
    }

    /// Number of allocated levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Whether no level is allocated.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The finest allocated level.
    pub fn finest_level(&self) -> Option<LevelId> {
        self.levels.len().checked_sub(1).map(LevelId::from)
    }

    /// Geometry of the finest level.
    pub fn finest_grid(&self) -> Option<&Grid3> {
        self.levels.last().map(LevelState::grid)
    }

    /// Shared access to one level.
    pub fn level(&self, level: LevelId) -> Option<&LevelState> {
        self.levels.get(level.index())
    }

    /// Mutable access to one level.
    pub fn level_mut(&mut self, level: LevelId) -> Option<&mut LevelState> {
        self.levels.get_mut(level.index())
    }

    /// All levels, coarsest first.
    pub fn levels(&self) -> &[LevelState] {
        &self.levels
    }

    /// All levels, coarsest first, mutably.
    pub fn levels_mut(&mut self) -> &mut [LevelState] {
        &mut self.levels
    }

    /// Heap bytes held by all levels.
    pub fn memory_bytes(&self) -> usize {
        self.levels.iter().map(LevelState::memory_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_space::EdgeBehavior;

    fn coarse() -> Grid3 {
        Grid3::new([4, 4, 4], [0.25; 3], [EdgeBehavior::Wrap; 3]).unwrap()
    }

    #[test]
    fn push_assigns_sequential_ids() {
        let mut arena = LevelArena::new(ArenaConfig::default()).unwrap();
        assert!(arena.is_empty());
        assert_eq!(arena.finest_level(), None);
        let l0 = arena.push_level(coarse()).unwrap();
        let l1 = arena.push_level(coarse().refined(2).unwrap()).unwrap();
        assert_eq!((l0, l1), (LevelId(0), LevelId(1)));
        assert_eq!(arena.finest_level(), Some(LevelId(1)));
        assert_eq!(arena.finest_grid().unwrap().cells(), [8, 8, 8]);
        assert_eq!(arena.level(l1).unwrap().ghost(), 2);
    }

    #[test]
    fn level_limit_enforced() {
        let config = ArenaConfig {
            ghost_width: 1,
            max_levels: 1,
        };
        let mut arena = LevelArena::new(config).unwrap();
        arena.push_level(coarse()).unwrap();
        assert_eq!(
            arena.push_level(coarse()),
            Err(ArenaError::TooManyLevels { max: 1 })
        );
    }

    #[test]
    fn regrid_reallocates() {
        let mut arena = LevelArena::new(ArenaConfig::new(1)).unwrap();
        let l0 = arena.push_level(coarse()).unwrap();
        arena.level_mut(l0).unwrap().vel.fill(3.0);
        let bigger = Grid3::new([6, 4, 4], [0.25; 3], [EdgeBehavior::Wrap; 3]).unwrap();
        arena.regrid(l0, bigger).unwrap();
        let lev = arena.level(l0).unwrap();
        assert_eq!(lev.vel.dims(), [6, 4, 4]);
        assert_eq!(lev.vel.get(0, [0, 0, 0]), 0.0);
        assert_eq!(
            arena.regrid(LevelId(5), bigger),
            Err(ArenaError::UnknownLevel { level: LevelId(5) })
        );
    }

    #[test]
    fn truncate_and_memory() {
        let mut arena = LevelArena::new(ArenaConfig::new(1)).unwrap();
        arena.push_level(coarse()).unwrap();
        let one = arena.memory_bytes();
        arena.push_level(coarse()).unwrap();
        assert_eq!(arena.memory_bytes(), 2 * one);
        arena.truncate(1);
        assert_eq!(arena.num_levels(), 1);
        assert_eq!(arena.memory_bytes(), one);
    }
}
