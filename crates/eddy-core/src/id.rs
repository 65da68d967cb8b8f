//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a refinement level within a level arena.
///
/// Level 0 is the coarsest level; `LevelId(n)` is refined `n` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(pub u32);

impl LevelId {
    /// The level index as a `usize`, for indexing level collections.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for LevelId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<usize> for LevelId {
    fn from(v: usize) -> Self {
        Self(v as u32)
    }
}
