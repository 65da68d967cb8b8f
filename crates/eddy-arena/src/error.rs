//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use eddy_core::LevelId;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Ghost width of zero: neighbour stencils would read out of bounds.
    InvalidGhostWidth {
        /// The rejected width.
        width: usize,
    },
    /// Pushing another level would exceed `max_levels`.
    TooManyLevels {
        /// The configured maximum.
        max: usize,
    },
    /// A level index that has not been allocated.
    UnknownLevel {
        /// The unrecognised level.
        level: LevelId,
    },
    /// A covered mask whose length differs from the level's cell count.
    MaskSizeMismatch {
        /// Interior cell count of the level.
        expected: usize,
        /// Length of the supplied mask.
        got: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGhostWidth { width } => {
                write!(f, "ghost width must be at least 1, got {width}")
            }
            Self::TooManyLevels { max } => write!(f, "level count limited to {max}"),
            Self::UnknownLevel { level } => write!(f, "level {level} is not allocated"),
            Self::MaskSizeMismatch { expected, got } => {
                write!(f, "covered mask has {got} entries, level has {expected} cells")
            }
        }
    }
}

impl Error for ArenaError {}
