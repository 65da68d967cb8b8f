//! Error types for level geometry.

use std::fmt;

/// Errors arising from grid construction.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceError {
    /// Attempted to construct a grid with zero cells along some axis.
    EmptySpace,
    /// A cell size is not finite and positive.
    InvalidCellSize {
        /// Axis of the rejected size.
        axis: usize,
        /// The rejected value.
        value: f64,
    },
    /// A refinement ratio below 2.
    InvalidRefinement {
        /// The rejected ratio.
        ratio: usize,
    },
    /// Total cell count does not fit the address space.
    CellCountOverflow,
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySpace => write!(f, "grid must have at least one cell on every axis"),
            Self::InvalidCellSize { axis, value } => {
                write!(f, "cell size on axis {axis} must be finite and positive, got {value}")
            }
            Self::InvalidRefinement { ratio } => {
                write!(f, "refinement ratio must be at least 2, got {ratio}")
            }
            Self::CellCountOverflow => write!(f, "cell count overflows usize"),
        }
    }
}

impl std::error::Error for SpaceError {}
