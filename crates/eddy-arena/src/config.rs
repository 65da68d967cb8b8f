//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the level arena.
///
/// Validated when the arena is created; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Ghost layers on every side of every field.
    ///
    /// Default: 2. Must be at least 1 for the centred stencils used by
    /// the reference operators.
    pub ghost_width: usize,

    /// Upper bound on the number of refinement levels.
    ///
    /// Default: 8.
    pub max_levels: usize,
}

impl ArenaConfig {
    /// Default ghost width.
    pub const DEFAULT_GHOST_WIDTH: usize = 2;

    /// Default maximum level count.
    pub const DEFAULT_MAX_LEVELS: usize = 8;

    /// Create a config with the given ghost width and default limits.
    pub fn new(ghost_width: usize) -> Self {
        Self {
            ghost_width,
            max_levels: Self::DEFAULT_MAX_LEVELS,
        }
    }

    /// Check that the configuration can hold at least one usable level.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.ghost_width == 0 {
            return Err(ArenaError::InvalidGhostWidth {
                width: self.ghost_width,
            });
        }
        if self.max_levels == 0 {
            return Err(ArenaError::TooManyLevels { max: 0 });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GHOST_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ArenaConfig::default();
        assert_eq!(config.ghost_width, 2);
        assert_eq!(config.max_levels, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_ghost_width_rejected() {
        assert_eq!(
            ArenaConfig::new(0).validate(),
            Err(ArenaError::InvalidGhostWidth { width: 0 })
        );
    }
}
