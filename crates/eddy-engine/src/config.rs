//! Run configuration, validation, and error types.
//!
//! [`FlowConfig`] is the input for constructing a
//! [`Simulation`](crate::Simulation). [`validate()`](FlowConfig::validate)
//! checks structural invariants once at startup; the stepping code assumes
//! validated inputs afterwards.

use std::error::Error;
use std::fmt;

use eddy_arena::{ArenaError, LevelArena};
use eddy_core::{LevelField, LevelId, PhysicsConfig, PhysicsError};
use eddy_operator::OperatorSet;

// ── StepConfig ─────────────────────────────────────────────────────

/// Time-stepping and termination parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct StepConfig {
    /// Stability safety factor applied to the combined bound. Default: 0.5.
    pub cfl: f64,
    /// Use this step verbatim instead of the adaptive one. Default: `None`.
    pub fixed_dt: Option<f64>,
    /// Stop when the velocity stops changing. Default: `false`.
    pub steady_state: bool,
    /// Tolerance of both steady-state criteria. Default: 1e-5.
    pub steady_state_tol: f64,
    /// Final simulated time. Ignored for clipping when `steady_state` is set.
    /// Default: `None`.
    pub stop_time: Option<f64>,
    /// Maximum number of steps. Default: `None`.
    pub max_step: Option<u64>,
    /// Simulated-time period of output. Steps are shortened to land on
    /// its multiples. Default: `None`.
    pub plot_per: Option<f64>,
    /// Step interval of output. Default: `None`.
    pub plot_int: Option<u64>,
    /// Project the initial velocity before the first step. Default: `true`.
    pub initial_projection: bool,
    /// Predictor passes used to converge the initial pressure gradient.
    /// Default: 3.
    pub initial_iterations: u32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            cfl: 0.5,
            fixed_dt: None,
            steady_state: false,
            steady_state_tol: 1.0e-5,
            stop_time: None,
            max_step: None,
            plot_per: None,
            plot_int: None,
            initial_projection: true,
            initial_iterations: 3,
        }
    }
}

fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

impl StepConfig {
    /// Check parameter ranges and reject termination settings that can
    /// never fire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Safety factor.
        if !positive(self.cfl) {
            return Err(ConfigError::InvalidCfl { value: self.cfl });
        }
        // 2. Fixed step, if any.
        if let Some(dt) = self.fixed_dt {
            if !positive(dt) {
                return Err(ConfigError::InvalidFixedDt { value: dt });
            }
        }
        // 3. Steady-state tolerance.
        if !positive(self.steady_state_tol) {
            return Err(ConfigError::InvalidTolerance {
                value: self.steady_state_tol,
            });
        }
        // 4. Stop time, if any.
        if let Some(t) = self.stop_time {
            if !(t.is_finite() && t >= 0.0) {
                return Err(ConfigError::InvalidStopTime { value: t });
            }
        }
        // 5. Output cadence.
        if let Some(pp) = self.plot_per {
            if !positive(pp) {
                return Err(ConfigError::InvalidPlotPeriod { value: pp });
            }
        }
        if self.plot_int == Some(0) {
            return Err(ConfigError::ZeroPlotInterval);
        }
        // 6. Something must end the run.
        if !self.steady_state && self.stop_time.is_none() && self.max_step.is_none() {
            return Err(ConfigError::Unbounded);
        }
        // 7. Plot alignment must be reachable.
        if let (Some(plot_per), Some(stop_time)) = (self.plot_per, self.stop_time) {
            if plot_per > stop_time {
                return Err(ConfigError::PlotPeriodBeyondStop {
                    plot_per,
                    stop_time,
                });
            }
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`FlowConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Arena configuration is invalid.
    Arena(ArenaError),
    /// Physical constants are invalid.
    Physics(PhysicsError),
    /// The arena holds no level.
    NoLevels,
    /// A level has fewer ghost layers than the stencils read.
    GhostWidthTooSmall {
        /// The offending level.
        level: LevelId,
        /// Its ghost width.
        ghost: usize,
    },
    /// A level's density is not positive everywhere it is uncovered.
    NonPositiveDensity {
        /// The offending level.
        level: LevelId,
        /// Smallest uncovered density found.
        value: f64,
    },
    /// `cfl` is NaN, infinite, zero, or negative.
    InvalidCfl {
        /// The rejected value.
        value: f64,
    },
    /// `fixed_dt` is NaN, infinite, zero, or negative.
    InvalidFixedDt {
        /// The rejected value.
        value: f64,
    },
    /// `steady_state_tol` is NaN, infinite, zero, or negative.
    InvalidTolerance {
        /// The rejected value.
        value: f64,
    },
    /// `stop_time` is NaN, infinite, or negative.
    InvalidStopTime {
        /// The rejected value.
        value: f64,
    },
    /// `plot_per` is NaN, infinite, zero, or negative.
    InvalidPlotPeriod {
        /// The rejected value.
        value: f64,
    },
    /// `plot_int` is zero.
    ZeroPlotInterval,
    /// Neither steady state, `stop_time`, nor `max_step` can end the run.
    Unbounded,
    /// `plot_per` exceeds `stop_time`, so no output time is ever reached.
    PlotPeriodBeyondStop {
        /// The configured period.
        plot_per: f64,
        /// The configured stop time.
        stop_time: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::Physics(e) => write!(f, "physics: {e}"),
            Self::NoLevels => write!(f, "no level allocated"),
            Self::GhostWidthTooSmall { level, ghost } => {
                write!(f, "level {level} has {ghost} ghost layers, need at least 1")
            }
            Self::NonPositiveDensity { level, value } => {
                write!(f, "level {level} has non-positive density {value}")
            }
            Self::InvalidCfl { value } => {
                write!(f, "cfl must be finite and positive, got {value}")
            }
            Self::InvalidFixedDt { value } => {
                write!(f, "fixed_dt must be finite and positive, got {value}")
            }
            Self::InvalidTolerance { value } => {
                write!(f, "steady_state_tol must be finite and positive, got {value}")
            }
            Self::InvalidStopTime { value } => {
                write!(f, "stop_time must be finite and non-negative, got {value}")
            }
            Self::InvalidPlotPeriod { value } => {
                write!(f, "plot_per must be finite and positive, got {value}")
            }
            Self::ZeroPlotInterval => write!(f, "plot_int must be at least 1"),
            Self::Unbounded => write!(
                f,
                "run never ends: set steady_state, stop_time or max_step"
            ),
            Self::PlotPeriodBeyondStop {
                plot_per,
                stop_time,
            } => write!(f, "plot_per {plot_per} exceeds stop_time {stop_time}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::Physics(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<PhysicsError> for ConfigError {
    fn from(e: PhysicsError) -> Self {
        Self::Physics(e)
    }
}

// ── FlowConfig ─────────────────────────────────────────────────────

/// Complete configuration for constructing a simulation.
///
/// The arena carries the initial condition: velocity, density and
/// covered masks are written by the caller before construction.
pub struct FlowConfig {
    /// Per-level fields, coarsest first.
    pub levels: LevelArena,
    /// Boundary, convection, diffusion, projection and derived-quantity
    /// collaborators.
    pub operators: OperatorSet,
    /// Time stepping and termination.
    pub stepping: StepConfig,
    /// Physical constants and rheology.
    pub physics: PhysicsConfig,
}

impl FlowConfig {
    /// Set the density of every level to `physics.ro_0`, ghosts included.
    pub fn fill_reference_density(&mut self) {
        let ro_0 = self.physics.ro_0;
        for level in self.levels.levels_mut() {
            level.ro.fill(ro_0);
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. At least one level.
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        self.levels.config().validate()?;
        // 2. Stepping.
        self.stepping.validate()?;
        // 3. Physics.
        self.physics.validate()?;
        for (i, level) in self.levels.levels().iter().enumerate() {
            let id = LevelId::from(i);
            // 4. Ghost layers for the centred stencils.
            if level.ghost() < 1 {
                return Err(ConfigError::GhostWidthTooSmall {
                    level: id,
                    ghost: level.ghost(),
                });
            }
            // 5. Density is divided by in every stage.
            if level.uncovered_count() > 0 {
                let ro_min = level.min_value(LevelField::Density, 0);
                if !positive(ro_min) {
                    return Err(ConfigError::NonPositiveDensity {
                        level: id,
                        value: ro_min,
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfig")
            .field("num_levels", &self.levels.num_levels())
            .field("operators", &self.operators)
            .field("stepping", &self.stepping)
            .field("physics", &self.physics)
            .finish()
    }
}
