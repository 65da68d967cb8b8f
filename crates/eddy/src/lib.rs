//! eddy: adaptive projection-method time integration for incompressible
//! viscous flow.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all eddy sub-crates. For most users, adding `eddy` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use eddy::prelude::*;
//! use eddy::operators::reference_operators;
//!
//! // One periodic 8^3 level in a unit box.
//! let grid = Grid3::periodic_cube(8, 1.0).unwrap();
//! let mut levels = LevelArena::new(ArenaConfig::default()).unwrap();
//! levels.push_level(grid).unwrap();
//!
//! let physics = PhysicsConfig::default();
//! let mut config = FlowConfig {
//!     levels,
//!     operators: reference_operators(physics.fluid),
//!     stepping: StepConfig {
//!         max_step: Some(2),
//!         ..StepConfig::default()
//!     },
//!     physics,
//! };
//! config.fill_reference_density();
//! for level in config.levels.levels_mut() {
//!     level.vel.fill_component(0, 1.0);
//! }
//!
//! let mut sim = Simulation::new(config).unwrap();
//! let summary = sim.evolve(|_report, _levels| {}).unwrap();
//! assert_eq!(summary.nstep, 2);
//! assert!(summary.final_time > 0.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `eddy-core` | level ids, field slots, errors, rheology, physics constants |
//! | [`space`] | `eddy-space` | `Grid3` box geometry and edge behaviour |
//! | [`arena`] | `eddy-arena` | ghosted field buffers, per-level fields, the level arena |
//! | [`operator`] | `eddy-operator` | collaborator traits and `OperatorSet` |
//! | [`operators`] | `eddy-operators` | reference ghost fill, advection, diffusion, projection, rheology |
//! | [`engine`] | `eddy-engine` | time-step control, predictor-corrector, steady state, `Simulation` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, errors and rheology (`eddy-core`).
///
/// Contains [`types::LevelId`], [`types::LevelField`], the
/// [`types::StepError`] taxonomy, [`types::FluidModel`] and
/// [`types::PhysicsConfig`].
pub use eddy_core as types;

/// Box geometry of one refinement level (`eddy-space`).
pub use eddy_space as space;

/// Field storage (`eddy-arena`).
///
/// Most users only need [`arena::LevelArena`] and [`arena::LevelState`]
/// from this module; they are also available in the [`prelude`].
pub use eddy_arena as arena;

/// Collaborator traits (`eddy-operator`).
///
/// Implement [`operator::BoundaryFill`], [`operator::Convection`],
/// [`operator::DiffusionSolve`], [`operator::Projection`] and
/// [`operator::DerivedQuantities`] to plug in an external mesh or solver
/// library.
pub use eddy_operator as operator;

/// Reference collaborators for periodic and box domains (`eddy-operators`).
pub use eddy_operators as operators;

/// Time integration (`eddy-engine`).
///
/// [`engine::Simulation`] drives the run; [`engine::TimeStepController`],
/// [`engine::PredictorCorrector`] and [`engine::SteadyStateMonitor`] are
/// usable on their own.
pub use eddy_engine as engine;

/// Common imports for typical eddy usage.
///
/// ```rust
/// use eddy::prelude::*;
/// ```
pub mod prelude {
    // Core types and errors
    pub use eddy_core::{
        FluidModel, LevelField, LevelId, PhysicsConfig, SolverError, Stage, StepError,
    };

    // Geometry
    pub use eddy_space::{EdgeBehavior, Grid3};

    // Storage
    pub use eddy_arena::{ArenaConfig, FieldBuffer, LevelArena, LevelState};

    // Collaborators
    pub use eddy_operator::{
        BoundaryFill, Convection, DerivedQuantities, DiffusionSolve, OperatorSet, Projection,
        ProjectionFields, SolveStats,
    };

    // Engine
    pub use eddy_engine::{
        ConfigError, FlowConfig, RunSummary, Simulation, StepConfig, StepMetrics, StepReport,
    };
}
