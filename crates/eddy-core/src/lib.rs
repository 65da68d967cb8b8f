//! Core types for the eddy incompressible flow solver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other eddy crate: level identifiers,
//! the per-level field slots, the error taxonomy, the rheology models
//! and the physical constants of a run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;
pub mod physics;
pub mod rheology;

pub use error::{SolverError, Stage, StepError};
pub use field::{FieldKind, LevelField, SPACEDIM};
pub use id::LevelId;
pub use physics::{PhysicsConfig, PhysicsError};
pub use rheology::{
    Bingham, FluidModel, HerschelBulkley, Newtonian, PowerLaw, RheologyError, SouzaMendesDutra,
};
