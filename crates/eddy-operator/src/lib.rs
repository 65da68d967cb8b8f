//! Collaborator traits for the eddy time integrator.
//!
//! The integrator does not discretize anything itself. Each stage calls
//! out to five operators, all stateless `&self` trait objects bundled in
//! an [`OperatorSet`]:
//!
//! - [`BoundaryFill`]: ghost-cell exchange and domain-face values
//! - [`Convection`]: the explicit advective term `-(u.grad)u`
//! - [`DiffusionSolve`]: the implicit viscous update
//! - [`Projection`]: the elliptic pressure projection
//! - [`DerivedQuantities`]: strain rate, viscosity and diagnostics

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod convection;
pub mod derived;
pub mod diffusion;
pub mod projection;
pub mod set;

pub use boundary::BoundaryFill;
pub use convection::Convection;
pub use derived::DerivedQuantities;
pub use diffusion::{DiffusionSolve, SolveStats};
pub use projection::{Projection, ProjectionFields};
pub use set::OperatorSet;
