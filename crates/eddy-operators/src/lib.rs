//! Reference collaborators for eddy simulations on single-box levels.
//!
//! These operators make the integrator runnable end to end without an
//! external mesh-refinement or linear-solver library:
//!
//! - [`GhostFill`]: periodic, zero-gradient and zero-value ghost fills
//! - [`AdvectiveTerm`]: centred or first-order upwind `-(u.grad)u`
//! - [`ImplicitDiffusion`]: Jacobi-preconditioned CG on the variable
//!   viscosity Helmholtz operator
//! - [`ApproximateProjection`]: cell-centred projection on fully
//!   periodic boxes
//! - [`RheologyUpdate`]: strain rate, effective viscosity, vorticity and
//!   divergence
//!
//! The shared numerics live in [`stencil`] and [`krylov`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod advection;
pub mod diffusion;
pub mod ghost;
pub mod krylov;
pub mod projection;
pub mod rheology;
pub mod stencil;

pub use advection::{AdvectionScheme, AdvectiveTerm};
pub use diffusion::ImplicitDiffusion;
pub use ghost::GhostFill;
pub use krylov::{CgConfig, CgOutcome, LinearOperator};
pub use projection::ApproximateProjection;
pub use rheology::RheologyUpdate;

use eddy_core::FluidModel;
use eddy_operator::OperatorSet;

/// All five reference operators with default settings: centred
/// advection and Jacobi-preconditioned CG for both implicit solves.
pub fn reference_operators(fluid: FluidModel) -> OperatorSet {
    OperatorSet::new(
        GhostFill,
        AdvectiveTerm::default(),
        ImplicitDiffusion::default(),
        ApproximateProjection::default(),
        RheologyUpdate::new(fluid),
    )
}
