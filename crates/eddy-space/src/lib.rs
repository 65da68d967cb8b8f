//! Level geometry for eddy simulations.
//!
//! A refinement level is a uniform Cartesian box, described by [`Grid3`]:
//! cell counts, cell sizes and an [`EdgeBehavior`] per axis. Cells are
//! addressed with signed coordinates ([`Cell`]) so that ghost layers can
//! sit at negative indices.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod edge;
pub mod error;
pub mod grid;

pub use edge::EdgeBehavior;
pub use error::SpaceError;
pub use grid::{Cell, CellIter, Grid3};
