//! Level-state storage for eddy simulations.
//!
//! Every refinement level owns one [`LevelState`]: the velocity, pressure,
//! density and viscosity fields of that level plus its scratch slots, each
//! held in a [`FieldBuffer`] padded with ghost layers. The [`LevelArena`]
//! owns all levels; the time integrator borrows it mutably for the
//! duration of a step.
//!
//! Reductions ([`FieldBuffer::max_abs`], [`FieldBuffer::sum_abs`], ...)
//! skip cells flagged in the level's covered mask, i.e. cells overlaid by
//! a finer level or lying inside solid geometry.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod buffer;
pub mod config;
pub mod error;
pub mod level;

pub use arena::LevelArena;
pub use buffer::FieldBuffer;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use level::{LevelState, Norm};
