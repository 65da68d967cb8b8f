//! Time integration for eddy flows.
//!
//! Provides the [`Simulation`] driver that advances every refinement
//! level with a second-order predictor-corrector projection step, the
//! [`TimeStepController`] that picks each step from a combined
//! convective, viscous and body-force stability bound, and the
//! [`SteadyStateMonitor`] that ends steady runs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod integrator;
pub mod metrics;
pub mod simulation;
pub mod steady;
pub mod timestep;

pub use clock::SimulationClock;
pub use config::{ConfigError, FlowConfig, StepConfig};
pub use integrator::{PredictorCorrector, StageReport};
pub use metrics::StepMetrics;
pub use simulation::{RunSummary, Simulation, StepReport};
pub use steady::{LevelConvergence, SteadyStateMonitor, SteadyStateReport};
pub use timestep::{DtDecision, DtFallback, FieldExtrema, StabilityBounds, TimeStepController};
