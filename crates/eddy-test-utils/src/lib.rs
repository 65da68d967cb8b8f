//! Test utilities and mock collaborators for eddy development.
//!
//! Provides a shared [`CallLog`] that mock collaborators append to, the
//! mocks themselves in [`fixtures`], and ready-made grids, level arenas
//! and seeded random velocity fields in [`flows`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod flows;

use std::sync::{Arc, Mutex, MutexGuard};

pub use fixtures::{
    recording_operators, FailingDiffusion, FailingProjection, RecordingBoundary,
    RecordingConvection, RecordingDerived, RecordingDiffusion, RecordingProjection,
};
pub use flows::{periodic_grid, random_velocity, scenario_arena, set_uniform, uniform_flow};

/// One collaborator invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    /// Which collaborator method ran, e.g. `"convection"`.
    pub op: &'static str,
    /// The `time` argument, if the method takes one.
    pub time: Option<f64>,
    /// `dt` for diffusion, `scale` for projection.
    pub arg: Option<f64>,
}

/// Shared, clonable record of collaborator invocations in call order.
///
/// Every mock holds a clone; tests inspect the log after driving the
/// integrator.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a call.
    pub fn record(&self, op: &'static str, time: Option<f64>, arg: Option<f64>) {
        self.lock().push(Call { op, time, arg });
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Operation names in call order.
    pub fn ops(&self) -> Vec<&'static str> {
        self.lock().iter().map(|c| c.op).collect()
    }

    /// Calls to `op`, in order.
    pub fn calls_to(&self, op: &str) -> Vec<Call> {
        self.lock().iter().filter(|c| c.op == op).cloned().collect()
    }

    /// Number of calls to `op`.
    pub fn count(&self, op: &str) -> usize {
        self.lock().iter().filter(|c| c.op == op).count()
    }

    /// Operation names with ghost fills removed.
    pub fn ops_without_fills(&self) -> Vec<&'static str> {
        self.lock()
            .iter()
            .map(|c| c.op)
            .filter(|op| *op != "fill_boundary" && *op != "fill_physical_bc")
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_log() {
        let log = CallLog::new();
        let other = log.clone();
        other.record("convection", Some(0.0), None);
        log.record("fill_boundary", None, None);
        log.record("projection", Some(0.1), Some(0.1));
        assert_eq!(log.len(), 3);
        assert_eq!(other.ops(), ["convection", "fill_boundary", "projection"]);
        assert_eq!(log.ops_without_fills(), ["convection", "projection"]);
        assert_eq!(log.calls_to("projection")[0].arg, Some(0.1));
        log.clear();
        assert!(other.is_empty());
    }
}
