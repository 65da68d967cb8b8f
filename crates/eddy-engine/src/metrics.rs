//! Per-step performance metrics.
//!
//! [`StepMetrics`] captures timing, solver effort and memory for a single
//! step, for logging and profiling.

/// Timing and solver metrics collected during a single step.
///
/// All durations are in microseconds. Iteration counts are indexed
/// `[predictor, corrector]` and summed over levels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent choosing the step size.
    pub compute_dt_us: u64,
    /// Time spent in the predictor stage.
    pub predictor_us: u64,
    /// Time spent in the corrector stage.
    pub corrector_us: u64,
    /// Time spent in the steady-state check. Zero when it did not run.
    pub steady_check_us: u64,
    /// Diffusion solve iterations per stage.
    pub diffusion_iterations: [usize; 2],
    /// Projection iterations per stage.
    pub projection_iterations: [usize; 2],
    /// Memory held by the level arena after the step, in bytes.
    pub memory_bytes: usize,
}

impl StepMetrics {
    /// Diffusion plus projection iterations over both stages.
    pub fn solver_iterations(&self) -> usize {
        self.diffusion_iterations.iter().sum::<usize>()
            + self.projection_iterations.iter().sum::<usize>()
    }
}
