//! Simulated time, step counter and per-level time bookkeeping.

use smallvec::SmallVec;

/// The time state of a run.
///
/// Created at construction, updated only at step boundaries by the
/// [`Simulation`](crate::Simulation). Readers get copies of scalars; the
/// mutators are crate-private.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationClock {
    cur_time: f64,
    /// Negative until the first step size is adopted.
    dt: f64,
    nstep: u64,
    t_old: SmallVec<[f64; 8]>,
    t_new: SmallVec<[f64; 8]>,
    last_plot_step: Option<u64>,
    last_plot_stop: Option<u64>,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationClock {
    /// A clock at `t = 0`, step 0, with no previous step size.
    pub fn new() -> Self {
        Self {
            cur_time: 0.0,
            dt: -1.0,
            nstep: 0,
            t_old: SmallVec::new(),
            t_new: SmallVec::new(),
            last_plot_step: None,
            last_plot_stop: None,
        }
    }

    /// A clock resumed from saved state, as after a restart.
    ///
    /// Non-positive or non-finite `previous_dt` values are treated as
    /// absent.
    pub fn resume(
        cur_time: f64,
        nstep: u64,
        previous_dt: Option<f64>,
        last_plot_step: Option<u64>,
    ) -> Self {
        let dt = match previous_dt {
            Some(dt) if dt.is_finite() && dt > 0.0 => dt,
            _ => -1.0,
        };
        Self {
            cur_time,
            dt,
            nstep,
            last_plot_step,
            ..Self::new()
        }
    }

    /// Time at the start of the next step.
    pub fn cur_time(&self) -> f64 {
        self.cur_time
    }

    /// Most recently adopted step size.
    pub fn previous_dt(&self) -> Option<f64> {
        (self.dt > 0.0).then_some(self.dt)
    }

    /// Completed steps.
    pub fn nstep(&self) -> u64 {
        self.nstep
    }

    /// `cur_time + dt`: the time the current step advances to.
    pub fn new_time(&self) -> f64 {
        self.cur_time + self.dt.max(0.0)
    }

    /// Step after which output was last due.
    pub fn last_plot_step(&self) -> Option<u64> {
        self.last_plot_step
    }

    /// Whether output was due at the end of the latest step.
    pub fn plotted_last_step(&self) -> bool {
        self.last_plot_step == Some(self.nstep)
    }

    /// Record that the latest completed step was shortened to land on a
    /// plot time, as when resuming a run that stopped for output.
    pub fn with_plot_stop(mut self) -> Self {
        self.last_plot_stop = Some(self.nstep);
        self
    }

    /// Step that was last shortened to land on a plot time.
    pub fn last_plot_stop(&self) -> Option<u64> {
        self.last_plot_stop
    }

    /// Whether the latest step was shortened to land on a plot time.
    pub fn stopped_for_plot_last_step(&self) -> bool {
        self.last_plot_stop == Some(self.nstep)
    }

    /// Start time of the step in flight on `level`.
    pub fn t_old(&self, level: usize) -> Option<f64> {
        self.t_old.get(level).copied()
    }

    /// End time of the step in flight on `level`.
    pub fn t_new(&self, level: usize) -> Option<f64> {
        self.t_new.get(level).copied()
    }

    pub(crate) fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
    }

    /// Adopt `dt` and set `t_new - t_old == dt` on every level.
    pub(crate) fn begin_step(&mut self, dt: f64, num_levels: usize) {
        self.dt = dt;
        self.t_old.clear();
        self.t_new.clear();
        self.t_old.resize(num_levels, self.cur_time);
        self.t_new.resize(num_levels, self.cur_time + dt);
    }

    /// Close the step in flight.
    pub(crate) fn end_step(&mut self) {
        self.nstep += 1;
        self.cur_time += self.dt;
    }

    pub(crate) fn mark_plot(&mut self) {
        self.last_plot_step = Some(self.nstep);
    }

    pub(crate) fn mark_plot_stop(&mut self) {
        self.last_plot_stop = Some(self.nstep);
    }
}
