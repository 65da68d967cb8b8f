//! The step driver.
//!
//! [`Simulation`] owns the level arena, the collaborators and the clock.
//! Each [`advance()`](Simulation::advance) runs one complete step:
//! ghost fill → compute dt → predictor → corrector → NaN check → clock
//! update → output and steady-state bookkeeping.
//!
//! # Ownership model
//!
//! `Simulation` is [`Send`] but not shared. All mutating methods take
//! `&mut self`; the integrator borrows the levels for the duration of a
//! step and nothing else can observe them mid-step. Step boundaries are
//! the only interruption points.
//!
//! # Failure
//!
//! A failed step returns the error with the clock exactly as it was
//! before the call. The field state may be partially updated.

use std::time::Instant;

use eddy_arena::LevelArena;
use eddy_core::{PhysicsConfig, StepError};
use eddy_operator::{OperatorSet, SolveStats};

use crate::clock::SimulationClock;
use crate::config::{ConfigError, FlowConfig, StepConfig};
use crate::integrator::PredictorCorrector;
use crate::metrics::StepMetrics;
use crate::steady::{SteadyStateMonitor, SteadyStateReport};
use crate::timestep::{DtDecision, DtFallback, TimeStepController};

// Compile-time assertion: Simulation is Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Simulation>();
    }
};

/// Distance from a `plot_per` multiple at which output is due, relative
/// to the larger of `plot_per` and the current time.
const PLOT_TIME_TOL: f64 = 1.0e-12;

/// `x - n y` with `n` the integer nearest `x / y`.
fn remainder(x: f64, y: f64) -> f64 {
    x - (x / y).round() * y
}

// ── StepReport ──────────────────────────────────────────────────

/// Result of a successful [`Simulation::advance()`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    /// Completed steps, including this one.
    pub nstep: u64,
    /// Simulated time at the end of the step.
    pub time: f64,
    /// Step size taken.
    pub dt: f64,
    /// How the step size was chosen.
    pub decision: DtDecision,
    /// Output is due after this step.
    pub plot_due: bool,
    /// Steady-state evaluation, when running to steady state.
    pub steady: Option<SteadyStateReport>,
    /// Timings and solver effort.
    pub metrics: StepMetrics,
}

/// Result of [`Simulation::evolve()`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Steps taken by this call.
    pub steps: u64,
    /// Simulated time at the end of the run.
    pub final_time: f64,
    /// Completed steps since the start of the simulation.
    pub nstep: u64,
    /// The run ended because steady state was reached.
    pub steady_state: bool,
}

// ── Simulation ──────────────────────────────────────────────────

/// A single-level or multi-level flow advanced one step at a time.
///
/// Created from a [`FlowConfig`] via [`new()`](Simulation::new). The
/// first [`advance()`](Simulation::advance) runs the initial projection
/// and pressure iterations unless [`initialize()`](Simulation::initialize)
/// was called explicitly.
///
/// # Example
///
/// ```ignore
/// let mut sim = Simulation::new(config)?;
/// let summary = sim.evolve(|report, _levels| {
///     if report.plot_due {
///         // write output
///     }
/// })?;
/// ```
pub struct Simulation {
    levels: LevelArena,
    operators: OperatorSet,
    stepping: StepConfig,
    physics: PhysicsConfig,
    clock: SimulationClock,
    controller: TimeStepController,
    monitor: SteadyStateMonitor,
    initialized: bool,
    last_steady: Option<SteadyStateReport>,
}

impl Simulation {
    /// Validate `config` and build a simulation at `t = 0`.
    pub fn new(config: FlowConfig) -> Result<Self, ConfigError> {
        Self::build(config, SimulationClock::new(), false)
    }

    /// Validate `config` and continue from a saved clock.
    ///
    /// The arena must hold the saved state, including `gp`; the initial
    /// projection and iterations are skipped.
    pub fn resume(config: FlowConfig, clock: SimulationClock) -> Result<Self, ConfigError> {
        Self::build(config, clock, true)
    }

    fn build(
        config: FlowConfig,
        clock: SimulationClock,
        initialized: bool,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let FlowConfig {
            levels,
            operators,
            stepping,
            physics,
        } = config;
        log::info!(
            "{} level(s), finest {:?}, fluid {}, operators {:?}",
            levels.num_levels(),
            levels.finest_grid().map(|g| g.cells()),
            physics.fluid.name(),
            operators.names()
        );
        Ok(Self {
            controller: TimeStepController::new(&stepping, &physics),
            monitor: SteadyStateMonitor::new(stepping.steady_state_tol),
            levels,
            operators,
            stepping,
            physics,
            clock,
            initialized,
            last_steady: None,
        })
    }

    // ── Initialization ──────────────────────────────────────────

    /// Run the configured initial projection and initial iterations.
    ///
    /// Runs at most once; later calls return immediately. On failure the
    /// clock is left as it was.
    pub fn initialize(&mut self) -> Result<(), StepError> {
        if self.initialized {
            return Ok(());
        }
        if self.levels.is_empty() {
            return Err(StepError::NoLevels);
        }
        let saved = self.clock.clone();
        let result = self.run_initialization();
        if result.is_ok() {
            self.initialized = true;
        } else {
            self.clock = saved;
        }
        result
    }

    fn run_initialization(&mut self) -> Result<(), StepError> {
        if self.stepping.initial_projection {
            self.initial_projection()?;
        }
        if self.stepping.initial_iterations > 0 {
            self.initial_iterations()?;
        }
        Ok(())
    }

    /// Project the initial velocity and zero the pressure.
    ///
    /// Leaves the clock untouched.
    pub fn initial_projection(&mut self) -> Result<SolveStats, StepError> {
        let pc = PredictorCorrector::new(&self.operators, &self.physics);
        let stats = pc.initial_projection(self.levels.levels_mut(), self.clock.cur_time())?;
        log::info!(
            "Initial projection: {} iterations, residual {:e}",
            stats.iterations,
            stats.residual
        );
        Ok(stats)
    }

    /// Converge the lagged pressure gradient for the initial velocity.
    ///
    /// Adopts a reduced step size, then runs the predictor
    /// `initial_iterations` times, restoring the velocity after each pass.
    /// `nstep` and `cur_time` are unchanged; `gp` and `p` are updated.
    pub fn initial_iterations(&mut self) -> Result<(), StepError> {
        let n = self.stepping.initial_iterations;
        let time = self.clock.cur_time();
        let pc = PredictorCorrector::new(&self.operators, &self.physics);
        let levels = self.levels.levels_mut();

        pc.fill_scalar_bc(levels, time);
        pc.fill_velocity_bc(levels, time);
        let decision = self
            .controller
            .compute_dt(levels, &self.clock, true)
            .ok_or(StepError::NoLevels)?;
        let dt = decision.dt;
        self.clock.begin_step(dt, levels.len());
        for level in levels.iter_mut() {
            level.save_velocity();
        }

        for iter in 0..n {
            let stage = pc.initial_iteration(levels, time, dt)?;
            for level in levels.iter_mut() {
                level.restore_velocity();
            }
            pc.fill_velocity_bc(levels, time);
            log::debug!(
                "initial iteration {}: projection {} iterations",
                iter + 1,
                stage.projection.iterations
            );
        }
        log::info!("Initial iterations: {n} with dt = {dt:e}");
        Ok(())
    }

    // ── Stepping ────────────────────────────────────────────────

    /// Advance every level by one step.
    ///
    /// Initializes first if that has not happened yet.
    pub fn advance(&mut self) -> Result<StepReport, StepError> {
        if self.levels.is_empty() {
            return Err(StepError::NoLevels);
        }
        let saved = self.clock.clone();
        match self.initialize().and_then(|()| self.run_step()) {
            Ok(report) => Ok(report),
            Err(e) => {
                self.clock = saved;
                Err(e)
            }
        }
    }

    fn run_step(&mut self) -> Result<StepReport, StepError> {
        let start = Instant::now();
        let mut metrics = StepMetrics::default();
        let cur_time = self.clock.cur_time();
        let pc = PredictorCorrector::new(&self.operators, &self.physics);
        let levels = self.levels.levels_mut();

        // 1. Ghosts of the state the step starts from.
        pc.fill_scalar_bc(levels, cur_time);
        pc.fill_velocity_bc(levels, cur_time);

        // 2. Step size.
        let t = Instant::now();
        let decision = self
            .controller
            .compute_dt(levels, &self.clock, false)
            .ok_or(StepError::NoLevels)?;
        metrics.compute_dt_us = t.elapsed().as_micros() as u64;
        let dt = decision.dt;

        // 3-4.
        self.clock.begin_step(dt, levels.len());
        for level in levels.iter_mut() {
            level.save_velocity();
        }
        log::info!(
            "Step {}: from old_time {cur_time} to new time {} with dt = {dt}",
            self.clock.nstep() + 1,
            cur_time + dt
        );

        // 5.
        let predictor = pc.apply_predictor(levels, cur_time, dt)?;
        let corrector = pc.apply_corrector(levels, cur_time, dt)?;
        PredictorCorrector::check_finite(levels)?;
        metrics.predictor_us = predictor.elapsed_us;
        metrics.corrector_us = corrector.elapsed_us;
        metrics.diffusion_iterations = [
            predictor.diffusion.iterations,
            corrector.diffusion.iterations,
        ];
        metrics.projection_iterations = [
            predictor.projection.iterations,
            corrector.projection.iterations,
        ];

        // 6.
        self.clock.end_step();

        // 7.
        if decision.plot_aligned {
            self.clock.mark_plot_stop();
        }
        let plot_due = self.plot_due(&decision);
        if plot_due {
            self.clock.mark_plot();
        }

        let steady = if self.stepping.steady_state {
            let t = Instant::now();
            let report = self
                .monitor
                .check(self.levels.levels(), dt, self.clock.nstep());
            metrics.steady_check_us = t.elapsed().as_micros() as u64;
            Some(report)
        } else {
            None
        };
        self.last_steady = steady.clone();

        metrics.memory_bytes = self.levels.memory_bytes();
        metrics.total_us = start.elapsed().as_micros() as u64;

        // 8.
        Ok(StepReport {
            nstep: self.clock.nstep(),
            time: self.clock.cur_time(),
            dt,
            decision,
            plot_due,
            steady,
            metrics,
        })
    }

    /// Step until [`is_finished()`](Simulation::is_finished), calling
    /// `observer` after every step.
    pub fn evolve<F>(&mut self, mut observer: F) -> Result<RunSummary, StepError>
    where
        F: FnMut(&StepReport, &LevelArena),
    {
        self.initialize()?;
        let mut steps = 0;
        while !self.is_finished() {
            let report = self.advance()?;
            steps += 1;
            observer(&report, &self.levels);
        }

        let steady_state = self.reached_steady_state();
        if steady_state {
            log::info!(
                "Steady state reached after {} steps at time {}",
                self.clock.nstep(),
                self.clock.cur_time()
            );
        }
        Ok(RunSummary {
            steps,
            final_time: self.clock.cur_time(),
            nstep: self.clock.nstep(),
            steady_state,
        })
    }

    // ── Termination ─────────────────────────────────────────────

    /// Evaluate the steady-state criteria on the current fields.
    ///
    /// `false` before the first step and for `nstep < 2`.
    pub fn steady_state_reached(&self) -> bool {
        self.steady_state_report().is_some_and(|r| r.reached)
    }

    /// Per-level steady-state statistics of the current fields, or `None`
    /// before the first step.
    pub fn steady_state_report(&self) -> Option<SteadyStateReport> {
        let dt = self.clock.previous_dt()?;
        Some(
            self.monitor
                .check(self.levels.levels(), dt, self.clock.nstep()),
        )
    }

    /// Whether the run has met its termination condition.
    pub fn is_finished(&self) -> bool {
        let max_step_reached = self
            .stepping
            .max_step
            .is_some_and(|m| self.clock.nstep() >= m);
        if self.stepping.steady_state {
            return max_step_reached || self.reached_steady_state();
        }
        let dt = self.clock.previous_dt().unwrap_or(0.0);
        let stop_reached = self
            .stepping
            .stop_time
            .is_some_and(|stop| self.clock.cur_time() >= stop - 1.0e-12 * dt);
        max_step_reached || stop_reached
    }

    fn reached_steady_state(&self) -> bool {
        self.last_steady.as_ref().is_some_and(|r| r.reached)
    }

    fn plot_due(&self, decision: &DtDecision) -> bool {
        let by_step = self
            .stepping
            .plot_int
            .is_some_and(|n| self.clock.nstep() % n == 0);
        // A step shortened onto a plot time and not cut further lands on it.
        let landed = decision.plot_aligned
            && !decision.stop_clipped
            && decision.fallback != Some(DtFallback::DegenerateStep)
            && decision.dt == decision.stable_dt;
        let by_time = self.stepping.plot_per.is_some_and(|pp| {
            let time = self.clock.cur_time();
            landed || remainder(time, pp).abs() < PLOT_TIME_TOL * pp.max(time)
        });
        by_step || by_time
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Time state.
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// All levels.
    pub fn levels(&self) -> &LevelArena {
        &self.levels
    }

    /// Mutable access to the levels between steps, for regridding or
    /// writing a new initial condition.
    pub fn levels_mut(&mut self) -> &mut LevelArena {
        &mut self.levels
    }

    /// The collaborators.
    pub fn operators(&self) -> &OperatorSet {
        &self.operators
    }

    /// Stepping parameters.
    pub fn stepping(&self) -> &StepConfig {
        &self.stepping
    }

    /// Physical constants.
    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// The step-size controller.
    pub fn controller(&self) -> &TimeStepController {
        &self.controller
    }

    /// Steady-state evaluation of the latest step, if one ran.
    pub fn last_steady_report(&self) -> Option<&SteadyStateReport> {
        self.last_steady.as_ref()
    }

    /// Consume the simulation and return its levels.
    pub fn into_levels(self) -> LevelArena {
        self.levels
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("num_levels", &self.levels.num_levels())
            .field("operators", &self.operators)
            .field("clock", &self.clock)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
