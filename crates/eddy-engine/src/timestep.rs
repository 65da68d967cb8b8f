//! Adaptive step-size selection.
//!
//! The stable step comes from the combined bound of Kang et al.:
//!
//! ```text
//! conv = max_d |u_d|_max / dx_d
//! diff = 2 * eta_max / rho_min * sum_d 1 / dx_d^2
//! forc = sum_d |g_d - |gp0_d|| / dx_d
//! comb = (conv + diff) + sqrt((conv + diff)^2 + 4 forc)
//! dt   = 2 cfl / comb
//! ```
//!
//! followed by a fixed sequence of guards, see
//! [`TimeStepController::compute_dt`].

use eddy_arena::{LevelState, Norm};
use eddy_core::{LevelField, PhysicsConfig};
use eddy_space::Grid3;

use crate::clock::SimulationClock;
use crate::config::StepConfig;

// ── FieldExtrema ───────────────────────────────────────────────────

/// Field extrema over uncovered cells of every level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldExtrema {
    /// Largest `|u_d|` per component.
    pub vel_max: [f64; 3],
    /// Smallest density.
    pub ro_min: f64,
    /// Largest viscosity.
    pub eta_max: f64,
}

impl FieldExtrema {
    /// Reduce across `levels`.
    ///
    /// With no uncovered cell at all, `ro_min` stays at `1e20` and the
    /// diffusive bound vanishes.
    pub fn gather(levels: &[LevelState]) -> Self {
        let mut out = Self {
            vel_max: [0.0; 3],
            ro_min: 1.0e20,
            eta_max: 0.0,
        };
        for level in levels {
            for (d, v) in out.vel_max.iter_mut().enumerate() {
                *v = v.max(level.norm(LevelField::Velocity, d, Norm::Max));
            }
            out.ro_min = out.ro_min.min(level.min_value(LevelField::Density, 0));
            out.eta_max = out.eta_max.max(level.norm(LevelField::Viscosity, 0, Norm::Max));
        }
        out
    }
}

// ── StabilityBounds ────────────────────────────────────────────────

/// The three rate bounds and their combination, in 1/time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StabilityBounds {
    /// Convective rate.
    pub conv: f64,
    /// Diffusive rate.
    pub diff: f64,
    /// Body-force term.
    pub forc: f64,
    /// Combined rate.
    pub comb: f64,
}

impl StabilityBounds {
    /// Evaluate the bounds on the grid spacing `dx`.
    pub fn new(extrema: &FieldExtrema, dx: [f64; 3], physics: &PhysicsConfig) -> Self {
        let idx = dx.map(|h| 1.0 / h);
        let conv = (0..3)
            .map(|d| extrema.vel_max[d] * idx[d])
            .fold(0.0, f64::max);
        let inv_dx2: f64 = idx.iter().map(|i| i * i).sum();
        let diff = 2.0 * extrema.eta_max / extrema.ro_min * inv_dx2;
        let forc: f64 = (0..3)
            .map(|d| (physics.gravity[d] - physics.gp0[d].abs()).abs() * idx[d])
            .sum();
        let cd = conv + diff;
        let comb = cd + (cd * cd + 4.0 * forc).sqrt();
        Self {
            conv,
            diff,
            forc,
            comb,
        }
    }
}

// ── DtDecision ─────────────────────────────────────────────────────

/// Why the step was set to half the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DtFallback {
    /// The combined bound was at or below machine epsilon.
    DegenerateBound,
    /// The aligned or clipped step fell below machine epsilon.
    DegenerateStep,
}

/// Outcome of [`TimeStepController::compute_dt`].
#[derive(Clone, Debug, PartialEq)]
pub struct DtDecision {
    /// The rate bounds the step was derived from.
    pub bounds: StabilityBounds,
    /// Step after every guard, before a fixed-step override.
    pub stable_dt: f64,
    /// Step to adopt.
    pub dt: f64,
    /// The fallback that fired last, if any.
    pub fallback: Option<DtFallback>,
    /// The growth limiter reduced the step.
    pub growth_limited: bool,
    /// The step was shortened to land on a plot time.
    pub plot_aligned: bool,
    /// The step was shortened to land on the stop time.
    pub stop_clipped: bool,
    /// A configured fixed step exceeds `stable_dt`.
    pub fixed_dt_violation: bool,
}

// ── TimeStepController ─────────────────────────────────────────────

/// Computes a stable step from the current fields.
#[derive(Clone, Debug)]
pub struct TimeStepController {
    cfl: f64,
    fixed_dt: Option<f64>,
    steady_state: bool,
    stop_time: Option<f64>,
    plot_per: Option<f64>,
    physics: PhysicsConfig,
}

impl TimeStepController {
    /// Growth cap relative to the previous step.
    pub const MAX_GROWTH: f64 = 1.1;

    /// Scale of the first step.
    pub const INITIAL_SCALE: f64 = 0.1;

    /// Capture the stepping parameters and body forces of a run.
    pub fn new(stepping: &StepConfig, physics: &PhysicsConfig) -> Self {
        Self {
            cfl: stepping.cfl,
            fixed_dt: stepping.fixed_dt,
            steady_state: stepping.steady_state,
            stop_time: stepping.stop_time,
            plot_per: stepping.plot_per,
            physics: physics.clone(),
        }
    }

    /// Compute the step for `levels`, using the finest grid's spacing.
    ///
    /// Returns `None` when `levels` is empty.
    pub fn compute_dt(
        &self,
        levels: &[LevelState],
        clock: &SimulationClock,
        initial: bool,
    ) -> Option<DtDecision> {
        let finest = levels.last()?.grid();
        Some(self.compute_dt_from(&FieldExtrema::gather(levels), finest, clock, initial))
    }

    /// Compute the step from precomputed extrema.
    ///
    /// The guard order is fixed; later guards can undo earlier ones.
    ///
    /// 1. `dt = 2 cfl / comb`, times 0.1 when `initial`
    /// 2. `comb <= eps`: half the previous step
    /// 3. growth cap `1.1 * previous`, skipped right after a step that was
    ///    shortened to land on a plot time
    /// 4. shorten to the first `plot_per` multiple crossed
    /// 5. clip to `stop_time` unless running to steady state
    /// 6. `dt < eps`: half the previous step
    /// 7. a fixed step replaces the result, with a warning if it is larger
    pub fn compute_dt_from(
        &self,
        extrema: &FieldExtrema,
        finest: &Grid3,
        clock: &SimulationClock,
        initial: bool,
    ) -> DtDecision {
        let eps = f64::EPSILON;
        let bounds = StabilityBounds::new(extrema, finest.cell_size(), &self.physics);
        let cur_time = clock.cur_time();
        let previous = clock.previous_dt();
        // Half of the previous step; a unit reference speed stands in for it
        // before the first step.
        let fallback_dt =
            (0.5 * previous.unwrap_or(self.cfl * finest.min_cell_size())).max(eps);

        let mut fallback = None;
        let mut growth_limited = false;
        let mut plot_aligned = false;
        let mut stop_clipped = false;

        let mut dt_new = 2.0 * self.cfl / bounds.comb;
        if initial {
            dt_new *= Self::INITIAL_SCALE;
        }

        if bounds.comb <= eps {
            dt_new = fallback_dt;
            fallback = Some(DtFallback::DegenerateBound);
            log::warn!(
                "combined stability bound {:e} is degenerate, falling back to dt = {dt_new:e}",
                bounds.comb
            );
        }

        if let Some(prev) = previous {
            if !clock.stopped_for_plot_last_step() && dt_new > Self::MAX_GROWTH * prev {
                dt_new = Self::MAX_GROWTH * prev;
                growth_limited = true;
            }
        }

        if let Some(pp) = self.plot_per {
            let reached = ((cur_time + eps) / pp).trunc();
            if ((cur_time + dt_new + eps) / pp).trunc() > reached {
                dt_new = (reached + 1.0) * pp - cur_time;
                plot_aligned = true;
            }
        }

        if !self.steady_state {
            if let Some(stop) = self.stop_time.filter(|&s| s > 0.0) {
                if cur_time + dt_new > stop {
                    dt_new = stop - cur_time;
                    stop_clipped = true;
                }
            }
        }

        if dt_new < eps {
            dt_new = fallback_dt;
            fallback = Some(DtFallback::DegenerateStep);
            log::warn!("step fell below machine epsilon, falling back to dt = {dt_new:e}");
        }

        log::debug!(
            "compute_dt: conv {:e} diff {:e} forc {:e} comb {:e} -> dt {dt_new:e}",
            bounds.conv,
            bounds.diff,
            bounds.forc,
            bounds.comb
        );

        let (dt, fixed_dt_violation) = match self.fixed_dt {
            Some(fixed) => {
                let violation = dt_new < fixed;
                if violation {
                    log::warn!(
                        "fixed_dt does not satisfy the stability bound: \
                         max stable dt {dt_new:e}, fixed dt {fixed:e}"
                    );
                }
                (fixed, violation)
            }
            None => (dt_new, false),
        };

        DtDecision {
            bounds,
            stable_dt: dt_new,
            dt,
            fallback,
            growth_limited,
            plot_aligned,
            stop_clipped,
            fixed_dt_violation,
        }
    }
}
