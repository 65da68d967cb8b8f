//! Steady-state detection.

use smallvec::SmallVec;

use eddy_arena::LevelState;
use eddy_core::{LevelId, SPACEDIM};

/// Below this baseline the relative change is taken to be zero.
const ZERO_BASELINE: f64 = 1.0e-15;

/// Convergence statistics of one level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelConvergence {
    /// The level.
    pub level: LevelId,
    /// Largest `|vel - vel_old|` over components and uncovered cells.
    pub max_change: f64,
    /// Largest `sum|vel - vel_old| / sum|vel_old|` over components.
    pub max_relchange: f64,
    /// `max_change < tol * dt`.
    pub rate_ok: bool,
    /// `max_relchange < tol`.
    pub relative_ok: bool,
}

impl LevelConvergence {
    /// Either criterion holds.
    pub fn converged(&self) -> bool {
        self.rate_ok || self.relative_ok
    }
}

/// Outcome of one steady-state evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct SteadyStateReport {
    /// Per-level statistics, coarsest first.
    pub levels: SmallVec<[LevelConvergence; 4]>,
    /// The check ran before step 2 and was forced to "not converged".
    pub gated: bool,
    /// Every level converged and the check was not gated.
    pub reached: bool,
}

/// Compares the velocity before and after a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteadyStateMonitor {
    tol: f64,
}

impl SteadyStateMonitor {
    /// Steps completed before the criteria are allowed to report
    /// convergence.
    pub const MIN_STEPS: u64 = 2;

    /// A monitor with tolerance `tol`.
    pub fn new(tol: f64) -> Self {
        Self { tol }
    }

    /// The tolerance.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Evaluate both criteria on every level.
    ///
    /// `dt` is the step just taken and `nstep` the number of completed
    /// steps. The statistics are computed even when the result is gated,
    /// so they can be logged.
    pub fn check(&self, levels: &[LevelState], dt: f64, nstep: u64) -> SteadyStateReport {
        let stats: SmallVec<[LevelConvergence; 4]> = levels
            .iter()
            .enumerate()
            .map(|(i, level)| self.level_stats(LevelId::from(i), level, dt))
            .collect();

        for s in &stats {
            log::debug!(
                "level {}: max change {:e} (rate ok: {}), max relative change {:e} (ok: {})",
                s.level,
                s.max_change,
                s.rate_ok,
                s.max_relchange,
                s.relative_ok
            );
        }

        let gated = nstep < Self::MIN_STEPS;
        let reached = !gated && stats.iter().all(LevelConvergence::converged);
        SteadyStateReport {
            levels: stats,
            gated,
            reached,
        }
    }

    fn level_stats(&self, level: LevelId, state: &LevelState, dt: f64) -> LevelConvergence {
        let covered = state.covered();
        let mut max_change = 0.0_f64;
        let mut max_relchange = 0.0_f64;
        for comp in 0..SPACEDIM {
            max_change = max_change.max(state.vel.max_abs_diff(&state.vel_old, comp, covered));
            let baseline = state.vel_old.sum_abs(comp, covered);
            let relchange = if baseline > ZERO_BASELINE {
                state.vel.sum_abs_diff(&state.vel_old, comp, covered) / baseline
            } else {
                0.0
            };
            max_relchange = max_relchange.max(relchange);
        }
        LevelConvergence {
            level,
            max_change,
            max_relchange,
            rate_ok: max_change < self.tol * dt,
            relative_ok: max_relchange < self.tol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_test_utils::{periodic_grid, set_uniform, uniform_flow};

    fn settled(vel: [f64; 3]) -> eddy_arena::LevelArena {
        let mut arena = uniform_flow(periodic_grid(4, 1.0), vel, 1.0, 0.1);
        arena.levels_mut()[0].save_velocity();
        arena
    }

    #[test]
    fn unchanged_field_is_gated_for_two_steps() {
        let arena = settled([1.0, 0.0, 0.0]);
        let monitor = SteadyStateMonitor::new(1e-5);
        for nstep in 0..2 {
            let r = monitor.check(arena.levels(), 0.1, nstep);
            assert!(r.gated);
            assert!(!r.reached);
            assert!(r.levels[0].converged());
        }
        let r = monitor.check(arena.levels(), 0.1, 2);
        assert!(!r.gated);
        assert!(r.reached);
    }

    #[test]
    fn zero_baseline_counts_as_converged() {
        let mut arena = settled([0.0; 3]);
        // A change far above tol * dt, measured against a zero baseline.
        arena.levels_mut()[0].vel.component_mut(0).fill(1.0);
        let r = SteadyStateMonitor::new(1e-5).check(arena.levels(), 0.1, 5);
        let lev = &r.levels[0];
        assert_eq!(lev.max_change, 1.0);
        assert!(!lev.rate_ok);
        assert_eq!(lev.max_relchange, 0.0);
        assert!(lev.relative_ok);
        assert!(r.reached);
    }

    #[test]
    fn relative_change_is_sum_ratio() {
        let mut arena = settled([2.0, 0.0, 0.0]);
        arena.levels_mut()[0].vel.set(0, [0, 0, 0], 2.64);
        let r = SteadyStateMonitor::new(1e-5).check(arena.levels(), 0.1, 5);
        let lev = &r.levels[0];
        assert!((lev.max_change - 0.64).abs() < 1e-12);
        // 0.64 / (64 * 2)
        assert!((lev.max_relchange - 0.005).abs() < 1e-12);
        assert!(!lev.converged());
        assert!(!r.reached);
    }

    #[test]
    fn covered_cells_are_ignored() {
        let mut arena = settled([1.0, 0.0, 0.0]);
        let level = &mut arena.levels_mut()[0];
        level.vel.set(2, [3, 3, 3], 50.0);
        level.cover_box([3, 3, 3], [4, 4, 4]);
        let r = SteadyStateMonitor::new(1e-5).check(arena.levels(), 0.1, 5);
        assert_eq!(r.levels[0].max_change, 0.0);
        assert!(r.reached);
    }

    #[test]
    fn every_level_must_converge() {
        let mut arena = settled([1.0, 0.0, 0.0]);
        let fine = arena.levels()[0].grid().refined(2).unwrap();
        arena.push_level(fine).unwrap();
        let level = &mut arena.levels_mut()[1];
        set_uniform(level, [1.0, 1.0, 0.0], 1.0, 0.1);
        // 1 / 512 relative change on component 1.
        level.vel.set(1, [0, 0, 0], 2.0);
        let r = SteadyStateMonitor::new(1e-5).check(arena.levels(), 0.1, 5);
        assert!(r.levels[0].converged());
        assert!(!r.levels[1].converged());
        assert_eq!(r.levels[1].level, LevelId(1));
        assert!(!r.reached);
    }
}
