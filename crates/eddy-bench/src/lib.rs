//! Benchmark profiles and utilities for eddy.
//!
//! Provides pre-built [`FlowConfig`] profiles for benchmarks and examples:
//!
//! - [`taylor_green_profile`]: the Taylor-Green vortex in an `n^3`
//!   periodic box of side `2 pi`
//! - [`random_profile`]: a seeded random velocity in an `n^3` periodic
//!   unit box, made divergence-free by the initial projection

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::f64::consts::PI;

use eddy_arena::{LevelArena, LevelState};
use eddy_core::{FluidModel, Newtonian, PhysicsConfig};
use eddy_engine::{FlowConfig, StepConfig};
use eddy_operators::reference_operators;
use eddy_test_utils::{periodic_grid, random_velocity, uniform_flow};

/// Write the Taylor-Green vortex with peak speed `u0` into the interior
/// of `level.vel`:
///
/// `u = u0 sin x cos y cos z`, `v = -u0 cos x sin y cos z`, `w = 0`.
///
/// Its central-difference divergence is zero to round-off.
pub fn taylor_green_velocity(level: &mut LevelState, u0: f64) {
    let grid = *level.grid();
    for cell in grid.iter_cells() {
        let [x, y, z] = grid.cell_center(cell);
        level.vel.set(0, cell, u0 * x.sin() * y.cos() * z.cos());
        level.vel.set(1, cell, -u0 * x.cos() * y.sin() * z.cos());
        level.vel.set(2, cell, 0.0);
    }
}

fn newtonian(mu: f64) -> PhysicsConfig {
    PhysicsConfig {
        fluid: FluidModel::Newtonian(Newtonian::new(mu).expect("positive viscosity")),
        ..PhysicsConfig::default()
    }
}

fn profile(levels: LevelArena, physics: PhysicsConfig, max_step: u64) -> FlowConfig {
    FlowConfig {
        levels,
        operators: reference_operators(physics.fluid),
        stepping: StepConfig {
            max_step: Some(max_step),
            ..StepConfig::default()
        },
        physics,
    }
}

/// Taylor-Green vortex, unit density, viscosity `mu`, `n^3` cells.
pub fn taylor_green_profile(n: usize, mu: f64, max_step: u64) -> FlowConfig {
    let mut levels = uniform_flow(periodic_grid(n, 2.0 * PI), [0.0; 3], 1.0, mu);
    taylor_green_velocity(&mut levels.levels_mut()[0], 1.0);
    profile(levels, newtonian(mu), max_step)
}

/// Seeded random velocity in `[-1, 1)`, unit density, viscosity 0.01,
/// `n^3` cells.
pub fn random_profile(n: usize, seed: u64, max_step: u64) -> FlowConfig {
    let mut levels = uniform_flow(periodic_grid(n, 1.0), [0.0; 3], 1.0, 0.01);
    random_velocity(&mut levels.levels_mut()[0], seed, 1.0);
    profile(levels, newtonian(0.01), max_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_operators::stencil::max_abs_divergence;

    #[test]
    fn profiles_validate() {
        taylor_green_profile(8, 0.1, 10).validate().unwrap();
        random_profile(8, 42, 10).validate().unwrap();
    }

    #[test]
    fn taylor_green_is_discretely_divergence_free() {
        let config = taylor_green_profile(16, 0.1, 1);
        let level = &config.levels.levels()[0];
        assert!(max_abs_divergence(level.grid(), &level.vel) < 1e-12);
    }

    #[test]
    fn random_profile_is_deterministic() {
        let a = random_profile(6, 7, 1);
        let b = random_profile(6, 7, 1);
        let (la, lb) = (&a.levels.levels()[0], &b.levels.levels()[0]);
        assert!(la.grid().iter_cells().all(|c| la.vel.vector_at(c) == lb.vel.vector_at(c)));
    }
}
