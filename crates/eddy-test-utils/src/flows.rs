//! Grids, level arenas and initial velocity fields.

use eddy_arena::{ArenaConfig, LevelArena, LevelState};
use eddy_space::Grid3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `n^3` cells over a periodic cube of side `length`.
///
/// # Panics
///
/// Panics if `n == 0` or `length` is not positive.
pub fn periodic_grid(n: usize, length: f64) -> Grid3 {
    Grid3::periodic_cube(n, length).expect("valid periodic cube")
}

/// A one-level arena over `grid` holding a uniform state: `vel` in every
/// cell, density `ro`, viscosity `eta`. Ghost cells are set too.
pub fn uniform_flow(grid: Grid3, vel: [f64; 3], ro: f64, eta: f64) -> LevelArena {
    let mut arena = LevelArena::new(ArenaConfig::default()).expect("default arena config");
    let id = arena.push_level(grid).expect("first level");
    let level = arena.level_mut(id).expect("level just pushed");
    set_uniform(level, vel, ro, eta);
    arena
}

/// Overwrite `level` with a uniform state, ghosts included.
pub fn set_uniform(level: &mut LevelState, vel: [f64; 3], ro: f64, eta: f64) {
    level.vel.fill(0.0);
    for (c, &v) in vel.iter().enumerate() {
        level.vel.component_mut(c).fill(v);
    }
    level.vel_old.copy_from(&level.vel);
    level.ro.fill(ro);
    level.eta.fill(eta);
}

/// The regression scenario: a 10^3 periodic box with `dx = 0.1`,
/// `rho = 1`, `eta = 0.1` and `u = (1, 0, 0)`.
pub fn scenario_arena() -> LevelArena {
    uniform_flow(periodic_grid(10, 1.0), [1.0, 0.0, 0.0], 1.0, 0.1)
}

/// Fill the interior of `level.vel` with values uniform in
/// `[-amplitude, amplitude)`, reproducible from `seed`. Ghosts are not
/// touched.
pub fn random_velocity(level: &mut LevelState, seed: u64, amplitude: f64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let grid = *level.grid();
    for c in 0..3 {
        for cell in grid.iter_cells() {
            let v = amplitude * (2.0 * rng.random::<f64>() - 1.0);
            level.vel.set(c, cell, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_core::LevelId;

    #[test]
    fn uniform_flow_sets_ghosts() {
        let arena = uniform_flow(periodic_grid(4, 1.0), [1.0, 2.0, 3.0], 1.5, 0.2);
        let level = arena.level(LevelId(0)).unwrap();
        assert_eq!(level.vel.vector_at([-1, 0, 4]), [1.0, 2.0, 3.0]);
        assert_eq!(level.ro.get(0, [-2, -2, -2]), 1.5);
        assert_eq!(level.eta.get(0, [3, 3, 3]), 0.2);
    }

    #[test]
    fn scenario_grid_spacing() {
        let arena = scenario_arena();
        let grid = arena.finest_grid().unwrap();
        assert_eq!(grid.cells(), [10; 3]);
        assert_eq!(grid.cell_size(), [0.1; 3]);
    }

    #[test]
    fn random_velocity_is_seeded() {
        let grid = periodic_grid(3, 1.0);
        let mut a = LevelState::new(grid, 1);
        let mut b = LevelState::new(grid, 1);
        random_velocity(&mut a, 7, 0.5);
        random_velocity(&mut b, 7, 0.5);
        assert_eq!(a.vel.as_slice(), b.vel.as_slice());
        assert!(grid
            .iter_cells()
            .all(|cell| a.vel.vector_at(cell).iter().all(|v| v.abs() <= 0.5)));
        random_velocity(&mut b, 8, 0.5);
        assert_ne!(a.vel.as_slice(), b.vel.as_slice());
    }
}
