//! Viscous decay of the Taylor-Green vortex.
//!
//! Demonstrates: build config → Simulation → evolve with an output
//! observer → compare the kinetic energy against the low-Reynolds decay
//! `E(t) = E(0) exp(-6 nu t)`.
//!
//! Run with `RUST_LOG=info` to see the per-step log.

use eddy_arena::LevelArena;
use eddy_bench::taylor_green_profile;
use eddy_engine::{Simulation, StepConfig};

fn kinetic_energy(levels: &LevelArena) -> f64 {
    let level = &levels.levels()[0];
    let grid = level.grid();
    let cell_volume: f64 = grid.cell_size().iter().product();
    0.5 * cell_volume
        * grid
            .iter_cells()
            .map(|c| level.vel.vector_at(c).iter().map(|v| v * v).sum::<f64>())
            .sum::<f64>()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("=== eddy Taylor-Green example ===\n");

    let nu = 0.1;
    let mut config = taylor_green_profile(24, nu, u64::MAX);
    config.stepping = StepConfig {
        stop_time: Some(1.0),
        plot_per: Some(0.25),
        ..config.stepping
    };

    let mut sim = Simulation::new(config).unwrap();
    sim.initialize().unwrap();
    let e0 = kinetic_energy(sim.levels());
    println!("initial kinetic energy: {e0:.6}");

    let summary = sim
        .evolve(|report, levels| {
            if report.plot_due {
                let e = kinetic_energy(levels);
                let expected = e0 * (-6.0 * nu * report.time).exp();
                println!(
                    "  step {:>4}  t = {:>5.3}  dt = {:.2e}  E = {:.6}  E_decay = {:.6}  ({:+.2}%)  {:>6}μs",
                    report.nstep,
                    report.time,
                    report.dt,
                    e,
                    expected,
                    100.0 * (e - expected) / expected,
                    report.metrics.total_us,
                );
            }
        })
        .unwrap();

    println!(
        "\nfinished: {} steps, t = {:.3}",
        summary.steps, summary.final_time
    );
}
