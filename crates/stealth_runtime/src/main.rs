//! Headless stealth level runner
//!
//! Usage: `stealth-sim [level.toml]`, or set `STEALTH_LEVEL`. Without either
//! the bundled demo level runs.

use stealth_gamestate::format_time;
use stealth_runtime::prelude::*;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RuntimeConfig::load();
    log::info!("Tick rate {} Hz, up to {}s", config.tick_rate, config.duration);

    let desc = match config.level_desc() {
        Ok(desc) => desc,
        Err(e) => {
            log::error!("Failed to load level: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut sim = match Simulation::from_desc(&desc) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Failed to build level '{}': {}", desc.level.name, e);
            return ExitCode::FAILURE;
        }
    };

    let summary = sim.run(config.duration, config.tick_rate);
    let objectives = sim.level().objectives();

    log::info!(
        "Ran {} ticks ({}), {} state changes, {} footsteps, peak alert {:.2}",
        summary.ticks,
        format_time(summary.elapsed),
        summary.state_changes,
        summary.footsteps,
        summary.peak_alert
    );
    log::info!("{}", objectives.progress_text());
    match summary.outcome {
        Some(outcome) => log::info!("Outcome: {:?} at {}", outcome, objectives.timer().formatted()),
        None => log::info!("No outcome after {}", format_time(summary.elapsed)),
    }

    ExitCode::SUCCESS
}
