//! Calibrates the Strickler coefficient of the reference reach.
//!
//! Run with `RUST_LOG=debug` to follow each Gauss-Newton iteration.

use std::error::Error;

use log::{Level, LevelFilter};
use varda_core::Model;
use varda_flood::scenario;
use varda_observers::LogObserver;
use varda_solvers::{Config, variational};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let scenario = scenario::reference();
    let problem = scenario.problem()?;

    let solution = variational::minimize(
        &scenario.model,
        &problem,
        &Config::default(),
        LogObserver::new(Level::Info).with_target("calibrate"),
    )?;

    let ks = solution.analysis[0];
    println!(
        "Ks = {ks:.6} after {} iterations ({:?})",
        solution.iters, solution.status
    );
    println!("J  = {:.3e}", solution.cost.j);

    let heights = scenario.model.call(&solution.analysis)?;
    for ((q, observed), simulated) in scenario::DISCHARGES
        .iter()
        .zip(&scenario::OBSERVED_HEIGHTS)
        .zip(heights.iter())
    {
        println!("Q = {q:>4} m³/s  observed {observed:.6} m  simulated {simulated:.6} m");
    }

    Ok(())
}
