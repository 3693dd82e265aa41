//! Samples the reference ten-state target with many chains and prints how the visit
//! frequencies compare with the target weights.
//!
//! Set `RUST_LOG=discrete_mh=debug` to see the library's log events.

use discrete_mh::core::ChainRunner;
use discrete_mh::distributions::TargetWeights;
use discrete_mh::simulator::{ChainSimulator, SimulationConfig};
use discrete_mh::stats::TargetComparison;
use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Main entry point: sets up the target, runs the simulator and prints a summary table.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let pi = vec![15.0, 5.0, 1.0, 3.0, 6.0, 0.05, 18.0, 9.0, 1.0, 2.0];
    let config = SimulationConfig {
        discard: 10,
        seed: Some(42),
        ..SimulationConfig::default()
    };
    config.validate()?;

    let target = TargetWeights::new(pi.clone())?;
    let mut sim = ChainSimulator::uniform(target, config.n_chains)?;
    if let Some(seed) = config.seed {
        sim = sim.set_seed(seed);
    }

    let before = sim.stats();
    let states = sim.run_progress(config.n_iterations)?;
    let stats = sim.stats().since(&before);
    println!(
        "Simulated {} chains for {} iterations",
        states.ncols(),
        states.nrows()
    );

    let cmp = TargetComparison::new(states.view(), ndarray::arr1(&pi).view(), config.discard)?;
    println!("{:>5} {:>10} {:>10} {:>10}", "state", "weight", "target", "empirical");
    for (state, ((w, t), e)) in pi
        .iter()
        .zip(cmp.target.iter())
        .zip(cmp.empirical.iter())
        .enumerate()
    {
        println!("{state:>5} {w:>10.2} {t:>10.4} {e:>10.4}");
    }

    if let Some(rho) = cmp.spearman {
        println!("Spearman correlation: {rho:.3}");
    }
    if let Some(tv) = cmp.total_variation {
        println!("Total variation distance: {tv:.4}");
    }
    println!("Acceptance rate: {:.3}", stats.acceptance_rate());

    #[cfg(feature = "csv")]
    {
        discrete_mh::io::csv::save_frequencies_csv(&cmp, "frequencies.csv")?;
        println!("Saved frequencies to frequencies.csv");
    }

    Ok(())
}
