//! Runs the simulation and PCA pipeline and writes the report as JSON.
//!
//! Usage: `cargo run --example example_analysis [config.json] [report.json]`
//! Set `RUST_LOG=info` (or `debug`) to follow the pipeline.
use std::env;

use log::{error, info};

use rusty_neuro::analysis::run_analysis;
use rusty_neuro::config::AnalysisConfig;
use rusty_neuro::error::NeuroError;

fn run() -> Result<(), NeuroError> {
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => AnalysisConfig::load_from(path)?,
        None => AnalysisConfig::default(),
    };
    let output = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| env::temp_dir().join("neural_analysis_report.json").display().to_string());

    info!("Running analysis with seed {}", config.seed);
    let report = run_analysis(&config)?;

    println!("Neural Data Analysis Example");
    println!("  Neurons: {}, bins: {}", report.n_neurons, report.n_bins);
    println!("  Total spikes: {:.0}", report.total_spikes);
    println!("  LFP samples: {}", report.lfp_samples);
    println!("  PCA components: {}", report.pca.n_components);
    println!(
        "  Variance explained: {:.2}%",
        100.0 * report.pca.explained_variance_ratio.iter().sum::<f64>()
    );

    report.save_to(&output)?;
    println!("  Saved report to: {}", output);
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
