//! End-to-end pipeline: simulate a population and an LFP, then reduce the population activity with PCA.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::NeuroError;
use crate::lfp::generate_lfp_with;
use crate::pca::PcaSummary;
use crate::population::generate_neural_population_with;
use crate::utils::std_dev;

/// Summary of an analysis run.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub n_neurons: usize,
    pub n_bins: usize,
    pub total_spikes: f64,
    pub lfp_samples: usize,
    /// Standard deviation of the LFP samples.
    pub lfp_std: f64,
    pub pca: PcaSummary,
}

impl AnalysisReport {
    /// Save the report to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NeuroError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// Runs the whole pipeline described by the configuration.
/// The report is fully determined by the configuration (including its seed).
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport, NeuroError> {
    config.validate()?;

    let population = generate_neural_population_with(&config.population, config.seed)?;
    let lfp = generate_lfp_with(&config.lfp, config.seed)?;
    let (_, pca) = config.pca.run(&population.observations())?;

    let report = AnalysisReport {
        n_neurons: population.n_neurons(),
        n_bins: population.n_bins(),
        total_spikes: population.total_spikes(),
        lfp_samples: lfp.len(),
        lfp_std: std_dev(lfp.samples()),
        pca: pca.summary(),
    };
    info!(
        "Analysis done: {} neurons, {} spikes, {} principal components",
        report.n_neurons, report.total_spikes, report.pca.n_components
    );
    Ok(report)
}
