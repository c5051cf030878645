//! Configuration of a complete analysis run, persisted as JSON.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::NeuroError;
use crate::lfp::{FrequencyComponent, LfpParams};
use crate::pca::{ComponentSelection, DataPreparation, PcaParams, ZeroVariancePolicy};
use crate::population::PopulationParams;

/// Parameters of the simulation and analysis pipeline.
/// Missing fields fall back to their defaults when loading from a file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// The seed every random draw of the run derives from.
    pub seed: u64,
    pub population: PopulationParams,
    pub lfp: LfpParams,
    pub pca: PcaParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            seed: 42,
            population: PopulationParams {
                n_neurons: 30,
                duration: 5.0,
                base_rate: 15.0,
                ..Default::default()
            },
            lfp: LfpParams {
                duration: 3.0,
                frequency_components: vec![
                    FrequencyComponent::new(8.0, 1.0),
                    FrequencyComponent::new(30.0, 0.5),
                ],
                ..Default::default()
            },
            pca: PcaParams {
                preparation: DataPreparation {
                    normalize: true,
                    zero_variance: ZeroVariancePolicy::Skip,
                },
                selection: ComponentSelection::VarianceThreshold(0.9),
            },
        }
    }
}

impl AnalysisConfig {
    /// Returns an error if any of the parameters is out of range.
    pub fn validate(&self) -> Result<(), NeuroError> {
        self.population.validate()?;
        self.lfp.validate()?;
        self.pca.selection.validate(self.population.n_neurons)
    }

    /// Save the configuration to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NeuroError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a configuration from a file. The loaded configuration is validated.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, NeuroError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: AnalysisConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_save_load() {
        let config = AnalysisConfig {
            seed: 7,
            ..Default::default()
        };
        let file = NamedTempFile::new().unwrap();
        config.save_to(file.path()).unwrap();
        let loaded = AnalysisConfig::load_from(file.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"seed": 3, "population": {{"n_neurons": 12}}, "pca": {{"selection": {{"Fixed": 4}}}}}}"#
        )
        .unwrap();
        let config = AnalysisConfig::load_from(file.path()).unwrap();
        assert_eq!(config.seed, 3);
        assert_eq!(config.population.n_neurons, 12);
        assert_eq!(config.population.bin_width, PopulationParams::default().bin_width);
        assert_eq!(config.pca.selection, ComponentSelection::Fixed(4));
        assert_eq!(config.lfp, AnalysisConfig::default().lfp);
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"population": {{"n_neurons": 0}}}}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::load_from(file.path()),
            Err(NeuroError::InvalidParameter(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            AnalysisConfig::load_from(file.path()),
            Err(NeuroError::IOError(_))
        ));

        assert!(matches!(
            AnalysisConfig::load_from("/nonexistent/config.json"),
            Err(NeuroError::IOError(_))
        ));
    }
}
