//! Module implementing the activity of a population of independent Poisson neurons.
//!
//! Each neuron fires at its own rate, drawn around a base rate, and its spike train is binned into a counts matrix
//! with one row per neuron and one column per time bin.
//!
//! # Example
//! ```rust
//! use rusty_neuro::population::generate_neural_population;
//!
//! let population = generate_neural_population(50, 5.0, 15.0, 42).unwrap();
//! assert_eq!(population.n_neurons(), 50);
//! assert_eq!(population.n_bins(), 500);
//! ```
use log::{debug, info};
use nalgebra::DMatrix;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::NeuroError;
use crate::spike_train::{bin_spike_train, sample_spike_train, SpikeTrain, SpikeTrainParams};
use crate::utils::{ensure_non_negative, ensure_positive, num_windows, rng_from_stream};
use crate::MIN_PARALLEL_NEURONS;

/// Parameters of a population of independent Poisson neurons.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationParams {
    /// Number of neurons in the population.
    pub n_neurons: usize,
    /// Duration of the recording, in seconds.
    pub duration: f64,
    /// Mean firing rate across the population, in Hz.
    pub base_rate: f64,
    /// Standard deviation of the firing rates across the population, in Hz.
    pub rate_std: f64,
    /// Lower bound on the firing rate of every neuron, in Hz.
    pub min_rate: f64,
    /// Width of the time bins, in seconds.
    pub bin_width: f64,
    /// Absolute refractory period of every neuron, in seconds.
    pub refractory_period: f64,
}

impl Default for PopulationParams {
    fn default() -> Self {
        PopulationParams {
            n_neurons: 10,
            duration: 1.0,
            base_rate: 10.0,
            rate_std: 5.0,
            min_rate: 0.1,
            bin_width: 0.01,
            refractory_period: 0.0,
        }
    }
}

impl PopulationParams {
    /// Returns an error if any of the parameters is out of range.
    pub fn validate(&self) -> Result<(), NeuroError> {
        if self.n_neurons == 0 {
            return Err(NeuroError::InvalidParameter(
                "the population must contain at least one neuron".to_string(),
            ));
        }
        ensure_positive("duration", self.duration)?;
        ensure_non_negative("base rate", self.base_rate)?;
        ensure_non_negative("rate standard deviation", self.rate_std)?;
        ensure_non_negative("minimum rate", self.min_rate)?;
        ensure_positive("bin width", self.bin_width)?;
        ensure_non_negative("refractory period", self.refractory_period)?;
        if num_windows(self.duration, self.bin_width) == 0 {
            return Err(NeuroError::InvalidParameter(format!(
                "bin width {} exceeds the duration {}",
                self.bin_width, self.duration
            )));
        }
        Ok(())
    }
}

/// Binned activity of a population of neurons.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationActivity {
    /// Spike counts, one row per neuron and one column per time bin.
    counts: DMatrix<f64>,
    /// The firing rate used to sample each neuron, in Hz.
    firing_rates: Vec<f64>,
    /// Width of the time bins, in seconds.
    bin_width: f64,
    /// Duration of the recording, in seconds.
    duration: f64,
}

impl PopulationActivity {
    /// Bins the provided spike trains (one per neuron) into a population activity matrix.
    /// All spike trains must share the same duration.
    pub fn from_spike_trains(
        spike_trains: &[SpikeTrain],
        firing_rates: Vec<f64>,
        bin_width: f64,
    ) -> Result<Self, NeuroError> {
        let first = spike_trains.first().ok_or_else(|| {
            NeuroError::InvalidInput("at least one spike train is required".to_string())
        })?;
        let duration = first.duration();
        if spike_trains.iter().any(|st| st.duration() != duration) {
            return Err(NeuroError::InvalidInput(
                "all spike trains must share the same duration".to_string(),
            ));
        }
        if firing_rates.len() != spike_trains.len() {
            return Err(NeuroError::InvalidInput(format!(
                "expected {} firing rates, got {}",
                spike_trains.len(),
                firing_rates.len()
            )));
        }

        let binned = spike_trains
            .iter()
            .map(|st| bin_spike_train(st, bin_width))
            .collect::<Result<Vec<_>, _>>()?;
        let n_bins = binned[0].len();
        let counts = DMatrix::from_fn(binned.len(), n_bins, |i, j| binned[i][j] as f64);

        Ok(PopulationActivity {
            counts,
            firing_rates,
            bin_width,
            duration,
        })
    }

    /// Returns the spike counts (neurons × bins).
    pub fn counts(&self) -> &DMatrix<f64> {
        &self.counts
    }

    /// Consumes the activity and returns the spike counts (neurons × bins).
    pub fn into_counts(self) -> DMatrix<f64> {
        self.counts
    }

    /// Returns the firing rate used to sample each neuron.
    pub fn firing_rates(&self) -> &[f64] {
        &self.firing_rates[..]
    }

    pub fn n_neurons(&self) -> usize {
        self.counts.nrows()
    }

    pub fn n_bins(&self) -> usize {
        self.counts.ncols()
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns the total number of binned spikes.
    pub fn total_spikes(&self) -> f64 {
        self.counts.sum()
    }

    /// Returns the instantaneous firing rates (in Hz), i.e., the counts divided by the bin width.
    pub fn rates(&self) -> DMatrix<f64> {
        &self.counts / self.bin_width
    }

    /// Returns the activity as an observations × features matrix (bins × neurons), ready for PCA.
    pub fn observations(&self) -> DMatrix<f64> {
        self.counts.transpose()
    }
}

/// Returns the activity of a population of independent Poisson neurons, with default jitter, bin width and no refractory period.
/// The output is fully determined by the seed.
///
/// # Errors
/// Returns an error if the population is empty, the duration is not positive or the base rate is negative.
pub fn generate_neural_population(
    n_neurons: usize,
    duration: f64,
    base_rate: f64,
    seed: u64,
) -> Result<PopulationActivity, NeuroError> {
    let params = PopulationParams {
        n_neurons,
        duration,
        base_rate,
        ..Default::default()
    };
    generate_neural_population_with(&params, seed)
}

/// Returns the activity of a population of independent Poisson neurons with the given parameters.
/// The output is fully determined by the seed.
pub fn generate_neural_population_with(
    params: &PopulationParams,
    seed: u64,
) -> Result<PopulationActivity, NeuroError> {
    let (spike_trains, firing_rates) = generate_population_spike_trains(params, seed)?;
    let activity = PopulationActivity::from_spike_trains(&spike_trains, firing_rates, params.bin_width)?;
    info!(
        "Generated population activity: {} neurons × {} bins, {} spikes",
        activity.n_neurons(),
        activity.n_bins(),
        activity.total_spikes()
    );
    Ok(activity)
}

/// Returns the spike train of every neuron of the population, together with the firing rate used to sample it.
///
/// Stream 0 of the seeded generator draws the firing rates; neuron `i` samples its spike train from stream `i + 1`.
/// The result does not depend on how the neurons are scheduled across threads.
pub fn generate_population_spike_trains(
    params: &PopulationParams,
    seed: u64,
) -> Result<(Vec<SpikeTrain>, Vec<f64>), NeuroError> {
    params.validate()?;

    let firing_rates = draw_firing_rates(params, seed)?;

    let sample_neuron = |(i, rate): (usize, &f64)| {
        let mut rng = rng_from_stream(seed, i as u64 + 1);
        let neuron_params = SpikeTrainParams {
            duration: params.duration,
            rate: *rate,
            refractory_period: params.refractory_period,
        };
        sample_spike_train(&neuron_params, &mut rng)
    };

    let spike_trains = if params.n_neurons >= MIN_PARALLEL_NEURONS {
        debug!("Sampling {} neurons in parallel", params.n_neurons);
        firing_rates
            .par_iter()
            .enumerate()
            .map(sample_neuron)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        firing_rates
            .iter()
            .enumerate()
            .map(sample_neuron)
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok((spike_trains, firing_rates))
}

fn draw_firing_rates(params: &PopulationParams, seed: u64) -> Result<Vec<f64>, NeuroError> {
    let normal = Normal::new(params.base_rate, params.rate_std)
        .map_err(|e| NeuroError::InvalidParameter(e.to_string()))?;
    let mut rng = rng_from_stream(seed, 0);
    Ok((0..params.n_neurons)
        .map(|_| normal.sample(&mut rng).max(params.min_rate))
        .collect())
}
