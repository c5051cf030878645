//! Module implementing the concept of a spike train, i.e., the firing times of a single neuron.
//!
//! Spike trains are sampled from a homogeneous Poisson process: inter-spike intervals are
//! exponentially distributed with mean `1 / rate`, optionally shifted by an absolute refractory period.
//!
//! # Binning policy
//! A spike train of duration `T` binned with width `w` has `floor(T / w)` bins (up to a tiny relative tolerance).
//! Bins are half-open `[k w, (k + 1) w)`, except the last bin which also contains its right edge.
//! Spikes falling in the trailing partial bin (if any) are dropped.

use itertools::Itertools;
use log::debug;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

use crate::error::NeuroError;
use crate::utils::{ensure_non_negative, ensure_positive, num_windows, rng_from_seed, BIN_TOLERANCE};

/// Upper bound on the number of firing times reserved before sampling.
const MAX_PREALLOCATED_SPIKES: usize = 1 << 16;

/// Maximum expected number of spikes of a single spike train.
pub const MAX_EXPECTED_SPIKES: f64 = 1e9;

/// Represents the (sorted) firing times of a neuron over the time interval `[0, duration]`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeTrain {
    /// The firing times in seconds, sorted in non-decreasing order.
    firing_times: Vec<f64>,
    /// The duration of the recording in seconds.
    duration: f64,
}

impl SpikeTrain {
    /// Create a spike train with the specified firing times and duration.
    /// If necessary, the firing times are sorted.
    /// The function returns an error for a non-positive duration or for firing times that are not finite or outside `[0, duration]`.
    pub fn build(firing_times: &[f64], duration: f64) -> Result<Self, NeuroError> {
        ensure_positive("duration", duration)?;

        if let Some(t) = firing_times
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0 || **t > duration)
        {
            return Err(NeuroError::InvalidInput(format!(
                "firing time {} is outside [0, {}]",
                t, duration
            )));
        }

        let mut firing_times = firing_times.to_vec();
        firing_times.sort_by(|t1, t2| t1.total_cmp(t2));

        Ok(SpikeTrain {
            firing_times,
            duration,
        })
    }

    /// Returns the firing times of the spike train.
    pub fn firing_times(&self) -> &[f64] {
        &self.firing_times[..]
    }

    /// Returns the duration over which the spike train is defined.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns the number of spikes.
    pub fn num_spikes(&self) -> usize {
        self.firing_times.len()
    }

    /// Returns the empirical firing rate, in Hz.
    pub fn mean_firing_rate(&self) -> f64 {
        self.firing_times.len() as f64 / self.duration
    }

    /// Returns the time elapsed between consecutive spikes.
    pub fn inter_spike_intervals(&self) -> Vec<f64> {
        self.firing_times
            .iter()
            .tuple_windows()
            .map(|(t1, t2)| t2 - t1)
            .collect()
    }

    /// Returns the number of spikes per bin, see the module documentation for the binning policy.
    pub fn bin(&self, bin_width: f64) -> Result<Vec<usize>, NeuroError> {
        bin_spike_train(self, bin_width)
    }

    /// Returns the firing rate (in Hz) in each bin, i.e., the spike counts divided by the bin width.
    pub fn binned_rates(&self, bin_width: f64) -> Result<Vec<f64>, NeuroError> {
        Ok(bin_spike_train(self, bin_width)?
            .into_iter()
            .map(|count| count as f64 / bin_width)
            .collect())
    }

    /// Returns a binary raster with one entry per time step of width `dt`: 1 if at least one spike occurs in the step, 0 otherwise.
    pub fn to_raster(&self, dt: f64) -> Result<Vec<u8>, NeuroError> {
        Ok(bin_spike_train(self, dt)?
            .into_iter()
            .map(|count| u8::from(count > 0))
            .collect())
    }
}

/// Parameters of a Poisson spike train.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeTrainParams {
    /// Duration of the spike train, in seconds.
    pub duration: f64,
    /// Firing rate, in Hz.
    pub rate: f64,
    /// Absolute refractory period added to every inter-spike interval, in seconds.
    pub refractory_period: f64,
}

impl Default for SpikeTrainParams {
    fn default() -> Self {
        SpikeTrainParams {
            duration: 1.0,
            rate: 10.0,
            refractory_period: 0.0,
        }
    }
}

impl SpikeTrainParams {
    /// Returns an error if any of the parameters is out of range.
    pub fn validate(&self) -> Result<(), NeuroError> {
        ensure_positive("duration", self.duration)?;
        ensure_non_negative("rate", self.rate)?;
        ensure_non_negative("refractory period", self.refractory_period)?;
        if self.expected_num_spikes() > MAX_EXPECTED_SPIKES {
            return Err(NeuroError::InvalidParameter(format!(
                "{}s at {}Hz exceeds the maximum of {} expected spikes",
                self.duration, self.rate, MAX_EXPECTED_SPIKES
            )));
        }
        Ok(())
    }

    /// Returns the expected number of spikes, accounting for the refractory period.
    pub fn expected_num_spikes(&self) -> f64 {
        if self.rate == 0.0 {
            return 0.0;
        }
        self.duration / (self.refractory_period + 1.0 / self.rate)
    }
}

/// Returns a Poisson spike train with the given duration (in seconds) and rate (in Hz).
/// The output is fully determined by the seed.
///
/// # Errors
/// Returns an error if the duration is not positive, the rate is negative, or too many spikes are expected.
///
/// # Example
/// ```rust
/// use rusty_neuro::spike_train::generate_spike_train;
///
/// let spike_train = generate_spike_train(5.0, 10.0, 42).unwrap();
/// assert_eq!(spike_train, generate_spike_train(5.0, 10.0, 42).unwrap());
/// assert!(spike_train.firing_times().iter().all(|t| *t >= 0.0 && *t <= 5.0));
/// ```
pub fn generate_spike_train(duration: f64, rate: f64, seed: u64) -> Result<SpikeTrain, NeuroError> {
    generate_spike_train_with(
        &SpikeTrainParams {
            duration,
            rate,
            refractory_period: 0.0,
        },
        seed,
    )
}

/// Returns a Poisson spike train with the given parameters.
/// The output is fully determined by the seed.
pub fn generate_spike_train_with(
    params: &SpikeTrainParams,
    seed: u64,
) -> Result<SpikeTrain, NeuroError> {
    params.validate()?;
    let mut rng = rng_from_seed(seed);
    let spike_train = sample_spike_train(params, &mut rng)?;
    debug!(
        "Sampled {} spikes over {}s at {}Hz (seed {})",
        spike_train.num_spikes(),
        params.duration,
        params.rate,
        seed
    );
    Ok(spike_train)
}

/// Samples a Poisson spike train with the given parameters, drawing from the provided random number generator.
pub fn sample_spike_train<R: Rng>(
    params: &SpikeTrainParams,
    rng: &mut R,
) -> Result<SpikeTrain, NeuroError> {
    params.validate()?;

    if params.rate == 0.0 {
        return Ok(SpikeTrain {
            firing_times: vec![],
            duration: params.duration,
        });
    }

    let exp = Exp::new(params.rate).map_err(|e| NeuroError::InvalidParameter(e.to_string()))?;

    let capacity = (params.expected_num_spikes().ceil() as usize).min(MAX_PREALLOCATED_SPIKES);
    let mut firing_times = Vec::with_capacity(capacity);
    let mut time = 0.0;
    loop {
        time += params.refractory_period + exp.sample(rng);
        if time > params.duration {
            break;
        }
        firing_times.push(time);
    }

    Ok(SpikeTrain {
        firing_times,
        duration: params.duration,
    })
}

/// Returns the number of spikes in each bin of the given width, see the module documentation for the binning policy.
///
/// # Errors
/// Returns an error if the bin width is not positive or exceeds the duration of the spike train.
pub fn bin_spike_train(spike_train: &SpikeTrain, bin_width: f64) -> Result<Vec<usize>, NeuroError> {
    ensure_positive("bin width", bin_width)?;
    if bin_width > spike_train.duration * (1.0 + BIN_TOLERANCE) {
        return Err(NeuroError::InvalidParameter(format!(
            "bin width {} exceeds the spike train duration {}",
            bin_width, spike_train.duration
        )));
    }

    let num_bins = num_windows(spike_train.duration, bin_width).max(1);
    let right_edge = num_bins as f64 * bin_width;

    let mut counts = vec![0; num_bins];
    for &time in spike_train.firing_times.iter() {
        if time > right_edge * (1.0 + BIN_TOLERANCE) {
            // sorted times: every remaining spike is in the trailing partial bin
            break;
        }
        let pos = ((time / bin_width).floor() as usize).min(num_bins - 1);
        counts[pos] += 1;
    }

    Ok(counts)
}
