//! Module implementing synthetic local field potentials (LFP).
//!
//! An LFP is modeled as a superposition of sinusoidal oscillations plus Gaussian noise, sampled at a fixed rate.
//! Samples are taken at `t_i = i / sampling_rate` for `i = 0..=floor(duration * sampling_rate)`, so the signal covers `[0, duration]`.
//!
//! The noise standard deviation is `noise_level` times the standard deviation of the clean signal.
//! If the clean signal is flat (e.g., no oscillation), the noise standard deviation is `noise_level` itself.
use std::f64::consts::PI;

use log::{debug, warn};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::NeuroError;
use crate::utils::{ensure_non_negative, ensure_positive, num_windows, rng_from_seed, std_dev};

/// Maximum number of samples of a generated signal.
pub const MAX_SAMPLES: usize = 1 << 32;

/// An oscillatory component of an LFP.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyComponent {
    /// Frequency, in Hz.
    pub frequency: f64,
    /// Peak amplitude (arbitrary units).
    pub amplitude: f64,
    /// Phase at time zero, in radians.
    #[serde(default)]
    pub phase: f64,
}

impl FrequencyComponent {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        FrequencyComponent {
            frequency,
            amplitude,
            phase: 0.0,
        }
    }

    /// Returns the value of the oscillation at the given time.
    pub fn eval(&self, time: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency * time + self.phase).sin()
    }
}

/// The default components: theta (4 Hz), alpha (8 Hz) and beta (30 Hz) oscillations.
pub fn default_components() -> Vec<FrequencyComponent> {
    vec![
        FrequencyComponent::new(4.0, 1.0),
        FrequencyComponent::new(8.0, 0.5),
        FrequencyComponent::new(30.0, 0.3),
    ]
}

/// Parameters of a synthetic LFP.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LfpParams {
    /// Duration of the signal, in seconds.
    pub duration: f64,
    /// Sampling rate, in Hz.
    pub sampling_rate: f64,
    /// Oscillatory components of the signal.
    pub frequency_components: Vec<FrequencyComponent>,
    /// Noise level, relative to the standard deviation of the clean signal.
    pub noise_level: f64,
}

impl Default for LfpParams {
    fn default() -> Self {
        LfpParams {
            duration: 1.0,
            sampling_rate: 1000.0,
            frequency_components: default_components(),
            noise_level: 0.1,
        }
    }
}

impl LfpParams {
    /// Returns an error if any of the parameters is out of range.
    pub fn validate(&self) -> Result<(), NeuroError> {
        ensure_positive("duration", self.duration)?;
        ensure_positive("sampling rate", self.sampling_rate)?;
        ensure_non_negative("noise level", self.noise_level)?;
        let num_samples = self.duration * self.sampling_rate;
        if !num_samples.is_finite() || num_samples >= MAX_SAMPLES as f64 {
            return Err(NeuroError::InvalidParameter(format!(
                "{}s at {}Hz exceeds the maximum of {} samples",
                self.duration, self.sampling_rate, MAX_SAMPLES
            )));
        }
        for component in self.frequency_components.iter() {
            ensure_non_negative("frequency", component.frequency)?;
            ensure_non_negative("amplitude", component.amplitude)?;
            if !component.phase.is_finite() {
                return Err(NeuroError::InvalidParameter(format!(
                    "phase must be finite, got {}",
                    component.phase
                )));
            }
        }
        Ok(())
    }
}

/// A sampled LFP signal.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LfpSignal {
    times: Vec<f64>,
    samples: Vec<f64>,
    sampling_rate: f64,
}

impl LfpSignal {
    /// Returns the sampling times, in seconds.
    pub fn times(&self) -> &[f64] {
        &self.times[..]
    }

    /// Returns the signal values.
    pub fn samples(&self) -> &[f64] {
        &self.samples[..]
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Returns a synthetic LFP made of the given oscillations plus Gaussian noise.
/// The output is fully determined by the seed.
///
/// # Errors
/// Returns an error if the duration or the sampling rate is not positive, the noise level is negative,
/// or a frequency or amplitude is negative.
///
/// # Example
/// ```rust
/// use rusty_neuro::lfp::{default_components, generate_lfp};
///
/// let lfp = generate_lfp(1.0, 1000.0, &default_components(), 0.1, 42).unwrap();
/// assert_eq!(lfp.len(), 1001);
/// assert_eq!(lfp.times()[0], 0.0);
/// ```
pub fn generate_lfp(
    duration: f64,
    sampling_rate: f64,
    frequency_components: &[FrequencyComponent],
    noise_level: f64,
    seed: u64,
) -> Result<LfpSignal, NeuroError> {
    let params = LfpParams {
        duration,
        sampling_rate,
        frequency_components: frequency_components.to_vec(),
        noise_level,
    };
    generate_lfp_with(&params, seed)
}

/// Returns a synthetic LFP with the given parameters.
pub fn generate_lfp_with(params: &LfpParams, seed: u64) -> Result<LfpSignal, NeuroError> {
    params.validate()?;

    let nyquist = params.sampling_rate / 2.0;
    for component in params
        .frequency_components
        .iter()
        .filter(|c| c.frequency > nyquist)
    {
        warn!(
            "Frequency {}Hz exceeds the Nyquist frequency {}Hz and will alias",
            component.frequency, nyquist
        );
    }

    let num_samples = num_windows(params.duration, 1.0 / params.sampling_rate) + 1;
    let times: Vec<f64> = (0..num_samples)
        .map(|i| i as f64 / params.sampling_rate)
        .collect();
    let clean: Vec<f64> = times
        .iter()
        .map(|t| {
            params
                .frequency_components
                .iter()
                .fold(0.0, |acc, component| acc + component.eval(*t))
        })
        .collect();

    let mut rng = rng_from_seed(seed);
    let samples = sample_noise(&clean, params.noise_level, &mut rng)?;
    debug!(
        "Generated LFP with {} samples and {} components",
        samples.len(),
        params.frequency_components.len()
    );

    Ok(LfpSignal {
        times,
        samples,
        sampling_rate: params.sampling_rate,
    })
}

/// Returns the signal with additive Gaussian noise, see the module documentation for the noise scale.
/// The output is fully determined by the seed.
pub fn add_noise(signal: &[f64], noise_level: f64, seed: u64) -> Result<Vec<f64>, NeuroError> {
    let mut rng = rng_from_seed(seed);
    sample_noise(signal, noise_level, &mut rng)
}

fn sample_noise<R: Rng>(signal: &[f64], noise_level: f64, rng: &mut R) -> Result<Vec<f64>, NeuroError> {
    ensure_non_negative("noise level", noise_level)?;
    if signal.iter().any(|v| !v.is_finite()) {
        return Err(NeuroError::InvalidInput(
            "the signal contains non-finite values".to_string(),
        ));
    }

    let spread = std_dev(signal);
    let scale = if spread > 0.0 {
        noise_level * spread
    } else {
        noise_level
    };
    if scale == 0.0 {
        return Ok(signal.to_vec());
    }

    let normal = Normal::new(0.0, scale).map_err(|e| NeuroError::InvalidParameter(e.to_string()))?;
    Ok(signal.iter().map(|v| v + normal.sample(rng)).collect())
}
