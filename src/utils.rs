//! Small numerical and validation helpers shared by the simulator and the reducer.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::NeuroError;

/// Relative tolerance used when counting how many whole bins (or time steps) fit in a duration.
pub const BIN_TOLERANCE: f64 = 1e-9;

/// Returns a fresh random number generator seeded with the given seed.
pub fn rng_from_seed(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Returns a fresh random number generator seeded with the given seed, positioned on the given stream.
/// Generators sharing a seed but using different streams produce independent sequences.
pub fn rng_from_stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Returns the number of whole windows of the given width in the given duration.
/// A tiny relative tolerance absorbs rounding, e.g., 0.3 / 0.1 gives 3 windows.
pub fn num_windows(duration: f64, width: f64) -> usize {
    let ratio = duration / width;
    (ratio + ratio * BIN_TOLERANCE).floor() as usize
}

pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<(), NeuroError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(NeuroError::InvalidParameter(format!(
            "{} must be positive and finite, got {}",
            name, value
        )));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<(), NeuroError> {
    if !value.is_finite() || value < 0.0 {
        return Err(NeuroError::InvalidParameter(format!(
            "{} must be non-negative and finite, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Returns the arithmetic mean of the values (0 for an empty slice).
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Returns the population standard deviation of the values (0 for an empty slice).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_num_windows() {
        assert_eq!(num_windows(1.0, 0.1), 10);
        assert_eq!(num_windows(0.3, 0.1), 3);
        assert_eq!(num_windows(1.05, 0.1), 10);
        assert_eq!(num_windows(5.0, 0.01), 500);
        assert_eq!(num_windows(0.05, 0.1), 0);
    }

    #[test]
    fn test_ensure() {
        assert!(ensure_positive("duration", 1.0).is_ok());
        assert!(ensure_positive("duration", 0.0).is_err());
        assert!(ensure_positive("duration", f64::NAN).is_err());
        assert!(ensure_non_negative("rate", 0.0).is_ok());
        assert!(ensure_non_negative("rate", -1e-3).is_err());
        assert!(ensure_non_negative("rate", f64::INFINITY).is_err());
    }

    #[test]
    fn test_mean_std() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
        assert_eq!(std_dev(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_streams_are_independent_and_reproducible() {
        let mut rng_1 = rng_from_stream(42, 1);
        let mut rng_1_bis = rng_from_stream(42, 1);
        let mut rng_2 = rng_from_stream(42, 2);
        let a: Vec<f64> = (0..8).map(|_| rng_1.gen()).collect();
        let b: Vec<f64> = (0..8).map(|_| rng_1_bis.gen()).collect();
        let c: Vec<f64> = (0..8).map(|_| rng_2.gen()).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut rng_3 = rng_from_seed(7);
        let mut rng_4 = rng_from_seed(7);
        assert_eq!(rng_3.gen::<u64>(), rng_4.gen::<u64>());
    }
}
