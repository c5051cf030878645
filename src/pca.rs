//! Principal Component Analysis (PCA) of activity matrices.
//!
//! Matrices are laid out as observations × features, e.g., time bins × neurons
//! (see [`crate::population::PopulationActivity::observations`]).
//!
//! The principal components are the eigenvectors of the sample covariance matrix, computed with a symmetric
//! eigendecomposition that does not assume the covariance to be full rank.
//!
//! # Example
//! ```rust
//! use rusty_neuro::pca::{perform_pca, reconstruct, ComponentSelection, DataPreparation, ZeroVariancePolicy};
//! use rusty_neuro::population::generate_neural_population;
//!
//! let population = generate_neural_population(30, 5.0, 15.0, 42).unwrap();
//! // silent neurons are left unscaled instead of failing the normalization
//! let preparation = DataPreparation { normalize: true, zero_variance: ZeroVariancePolicy::Skip };
//! let data = preparation.apply(&population.observations()).unwrap();
//! let pca = perform_pca(&data, ComponentSelection::VarianceThreshold(0.9)).unwrap();
//!
//! assert!(pca.n_components() <= 30);
//! assert!(pca.cumulative_explained_variance()[pca.n_components() - 1] >= 0.9);
//!
//! let approx = reconstruct(&pca, pca.n_components()).unwrap();
//! assert_eq!(approx.shape(), data.shape());
//! ```
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};

use crate::error::NeuroError;

/// Eigenvalues below this fraction of the largest eigenvalue are treated as exactly zero.
pub const RANK_TOLERANCE: f64 = 1e-12;
/// Columns whose standard deviation is below this fraction of their largest magnitude are considered constant.
pub const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;
/// Tolerance when comparing a cumulative explained variance ratio with a threshold.
pub const VARIANCE_TOLERANCE: f64 = 1e-10;

/// What to do with a zero-variance column when normalizing.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum ZeroVariancePolicy {
    /// Fail with [`NeuroError::DegenerateInput`].
    #[default]
    Error,
    /// Center the column but leave it unscaled.
    Skip,
}

/// Preprocessing applied to a matrix before PCA.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPreparation {
    /// Whether to z-score every feature column.
    pub normalize: bool,
    pub zero_variance: ZeroVariancePolicy,
}

impl Default for DataPreparation {
    fn default() -> Self {
        DataPreparation {
            normalize: true,
            zero_variance: ZeroVariancePolicy::Error,
        }
    }
}

impl DataPreparation {
    /// Returns the prepared copy of the matrix (observations × features).
    ///
    /// # Errors
    /// Returns an error if the matrix is empty or contains non-finite values,
    /// or if a column has zero variance under the [`ZeroVariancePolicy::Error`] policy.
    pub fn apply(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>, NeuroError> {
        validate_matrix(data)?;
        let mut prepared = data.clone();
        if !self.normalize {
            return Ok(prepared);
        }

        let n = prepared.nrows() as f64;
        for (j, mut column) in prepared.column_iter_mut().enumerate() {
            let mean = column.sum() / n;
            let var = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            let std = var.sqrt();
            let scale = column.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));

            if std <= ZERO_VARIANCE_TOLERANCE * scale {
                match self.zero_variance {
                    ZeroVariancePolicy::Error => {
                        return Err(NeuroError::DegenerateInput(format!(
                            "column {} has zero variance and cannot be normalized",
                            j
                        )));
                    }
                    ZeroVariancePolicy::Skip => {
                        debug!("Column {} has zero variance, leaving it unscaled", j);
                        column.add_scalar_mut(-mean);
                    }
                }
            } else {
                column.iter_mut().for_each(|v| *v = (*v - mean) / std);
            }
        }
        Ok(prepared)
    }
}

/// Returns the matrix (observations × features), optionally z-scoring every column.
/// Zero-variance columns are rejected when normalizing, see [`DataPreparation`] to skip them instead.
pub fn prepare_data_for_pca(data: &DMatrix<f64>, normalize: bool) -> Result<DMatrix<f64>, NeuroError> {
    DataPreparation {
        normalize,
        zero_variance: ZeroVariancePolicy::Error,
    }
    .apply(data)
}

/// How many principal components to keep.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum ComponentSelection {
    /// Keep the smallest number of components whose cumulative explained variance ratio reaches the threshold, in (0, 1].
    VarianceThreshold(f64),
    /// Keep exactly this number of components, between 1 and the number of features.
    Fixed(usize),
}

impl Default for ComponentSelection {
    fn default() -> Self {
        ComponentSelection::VarianceThreshold(0.95)
    }
}

impl ComponentSelection {
    /// Returns an error if the selection does not make sense for the given number of features.
    pub fn validate(&self, n_features: usize) -> Result<(), NeuroError> {
        match *self {
            ComponentSelection::VarianceThreshold(threshold) => {
                if !(threshold > 0.0 && threshold <= 1.0) {
                    return Err(NeuroError::InvalidParameter(format!(
                        "variance threshold must be in (0, 1], got {}",
                        threshold
                    )));
                }
            }
            ComponentSelection::Fixed(n_components) => {
                if n_components == 0 || n_components > n_features {
                    return Err(NeuroError::InvalidParameter(format!(
                        "number of components must be in [1, {}], got {}",
                        n_features, n_components
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parameters of a complete PCA run: preparation, then decomposition.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaParams {
    pub preparation: DataPreparation,
    pub selection: ComponentSelection,
}

impl PcaParams {
    /// Prepares the matrix and performs PCA on it. Returns the prepared matrix along with the result.
    pub fn run(&self, data: &DMatrix<f64>) -> Result<(DMatrix<f64>, PcaResult), NeuroError> {
        let prepared = self.preparation.apply(data)?;
        let result = perform_pca(&prepared, self.selection)?;
        Ok((prepared, result))
    }
}

/// The outcome of a PCA.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PcaResult {
    /// Projection of the observations on the kept components (observations × components).
    scores: DMatrix<f64>,
    /// Unit-norm, mutually orthogonal loading vectors (components × features).
    components: DMatrix<f64>,
    /// Variance along each kept component, in descending order.
    explained_variance: DVector<f64>,
    /// Fraction of the total variance along each kept component.
    explained_variance_ratio: DVector<f64>,
    /// Fraction of the total variance along every component, kept or not.
    spectrum_ratio: DVector<f64>,
    /// Feature means used to center the data.
    mean: DVector<f64>,
    total_variance: f64,
}

impl PcaResult {
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.components.ncols()
    }

    pub fn n_observations(&self) -> usize {
        self.scores.nrows()
    }

    /// Returns the projected data (observations × components).
    pub fn scores(&self) -> &DMatrix<f64> {
        &self.scores
    }

    /// Returns the loading vectors, one per row (components × features).
    pub fn components(&self) -> &DMatrix<f64> {
        &self.components
    }

    pub fn explained_variance(&self) -> &DVector<f64> {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &DVector<f64> {
        &self.explained_variance_ratio
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn total_variance(&self) -> f64 {
        self.total_variance
    }

    /// Returns the cumulative explained variance ratio of the kept components.
    pub fn cumulative_explained_variance(&self) -> DVector<f64> {
        cumulative_sum(&self.explained_variance_ratio)
    }

    /// Returns the loading of every feature on every kept component (features × components).
    pub fn loadings(&self) -> DMatrix<f64> {
        self.components.transpose()
    }

    /// Returns the loadings of every feature on the kept components, labeled by feature name.
    ///
    /// # Errors
    /// Returns an error if the number of names does not match the number of features.
    pub fn named_loadings(&self, feature_names: &[&str]) -> Result<Vec<(String, Vec<f64>)>, NeuroError> {
        if feature_names.len() != self.n_features() {
            return Err(NeuroError::InvalidInput(format!(
                "number of feature names ({}) must match number of features ({})",
                feature_names.len(),
                self.n_features()
            )));
        }
        Ok(feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| (name.to_string(), self.components.column(j).iter().copied().collect()))
            .collect())
    }

    /// Projects new observations (observations × features) on the kept components.
    pub fn transform(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>, NeuroError> {
        validate_matrix(data)?;
        if data.ncols() != self.n_features() {
            return Err(NeuroError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features(),
                data.ncols()
            )));
        }
        Ok(center(data, &self.mean) * self.components.transpose())
    }

    /// Returns a serializable report of the explained variance.
    pub fn summary(&self) -> PcaSummary {
        PcaSummary {
            n_observations: self.n_observations(),
            n_features: self.n_features(),
            n_components: self.n_components(),
            total_variance: self.total_variance,
            explained_variance_ratio: self.explained_variance_ratio.iter().copied().collect(),
            cumulative_explained_variance: self.cumulative_explained_variance().iter().copied().collect(),
            spectrum_ratio: self.spectrum_ratio.iter().copied().collect(),
        }
    }
}

/// A serializable report of a PCA, e.g., to plot the variance explained by each component.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PcaSummary {
    pub n_observations: usize,
    pub n_features: usize,
    pub n_components: usize,
    pub total_variance: f64,
    pub explained_variance_ratio: Vec<f64>,
    pub cumulative_explained_variance: Vec<f64>,
    /// Explained variance ratio of every component, including the discarded ones.
    pub spectrum_ratio: Vec<f64>,
}

impl PcaSummary {
    /// Save the summary to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NeuroError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// Performs PCA on the matrix (observations × features).
///
/// # Errors
/// Returns an error if the matrix is empty, contains non-finite values or has fewer than 2 observations,
/// if the selection is out of range, if the covariance overflows, or if the data has no variance at all.
pub fn perform_pca(data: &DMatrix<f64>, selection: ComponentSelection) -> Result<PcaResult, NeuroError> {
    validate_matrix(data)?;
    let (n_observations, n_features) = data.shape();
    if n_observations < 2 {
        return Err(NeuroError::InvalidInput(format!(
            "at least 2 observations are required, got {}",
            n_observations
        )));
    }
    selection.validate(n_features)?;

    let mean = DVector::from_iterator(
        n_features,
        data.column_iter().map(|column| column.sum() / n_observations as f64),
    );
    let centered = center(data, &mean);
    let covariance = (centered.transpose() * &centered) / (n_observations as f64 - 1.0);
    if covariance.iter().any(|v| !v.is_finite()) {
        return Err(NeuroError::InvalidInput(
            "the covariance overflows, rescale the data (e.g., normalize it) before PCA".to_string(),
        ));
    }

    let eigen = SymmetricEigen::try_new(covariance, f64::EPSILON, 0).ok_or_else(|| {
        NeuroError::DegenerateInput("the covariance eigendecomposition did not converge".to_string())
    })?;

    let mut order: Vec<usize> = (0..n_features).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let max_eigenvalue = eigen.eigenvalues[order[0]];
    if !(max_eigenvalue > 0.0) {
        return Err(NeuroError::DegenerateInput(
            "the data has zero total variance".to_string(),
        ));
    }

    let spectrum = DVector::from_iterator(
        n_features,
        order.iter().map(|&i| {
            let eigenvalue = eigen.eigenvalues[i];
            if eigenvalue < RANK_TOLERANCE * max_eigenvalue {
                0.0
            } else {
                eigenvalue
            }
        }),
    );
    let total_variance = spectrum.sum();
    let spectrum_ratio = &spectrum / total_variance;

    let n_components = match selection {
        ComponentSelection::Fixed(n_components) => n_components,
        ComponentSelection::VarianceThreshold(threshold) => cumulative_sum(&spectrum_ratio)
            .iter()
            .position(|cum| *cum >= threshold - VARIANCE_TOLERANCE)
            .map_or(n_features, |pos| pos + 1),
    };

    let mut components = DMatrix::zeros(n_components, n_features);
    for (r, &i) in order.iter().take(n_components).enumerate() {
        let mut loading = eigen.eigenvectors.column(i).clone_owned();
        // deterministic sign: the largest-magnitude entry is positive
        if loading[loading.iamax()] < 0.0 {
            loading.neg_mut();
        }
        components.set_row(r, &loading.transpose());
    }

    let scores = &centered * components.transpose();
    let explained_variance = spectrum.rows(0, n_components).clone_owned();
    let explained_variance_ratio = spectrum_ratio.rows(0, n_components).clone_owned();

    info!(
        "PCA kept {} of {} components ({:.2}% of the variance)",
        n_components,
        n_features,
        100.0 * explained_variance_ratio.sum()
    );

    Ok(PcaResult {
        scores,
        components,
        explained_variance,
        explained_variance_ratio,
        spectrum_ratio,
        mean,
        total_variance,
    })
}

/// Returns the data reconstructed in the original feature space from the first `n_components` components.
/// With 0 components, every observation is reconstructed as the feature means.
///
/// # Errors
/// Returns an error if more components are requested than the result holds.
pub fn reconstruct(pca: &PcaResult, n_components: usize) -> Result<DMatrix<f64>, NeuroError> {
    if n_components > pca.n_components() {
        return Err(NeuroError::InvalidParameter(format!(
            "cannot reconstruct from {} components, only {} are available",
            n_components,
            pca.n_components()
        )));
    }
    let indices: Vec<usize> = (0..n_components).collect();
    reconstruct_subset(pca, &indices)
}

/// Returns the data reconstructed in the original feature space from the given components only.
///
/// # Errors
/// Returns an error if an index is out of range or appears more than once.
pub fn reconstruct_subset(pca: &PcaResult, indices: &[usize]) -> Result<DMatrix<f64>, NeuroError> {
    let mut seen = vec![false; pca.n_components()];
    for &i in indices.iter() {
        if i >= pca.n_components() {
            return Err(NeuroError::InvalidParameter(format!(
                "component {} is out of range, only {} are available",
                i,
                pca.n_components()
            )));
        }
        if seen[i] {
            return Err(NeuroError::InvalidParameter(format!(
                "component {} is selected more than once",
                i
            )));
        }
        seen[i] = true;
    }

    let mut reconstruction = DMatrix::zeros(pca.n_observations(), pca.n_features());
    for &i in indices.iter() {
        reconstruction += pca.scores.column(i) * pca.components.row(i);
    }
    for (j, mut column) in reconstruction.column_iter_mut().enumerate() {
        column.add_scalar_mut(pca.mean[j]);
    }
    Ok(reconstruction)
}

/// Returns the mean squared error between the data the PCA was fitted on and its reconstruction from the first `n_components` components.
pub fn reconstruction_error(
    pca: &PcaResult,
    data: &DMatrix<f64>,
    n_components: usize,
) -> Result<f64, NeuroError> {
    if data.shape() != (pca.n_observations(), pca.n_features()) {
        return Err(NeuroError::InvalidInput(format!(
            "expected a {}×{} matrix, got {}×{}",
            pca.n_observations(),
            pca.n_features(),
            data.nrows(),
            data.ncols()
        )));
    }
    let reconstruction = reconstruct(pca, n_components)?;
    Ok((data - reconstruction).norm_squared() / data.len() as f64)
}

fn validate_matrix(data: &DMatrix<f64>) -> Result<(), NeuroError> {
    if data.nrows() == 0 || data.ncols() == 0 {
        return Err(NeuroError::InvalidInput(format!(
            "the matrix must not be empty, got {}×{}",
            data.nrows(),
            data.ncols()
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(NeuroError::InvalidInput(
            "the matrix contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

fn center(data: &DMatrix<f64>, mean: &DVector<f64>) -> DMatrix<f64> {
    let mut centered = data.clone();
    for (j, mut column) in centered.column_iter_mut().enumerate() {
        column.add_scalar_mut(-mean[j]);
    }
    centered
}

fn cumulative_sum(values: &DVector<f64>) -> DVector<f64> {
    let mut acc = 0.0;
    values.map(|v| {
        acc += v;
        acc
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::Rng;
    use rand_distr::StandardNormal;

    use super::*;
    use crate::utils::rng_from_seed;

    const SEED: u64 = 42;

    fn random_matrix(n_rows: usize, n_cols: usize, seed: u64) -> DMatrix<f64> {
        let mut rng = rng_from_seed(seed);
        DMatrix::from_fn(n_rows, n_cols, |_, _| rng.sample(StandardNormal))
    }

    /// Returns a matrix of the given rank, with 2 extra random offsets per feature.
    fn low_rank_matrix(n_rows: usize, n_cols: usize, rank: usize, seed: u64) -> DMatrix<f64> {
        let latent = random_matrix(n_rows, rank, seed);
        let mixing = random_matrix(rank, n_cols, seed + 1);
        let offsets = random_matrix(1, n_cols, seed + 2);
        let mut data = latent * mixing;
        for (j, mut column) in data.column_iter_mut().enumerate() {
            column.add_scalar_mut(offsets[(0, j)]);
        }
        data
    }

    fn relative_error(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
        (a - b).norm() / b.norm()
    }

    #[test]
    fn test_prepare_data_for_pca() {
        let data = random_matrix(100, 10, SEED) * 3.0;
        let prepared = prepare_data_for_pca(&data, true).unwrap();
        assert_eq!(prepared.shape(), (100, 10));
        for column in prepared.column_iter() {
            let mean = column.sum() / 100.0;
            let var = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / 100.0;
            assert!(mean.abs() < 1e-12);
            assert_relative_eq!(var, 1.0, epsilon = 1e-12);
        }

        // Test idempotence across calls
        assert_eq!(prepared, prepare_data_for_pca(&data, true).unwrap());

        // Test no-op without normalization
        assert_eq!(prepare_data_for_pca(&data, false).unwrap(), data);
    }

    #[test]
    fn test_prepare_data_for_pca_invalid_input() {
        assert!(matches!(
            prepare_data_for_pca(&DMatrix::zeros(0, 3), true),
            Err(NeuroError::InvalidInput(_))
        ));
        assert!(matches!(
            prepare_data_for_pca(&DMatrix::zeros(3, 0), false),
            Err(NeuroError::InvalidInput(_))
        ));
        let data = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 2.0, 3.0]);
        assert!(matches!(
            prepare_data_for_pca(&data, false),
            Err(NeuroError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_prepare_data_for_pca_zero_variance() {
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 0.7, 2.0, 0.7, 3.0, 0.7]);
        assert!(matches!(
            prepare_data_for_pca(&data, true),
            Err(NeuroError::DegenerateInput(_))
        ));

        let preparation = DataPreparation {
            normalize: true,
            zero_variance: ZeroVariancePolicy::Skip,
        };
        let prepared = preparation.apply(&data).unwrap();
        assert!(prepared.column(1).iter().all(|v| v.abs() < 1e-12));
        assert_relative_eq!(prepared[(2, 0)], (1.5f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_perform_pca_invalid_input() {
        let data = random_matrix(20, 4, SEED);
        assert!(matches!(
            perform_pca(&data, ComponentSelection::Fixed(0)),
            Err(NeuroError::InvalidParameter(_))
        ));
        assert!(matches!(
            perform_pca(&data, ComponentSelection::Fixed(5)),
            Err(NeuroError::InvalidParameter(_))
        ));
        assert!(perform_pca(&data, ComponentSelection::VarianceThreshold(0.0)).is_err());
        assert!(perform_pca(&data, ComponentSelection::VarianceThreshold(1.5)).is_err());
        assert!(matches!(
            perform_pca(&random_matrix(1, 4, SEED), ComponentSelection::Fixed(1)),
            Err(NeuroError::InvalidInput(_))
        ));
        assert!(matches!(
            perform_pca(&DMatrix::from_element(5, 3, 2.0), ComponentSelection::Fixed(1)),
            Err(NeuroError::DegenerateInput(_))
        ));

        // Finite entries whose covariance overflows
        let huge = DMatrix::from_row_slice(
            4,
            3,
            &[1e200, -1e200, 1e200, -1e200, 1e200, -1e200, 1e200, 1e200, -1e200, -1e200, -1e200, 1e200],
        );
        match perform_pca(&huge, ComponentSelection::Fixed(1)) {
            Err(NeuroError::InvalidInput(msg)) => assert!(msg.contains("overflow")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_perform_pca_fixed() {
        let data = prepare_data_for_pca(&random_matrix(100, 10, SEED), true).unwrap();
        let pca = perform_pca(&data, ComponentSelection::Fixed(5)).unwrap();

        assert_eq!(pca.scores().shape(), (100, 5));
        assert_eq!(pca.components().shape(), (5, 10));
        assert_eq!(pca.explained_variance_ratio().len(), 5);
        assert_eq!(pca.loadings().shape(), (10, 5));

        // Sorted in descending order
        assert!(pca
            .explained_variance()
            .as_slice()
            .windows(2)
            .all(|w| w[0] >= w[1]));

        // Orthonormal loadings
        let gram = pca.components() * pca.components().transpose();
        assert!((gram - DMatrix::<f64>::identity(5, 5)).abs().max() < 1e-10);

        // Z-scored data: the total variance is the number of features (with the n - 1 denominator)
        assert_relative_eq!(pca.total_variance(), 10.0 * 100.0 / 99.0, epsilon = 1e-9);
        assert!(pca.explained_variance_ratio().sum() <= 1.0 + 1e-9);
    }

    #[test]
    fn test_perform_pca_threshold() {
        let data = prepare_data_for_pca(&random_matrix(200, 12, SEED), true).unwrap();
        let pca = perform_pca(&data, ComponentSelection::VarianceThreshold(0.9)).unwrap();
        let k = pca.n_components();
        let cumulative = pca.cumulative_explained_variance();

        assert!(k <= 12);
        assert!(cumulative[k - 1] >= 0.9);
        // k is the smallest such count
        if k > 1 {
            assert!(cumulative[k - 2] < 0.9);
        }
    }

    #[test]
    fn test_perform_pca_full_threshold_keeps_rank() {
        let data = low_rank_matrix(50, 6, 3, SEED);
        assert_eq!(data.rank(1e-9), 4);

        // Centering removes the offsets, leaving the rank of the latent mixing
        let pca = perform_pca(&data, ComponentSelection::VarianceThreshold(1.0)).unwrap();
        assert_eq!(pca.n_components(), 3);
        assert!(pca.explained_variance_ratio().sum() <= 1.0 + 1e-9);
        assert_relative_eq!(pca.explained_variance_ratio().sum(), 1.0, epsilon = 1e-9);

        // The kept components are enough to reproduce the data
        let reconstruction = reconstruct(&pca, 3).unwrap();
        assert!(relative_error(&reconstruction, &data) < 1e-9);
    }

    #[test]
    fn test_reconstruct_round_trip() {
        let data = prepare_data_for_pca(&random_matrix(60, 8, SEED), true).unwrap();
        let pca = perform_pca(&data, ComponentSelection::Fixed(8)).unwrap();
        let reconstruction = reconstruct(&pca, 8).unwrap();
        assert!(relative_error(&reconstruction, &data) < 1e-9);
    }

    #[test]
    fn test_reconstruction_error_is_non_increasing() {
        let data = prepare_data_for_pca(&random_matrix(60, 8, SEED), true).unwrap();
        let pca = perform_pca(&data, ComponentSelection::Fixed(8)).unwrap();
        let errors: Vec<f64> = (0..=8)
            .map(|n| reconstruction_error(&pca, &data, n).unwrap())
            .collect();
        assert!(errors.windows(2).all(|w| w[1] <= w[0] + 1e-12));
        assert!(errors[8] < 1e-20);

        // Reconstruction error equals the discarded variance (up to the n - 1 denominator)
        let discarded: f64 = pca.explained_variance().rows(3, 5).sum();
        assert_relative_eq!(errors[3] * 60.0 * 8.0 / 59.0, discarded, epsilon = 1e-9);
    }

    #[test]
    fn test_reconstruct_subset() {
        let data = prepare_data_for_pca(&random_matrix(40, 5, SEED), true).unwrap();
        let pca = perform_pca(&data, ComponentSelection::Fixed(4)).unwrap();

        let mean_only = reconstruct(&pca, 0).unwrap();
        for row in mean_only.row_iter() {
            assert!((row.transpose() - pca.mean()).abs().max() < 1e-12);
        }

        let ordered = reconstruct(&pca, 2).unwrap();
        let subset = reconstruct_subset(&pca, &[1, 0]).unwrap();
        assert!((ordered - subset).abs().max() < 1e-12);

        assert!(reconstruct(&pca, 5).is_err());
        assert!(reconstruct_subset(&pca, &[4]).is_err());
        assert!(reconstruct_subset(&pca, &[1, 1]).is_err());
    }

    #[test]
    fn test_transform() {
        let data = random_matrix(30, 4, SEED);
        let pca = perform_pca(&data, ComponentSelection::Fixed(2)).unwrap();
        let projected = pca.transform(&data).unwrap();
        assert!((projected - pca.scores()).abs().max() < 1e-12);
        assert!(matches!(
            pca.transform(&random_matrix(3, 5, SEED)),
            Err(NeuroError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_deterministic_signs() {
        let data = random_matrix(30, 4, SEED);
        let pca = perform_pca(&data, ComponentSelection::Fixed(4)).unwrap();
        for row in pca.components().row_iter() {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
            assert!(max >= -min);
        }
        assert_eq!(pca, perform_pca(&data, ComponentSelection::Fixed(4)).unwrap());
    }

    #[test]
    fn test_named_loadings_and_summary() {
        let data = random_matrix(30, 3, SEED);
        let pca = perform_pca(&data, ComponentSelection::Fixed(2)).unwrap();

        let loadings = pca.named_loadings(&["n0", "n1", "n2"]).unwrap();
        assert_eq!(loadings.len(), 3);
        assert_eq!(loadings[1].0, "n1");
        assert_eq!(loadings[1].1.len(), 2);
        assert!(pca.named_loadings(&["n0"]).is_err());

        let summary = pca.summary();
        assert_eq!(summary.n_components, 2);
        assert_eq!(summary.spectrum_ratio.len(), 3);
        assert_relative_eq!(summary.spectrum_ratio.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            summary.cumulative_explained_variance[1],
            summary.explained_variance_ratio[0] + summary.explained_variance_ratio[1],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_pca_params_run() {
        let data = random_matrix(50, 6, SEED);
        let params = PcaParams::default();
        let (prepared, pca) = params.run(&data).unwrap();
        assert_eq!(prepared, prepare_data_for_pca(&data, true).unwrap());
        assert!(pca.cumulative_explained_variance()[pca.n_components() - 1] >= 0.95);
    }
}
