//! This crate provides tools for simulating neural activity and analyzing it with PCA, for teaching purposes.
//!
//! Every stochastic operation takes an explicit seed and draws from its own generator,
//! so results are reproducible and calls can safely run concurrently.
//!
//! # Simulating Activity
//!
//! ```rust
//! use rusty_neuro::spike_train::generate_spike_train;
//! use rusty_neuro::population::generate_neural_population;
//! use rusty_neuro::lfp::{default_components, generate_lfp};
//!
//! // A 10 Hz Poisson neuron recorded for 5 seconds
//! let spike_train = generate_spike_train(5.0, 10.0, 42).unwrap();
//! assert_eq!(spike_train, generate_spike_train(5.0, 10.0, 42).unwrap());
//!
//! // 50 neurons firing around 15 Hz, binned in 10 ms windows
//! let population = generate_neural_population(50, 5.0, 15.0, 42).unwrap();
//! assert_eq!(population.counts().nrows(), 50);
//!
//! // Theta, alpha and beta oscillations plus noise, sampled at 1 kHz
//! let lfp = generate_lfp(2.0, 1000.0, &default_components(), 0.1, 42).unwrap();
//! assert_eq!(lfp.len(), 2001);
//! ```
//!
//! # Reducing Dimensionality
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use rusty_neuro::pca::{perform_pca, prepare_data_for_pca, reconstruct, ComponentSelection};
//!
//! let data = DMatrix::from_fn(40, 4, |i, j| ((i * (j + 1)) as f64).sin() + j as f64);
//! let data = prepare_data_for_pca(&data, true).unwrap();
//! let pca = perform_pca(&data, ComponentSelection::Fixed(4)).unwrap();
//!
//! // Keeping every component gives back the input
//! let reconstruction = reconstruct(&pca, 4).unwrap();
//! assert!((reconstruction - &data).norm() < 1e-9 * data.norm());
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod lfp;
pub mod pca;
pub mod population;
pub mod spike_train;
pub mod utils;

/// Minimum number of neurons to consider parallel processing.
pub const MIN_PARALLEL_NEURONS: usize = 100;
