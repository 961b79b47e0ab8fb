//! Synthetic multi-view data
//!
//! [`generate_covariance_data`] builds a joint covariance with a prescribed
//! cross-view correlation spectrum and samples views from the matching
//! multivariate normal, returning the views together with the ground-truth
//! weights that generated them. [`generate_simple_data`] draws views from a
//! single shared latent variable.
//!
//! ```
//! use cca_zoo::data::{CovarianceDataGenerator, GeneratorConfig};
//! use rand::SeedableRng;
//!
//! let config = GeneratorConfig::new(vec![10, 10]);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let (views, weights) = CovarianceDataGenerator::new(config)?.generate(200, &mut rng)?;
//! assert_eq!(views[0].dim(), (200, 10));
//! assert_eq!(weights[1].dim(), (10, 1));
//! # Ok::<(), cca_zoo::Error>(())
//! ```

mod config;
mod covariance;
mod generator;
mod simple;

#[cfg(test)]
mod proptests;

pub use config::{Correlation, CovarianceStructure, GeneratorConfig, Sparsity};
pub use covariance::{gaussian_cov, random_cov, toeplitz_cov, view_covariance};
pub use generator::{
    decorrelate_dims, generate_covariance_data, joint_covariance, normalize_weights,
    sparsity_mask, CovarianceDataGenerator,
};
pub use simple::generate_simple_data;

use ndarray::Array2;

/// Sampled views and the true weights that generated them, one entry per view
pub type MultiViewData = (Vec<Array2<f64>>, Vec<Array2<f64>>);
