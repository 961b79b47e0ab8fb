//! cca-zoo: canonical correlation analysis for multi-view learning
//!
//! Two loosely coupled parts share one data contract, a slice of
//! `Array2<f64>` views whose rows are samples:
//!
//! - [`data`]: a covariance-structured synthetic data generator with known
//!   ground-truth weights and correlation spectrum
//! - deep CCA training: [`models`] built from [`nn`] encoders, trained on
//!   [`objectives`] through the tape-based [`autograd`] engine with [`optim`]
//!   optimizers and the [`train`] loop; [`wrappers`] hold the linear solvers
//!   used to post-process learned latents
//!
//! # Example
//!
//! ```
//! use cca_zoo::data::{CovarianceDataGenerator, GeneratorConfig};
//! use cca_zoo::models::{Dcca, DccaConfig};
//! use cca_zoo::nn::NetworkKind;
//! use cca_zoo::train::{fit, TrainConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let generator = CovarianceDataGenerator::new(GeneratorConfig::new(vec![6, 5]))?;
//! let (views, _) = generator.generate(200, &mut rng)?;
//!
//! let config = DccaConfig { encoder: NetworkKind::Linear, lr: 1e-2, ..DccaConfig::default() };
//! let mut model = Dcca::build(&[6, 5], &config, &mut rng)?;
//! let result = fit(&mut model, &views, &TrainConfig::new().with_epochs(5))?;
//! assert!(result.final_loss.is_finite());
//! # Ok::<(), cca_zoo::Error>(())
//! ```

pub mod autograd;
pub mod config;
pub mod data;
pub mod decomp;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod models;
pub mod nn;
pub mod objectives;
pub mod optim;
pub mod trace;
pub mod train;
pub mod wrappers;

pub use autograd::Tensor;
pub use error::{Error, Result};
