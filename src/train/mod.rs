//! Minibatch training loop
//!
//! This module provides:
//! - Row-aligned minibatching across views
//! - The MSE loss used by the orthogonal-iteration and deconfounding models
//! - Training configuration and epoch bookkeeping
//! - [`fit`] for any [`DeepModel`] and [`fit_deconfounding`] for the
//!   adversarial model
//!
//! # Example
//!
//! ```no_run
//! use cca_zoo::models::{Dcca, DccaConfig};
//! use cca_zoo::train::{fit, TrainConfig};
//! use ndarray::Array2;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let views = vec![Array2::<f64>::zeros((64, 8)), Array2::<f64>::zeros((64, 6))];
//! let mut model = Dcca::build(&[8, 6], &DccaConfig::default(), &mut rng)?;
//! let result = fit(&mut model, &views, &TrainConfig::new().with_epochs(5))?;
//! println!("final loss {:.4}", result.final_loss);
//! # Ok::<(), cca_zoo::Error>(())
//! ```

mod batch;
mod config;
mod loss;
mod trainer;

pub use batch::{minibatch_indices, Batch};
pub use config::{MetricsTracker, TrainConfig};
pub use loss::{LossFn, MSELoss, Reduction};
pub use trainer::{fit, fit_deconfounding, DeepModel, TrainResult};
