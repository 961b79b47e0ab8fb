//! Declarative experiment configuration
//!
//! An experiment is one YAML document: the synthetic data to generate, the
//! model to train on it and the training loop settings.
//!
//! ```yaml
//! samples: 400
//! seed: 3
//! data:
//!   view_features: [10, 8]
//!   latent_dims: 2
//! model:
//!   type: dcca
//!   latent_dims: 2
//!   encoder:
//!     kind: linear
//! training:
//!   epochs: 20
//!   batch_size: 100
//! ```

mod run;
mod schema;
mod validate;

pub use run::{load_spec, run_experiment, run_from_yaml, ExperimentReport};
pub use schema::{ExperimentSpec, ModelSpec};
pub use validate::validate_spec;
