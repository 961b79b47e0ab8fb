//! Model configuration
//!
//! Every model is built from a serde-deserializable config whose missing
//! fields take the defaults below, then checked with `validate`.

use crate::error::{Error, Result};
use crate::nn::NetworkKind;
use crate::objectives::{ObjectiveKind, DEFAULT_EPS};
use serde::{Deserialize, Serialize};

/// Deep CCA (and deep tensor CCA) configuration
///
/// ```yaml
/// latent_dims: 2
/// objective: gcca
/// encoder:
///   kind: fcn
///   hidden: [64]
/// lr: 0.001
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DccaConfig {
    pub latent_dims: usize,
    pub objective: ObjectiveKind,
    pub encoder: NetworkKind,
    /// Ridge regularisation blended into every covariance
    pub r: f64,
    /// Eigenvalue floor for matrix powers
    pub eps: f64,
    pub lr: f64,
}

impl Default for DccaConfig {
    fn default() -> Self {
        Self {
            latent_dims: 1,
            objective: ObjectiveKind::Cca,
            encoder: NetworkKind::default(),
            r: 0.0,
            eps: DEFAULT_EPS,
            lr: 1e-3,
        }
    }
}

impl DccaConfig {
    pub fn validate(&self) -> Result<()> {
        check_common(self.latent_dims, self.r, self.eps, self.lr)
    }
}

/// Deep CCA by non-linear orthogonal iterations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiConfig {
    pub latent_dims: usize,
    /// Sample count the running covariance is scaled to; experiment runs
    /// fill it from `samples` when left out
    pub n: Option<usize>,
    /// Covariance memory: weight kept on the previous estimate
    pub rho: f64,
    pub encoder: NetworkKind,
    /// Ridge regularisation of the post-processing solver
    pub r: f64,
    pub eps: f64,
    pub lr: f64,
}

impl Default for NoiConfig {
    fn default() -> Self {
        Self {
            latent_dims: 1,
            n: None,
            rho: 0.2,
            encoder: NetworkKind::default(),
            r: 0.0,
            eps: 1e-9,
            lr: 1e-3,
        }
    }
}

impl NoiConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.rho) {
            return Err(Error::InvalidConfiguration(format!(
                "rho should be between 0 and 1. rho={}",
                self.rho
            )));
        }
        if self.n == Some(0) {
            return Err(Error::InvalidConfiguration("n must be positive".into()));
        }
        check_common(self.latent_dims, self.r, self.eps, self.lr)
    }
}

/// Deconfounding adversarial deep CCA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeconfoundingConfig {
    pub latent_dims: usize,
    pub objective: ObjectiveKind,
    pub encoder_1: NetworkKind,
    pub encoder_2: NetworkKind,
    /// Architecture of both confound decoders
    pub decoder: NetworkKind,
    pub lr: f64,
    pub lambda_1: f64,
    pub lambda_2: f64,
    pub r: f64,
    pub eps: f64,
    /// Fail an update whose loss is NaN or infinite before stepping
    pub check_finite: bool,
    /// Clip each phase's gradient to this global norm
    pub max_grad_norm: Option<f64>,
}

impl Default for DeconfoundingConfig {
    fn default() -> Self {
        Self {
            latent_dims: 2,
            objective: ObjectiveKind::Cca,
            encoder_1: NetworkKind::default(),
            encoder_2: NetworkKind::default(),
            decoder: NetworkKind::default(),
            lr: 1e-3,
            lambda_1: 1_000_000.0,
            lambda_2: 1_000_000.0,
            r: 0.0,
            eps: DEFAULT_EPS,
            check_finite: true,
            max_grad_norm: None,
        }
    }
}

impl DeconfoundingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.objective == ObjectiveKind::Tcca {
            return Err(Error::InvalidConfiguration(
                "deconfounding supports the cca, gcca and mcca objectives".into(),
            ));
        }
        if !(self.lambda_1.is_finite() && self.lambda_2.is_finite()) {
            return Err(Error::InvalidConfiguration("lambda weights must be finite".into()));
        }
        if self.max_grad_norm.is_some_and(|m| m <= 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "max_grad_norm must be positive, got {:?}",
                self.max_grad_norm
            )));
        }
        check_common(self.latent_dims, self.r, self.eps, self.lr)
    }
}

fn check_common(latent_dims: usize, r: f64, eps: f64, lr: f64) -> Result<()> {
    if latent_dims == 0 {
        return Err(Error::InvalidConfiguration("latent_dims must be positive".into()));
    }
    if !(0.0..=1.0).contains(&r) {
        return Err(Error::InvalidConfiguration(format!("r must be in [0, 1], got {r}")));
    }
    if eps <= 0.0 {
        return Err(Error::InvalidConfiguration(format!("eps must be positive, got {eps}")));
    }
    if lr <= 0.0 || !lr.is_finite() {
        return Err(Error::InvalidConfiguration(format!("learning rate must be positive, got {lr}")));
    }
    Ok(())
}
