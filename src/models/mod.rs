//! Deep CCA models
//!
//! - [`Dcca`]: encoders per view trained on a correlation objective
//! - [`Dtcca`]: deep CCA on the tensor objective with tensor CCA
//!   post-processing
//! - [`DccaNoi`]: deep CCA by non-linear orthogonal iterations with a running
//!   covariance estimate
//! - [`DeconfoundingDcca`]: two-view deep CCA trained adversarially against
//!   decoders that predict a confound from the latents

mod config;
mod dcca;
mod dcca_noi;
mod deconfound;
mod dtcca;

pub use config::{DccaConfig, DeconfoundingConfig, NoiConfig};
pub use dcca::Dcca;
pub use dcca_noi::DccaNoi;
pub use deconfound::DeconfoundingDcca;
pub use dtcca::Dtcca;

use crate::error::{Error, Result};
use crate::nn::{Module, Network};
use crate::trace::{TraceStep, TRACER};
use crate::wrappers::{Mcca, TensorCca};
use crate::Tensor;
use ndarray::Array2;

/// Linear solver applied to frozen latents
#[derive(Debug, Clone)]
pub(crate) enum PostProcessor {
    Mcca(Mcca),
    Tensor(TensorCca),
}

impl PostProcessor {
    pub fn mcca(latent_dims: usize, r: f64) -> Self {
        PostProcessor::Mcca(Mcca::new(latent_dims, r))
    }

    pub fn tensor(latent_dims: usize) -> Self {
        PostProcessor::Tensor(TensorCca::new(latent_dims))
    }

    /// Refit on `z` when `train`, then transform `z`
    pub fn apply(&mut self, z: &[Array2<f64>], train: bool) -> Result<Vec<Array2<f64>>> {
        match self {
            PostProcessor::Mcca(solver) => {
                if train {
                    *solver = Mcca::new(solver.latent_dims(), solver.r());
                    solver.fit(z)?;
                }
                solver.transform(z)
            }
            PostProcessor::Tensor(solver) => {
                if train {
                    *solver = TensorCca::new(solver.latent_dims());
                    solver.fit(z)?;
                }
                solver.transform(z)
            }
        }
    }
}

/// Every encoder must map to `latent_dims` columns
pub(crate) fn check_encoders(encoders: &[Network], latent_dims: usize) -> Result<()> {
    if encoders.len() < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "deep CCA needs at least two encoders, got {}",
            encoders.len()
        )));
    }
    if let Some((i, bad)) = encoders.iter().enumerate().find(|(_, e)| e.output_dim() != latent_dims) {
        return Err(Error::InvalidConfiguration(format!(
            "encoder {i} outputs {} columns, expected latent_dims = {latent_dims}",
            bad.output_dim()
        )));
    }
    Ok(())
}

/// Run each view through its encoder
pub(crate) fn encode_all(encoders: &[Network], views: &[Tensor]) -> Result<Vec<Tensor>> {
    if views.len() != encoders.len() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} views", encoders.len()),
            actual: format!("{} views", views.len()),
        });
    }
    encoders
        .iter()
        .zip(views)
        .map(|(encoder, x)| {
            if x.cols() != encoder.input_dim() {
                return Err(Error::ShapeMismatch {
                    expected: format!("{} features", encoder.input_dim()),
                    actual: format!("{} features", x.cols()),
                });
            }
            Ok(TRACER.span(TraceStep::Encode, format!("{:?}", x.shape()), || encoder.forward(x)))
        })
        .collect()
}

/// Loss value, or `NumericalDivergence` when `enabled` and it is not finite
pub(crate) fn check_finite(loss: &Tensor, stage: &'static str, enabled: bool) -> Result<f64> {
    let value = loss.item();
    if enabled && !value.is_finite() {
        tracing::warn!(stage, value, "non-finite loss");
        return Err(Error::NumericalDivergence { stage, value });
    }
    Ok(value)
}
