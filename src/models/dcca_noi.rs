//! Deep CCA by non-linear orthogonal iterations

use super::{check_encoders, check_finite, encode_all, NoiConfig, PostProcessor};
use crate::autograd::backward;
use crate::error::{Error, Result};
use crate::linalg::mat_pow;
use crate::nn::{Linear, Module, Network};
use crate::optim::{Adam, Optimizer};
use crate::trace::{TraceStep, TRACER};
use crate::train::{DeepModel, LossFn, MSELoss};
use crate::Tensor;
use ndarray::Array2;
use rand::Rng;

/// Two-view deep CCA trained towards whitened targets.
///
/// Each encoder is followed by a bias-free `Linear(latent_dims, latent_dims)`.
/// Per batch the latents are frozen, the running covariance of each view is
/// blended with the batch estimate `N·zᵀz/b`, and each view's latents are
/// regressed onto the other view's whitened latents with a summed MSE.
pub struct DccaNoi {
    pub(crate) encoders: Vec<Network>,
    pub(crate) linear_layers: Vec<Linear>,
    pub(crate) optimizer: Adam,
    latent_dims: usize,
    n: usize,
    rho: f64,
    eps: f64,
    covs: Option<Vec<Array2<f64>>>,
    mse: MSELoss,
    post: PostProcessor,
}

impl DccaNoi {
    pub fn new<R: Rng>(encoders: Vec<Network>, config: &NoiConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        check_encoders(&encoders, config.latent_dims)?;
        if encoders.len() != 2 {
            return Err(Error::InvalidConfiguration(format!(
                "orthogonal iterations take exactly two views, got {}",
                encoders.len()
            )));
        }

        let n = config.n.ok_or_else(|| {
            Error::InvalidConfiguration("orthogonal iterations need the training sample count n".into())
        })?;

        let linear_layers: Vec<Linear> = encoders
            .iter()
            .map(|_| Linear::new(config.latent_dims, config.latent_dims, false, &mut *rng))
            .collect();
        let params = encoders
            .iter()
            .flat_map(Module::parameters)
            .chain(linear_layers.iter().flat_map(Module::parameters))
            .collect();

        Ok(Self {
            encoders,
            linear_layers,
            optimizer: Adam::default_params(params, config.lr),
            latent_dims: config.latent_dims,
            n,
            rho: config.rho,
            eps: config.eps,
            covs: None,
            mse: MSELoss::sum(),
            post: PostProcessor::mcca(config.latent_dims, config.r),
        })
    }

    pub fn build<R: Rng>(view_features: &[usize], config: &NoiConfig, rng: &mut R) -> Result<Self> {
        let encoders = view_features
            .iter()
            .map(|&p| Network::build(&config.encoder, p, config.latent_dims, &mut *rng))
            .collect();
        Self::new(encoders, config, rng)
    }

    pub fn latent_dims(&self) -> usize {
        self.latent_dims
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Running covariance estimate per view, `None` before the first batch
    pub fn covariances(&self) -> Option<&[Array2<f64>]> {
        self.covs.as_deref()
    }

    /// Forget the running covariance estimate
    pub fn reset_covariances(&mut self) {
        self.covs = None;
    }

    pub fn parameters(&self) -> Vec<Tensor> {
        self.optimizer.params().to_vec()
    }

    /// Encoder followed by the view's linear layer
    pub fn forward(&self, views: &[Tensor]) -> Result<Vec<Tensor>> {
        let z = encode_all(&self.encoders, views)?;
        Ok(z.iter().zip(&self.linear_layers).map(|(z, layer)| layer.forward(z)).collect())
    }

    /// Loss on a batch; updates the running covariances as a side effect
    pub fn loss(&mut self, views: &[Tensor]) -> Result<Tensor> {
        let z = self.forward(views)?;
        let frozen: Vec<Array2<f64>> = z.iter().map(Tensor::to_array).collect();
        self.update_covariances(&frozen);

        let preds: Vec<Tensor> = TRACER.span(TraceStep::Covariance, "noi whitening", || {
            let covs = self.covs.as_deref().unwrap_or_default();
            frozen
                .iter()
                .zip(covs)
                .map(|(zv, cov)| Tensor::constant(zv.dot(&mat_pow(&cov.view(), -0.5, self.eps))))
                .collect()
        });

        let loss = crate::autograd::add(
            &self.mse.forward(&z[0], &preds[1]),
            &self.mse.forward(&z[1], &preds[0]),
        );
        Ok(loss)
    }

    /// `N·zᵀz/b` per view, blended into the running estimate
    fn update_covariances(&mut self, z: &[Array2<f64>]) {
        let batch_covs = z.iter().map(|zv| {
            let b = zv.nrows().max(1) as f64;
            zv.t().dot(zv) * (self.n as f64 / b)
        });
        self.covs = Some(match self.covs.take() {
            Some(prev) => prev
                .into_iter()
                .zip(batch_covs)
                .map(|(cov, batch)| cov * self.rho + batch * (1.0 - self.rho))
                .collect(),
            None => batch_covs.collect(),
        });
    }

    pub fn update_weights(&mut self, views: &[Tensor]) -> Result<f64> {
        self.optimizer.zero_grad();
        let loss = self.loss(views)?;
        let value = check_finite(&loss, "noi update", true)?;
        TRACER.span(TraceStep::Backward, "noi", || backward(&loss, None));
        TRACER.span(TraceStep::Step, "noi", || self.optimizer.step());
        Ok(value)
    }

    /// Encode without gradients and post-process with multiset CCA
    pub fn transform(&mut self, views: &[Array2<f64>], train: bool) -> Result<Vec<Array2<f64>>> {
        let inputs: Vec<Tensor> = views.iter().cloned().map(Tensor::constant).collect();
        let z = self.forward(&inputs)?.iter().map(Tensor::to_array).collect::<Vec<_>>();
        self.post.apply(&z, train)
    }
}

impl DeepModel for DccaNoi {
    fn update_weights(&mut self, views: &[Tensor]) -> Result<f64> {
        DccaNoi::update_weights(self, views)
    }

    fn name(&self) -> &'static str {
        "DccaNoi"
    }
}
