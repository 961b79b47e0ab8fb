//! Deep CCA

use super::{check_encoders, check_finite, encode_all, PostProcessor};
use super::DccaConfig;
use crate::autograd::backward;
use crate::error::Result;
use crate::nn::{Module, Network};
use crate::objectives::Objective;
use crate::optim::{Adam, Optimizer};
use crate::trace::{TraceStep, TRACER};
use crate::train::DeepModel;
use crate::Tensor;
use ndarray::Array2;
use rand::Rng;

/// Deep CCA: one encoder per view trained on a correlation objective.
///
/// After training, [`Dcca::transform`] passes the frozen encoder outputs
/// through a linear post-processing solver (multiset CCA unless built as a
/// tensor model).
pub struct Dcca {
    pub(crate) encoders: Vec<Network>,
    pub(crate) objective: Objective,
    pub(crate) optimizer: Adam,
    latent_dims: usize,
    r: f64,
    eps: f64,
    post: PostProcessor,
}

impl Dcca {
    /// Wrap existing encoders; each must output `latent_dims` columns
    pub fn new(encoders: Vec<Network>, config: &DccaConfig) -> Result<Self> {
        config.validate()?;
        check_encoders(&encoders, config.latent_dims)?;
        let params = encoders.iter().flat_map(Module::parameters).collect();
        Ok(Self {
            encoders,
            objective: Objective::new(config.objective, config.latent_dims, config.r, config.eps),
            optimizer: Adam::default_params(params, config.lr),
            latent_dims: config.latent_dims,
            r: config.r,
            eps: config.eps,
            post: PostProcessor::mcca(config.latent_dims, config.r),
        })
    }

    /// Build one encoder of `config.encoder` per view width
    pub fn build<R: Rng>(view_features: &[usize], config: &DccaConfig, rng: &mut R) -> Result<Self> {
        let encoders = view_features
            .iter()
            .map(|&p| Network::build(&config.encoder, p, config.latent_dims, &mut *rng))
            .collect();
        Self::new(encoders, config)
    }

    pub(crate) fn with_post_processor(mut self, post: PostProcessor) -> Self {
        self.post = post;
        self
    }

    pub fn latent_dims(&self) -> usize {
        self.latent_dims
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn encoders(&self) -> &[Network] {
        &self.encoders
    }

    pub fn parameters(&self) -> Vec<Tensor> {
        self.encoders.iter().flat_map(Module::parameters).collect()
    }

    /// Latent representation of every view
    pub fn forward(&self, views: &[Tensor]) -> Result<Vec<Tensor>> {
        encode_all(&self.encoders, views)
    }

    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        let z = self.forward(views)?;
        TRACER.span(TraceStep::Objective, format!("{:?}", self.objective.kind()), || {
            self.objective.loss(&z)
        })
    }

    /// One optimiser step on a batch; returns the loss before the step
    pub fn update_weights(&mut self, views: &[Tensor]) -> Result<f64> {
        self.optimizer.zero_grad();
        let loss = self.loss(views)?;
        let value = check_finite(&loss, "dcca update", true)?;
        TRACER.span(TraceStep::Backward, "dcca", || backward(&loss, None));
        TRACER.span(TraceStep::Step, "dcca", || self.optimizer.step());
        Ok(value)
    }

    /// Encode `views` without gradients and post-process.
    ///
    /// With `train` the post-processing solver is refitted on the latents.
    pub fn transform(&mut self, views: &[Array2<f64>], train: bool) -> Result<Vec<Array2<f64>>> {
        let inputs: Vec<Tensor> = views.iter().cloned().map(Tensor::constant).collect();
        let z = self.forward(&inputs)?.iter().map(Tensor::to_array).collect::<Vec<_>>();
        self.post_transform(&z, train)
    }

    pub fn post_transform(&mut self, z: &[Array2<f64>], train: bool) -> Result<Vec<Array2<f64>>> {
        self.post.apply(z, train)
    }
}

impl DeepModel for Dcca {
    fn update_weights(&mut self, views: &[Tensor]) -> Result<f64> {
        Dcca::update_weights(self, views)
    }

    fn name(&self) -> &'static str {
        "Dcca"
    }
}
