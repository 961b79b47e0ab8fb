//! Deep tensor CCA

use super::{Dcca, DccaConfig, PostProcessor};
use crate::error::Result;
use crate::nn::Network;
use crate::objectives::{Objective, ObjectiveKind};
use crate::train::DeepModel;
use crate::Tensor;
use ndarray::Array2;
use rand::Rng;

/// Deep CCA on the tensor objective.
///
/// Training maximises the higher-order correlation of all views at once;
/// [`Dtcca::post_transform`] refits linear tensor CCA on the latents in
/// training mode and reuses the last fit otherwise.
pub struct Dtcca {
    inner: Dcca,
}

impl Dtcca {
    /// The configured objective is replaced by the tensor objective
    pub fn new(encoders: Vec<Network>, config: &DccaConfig) -> Result<Self> {
        let config = DccaConfig { objective: ObjectiveKind::Tcca, ..config.clone() };
        let inner = Dcca::new(encoders, &config)?
            .with_post_processor(PostProcessor::tensor(config.latent_dims));
        Ok(Self { inner })
    }

    pub fn build<R: Rng>(view_features: &[usize], config: &DccaConfig, rng: &mut R) -> Result<Self> {
        let config = DccaConfig { objective: ObjectiveKind::Tcca, ..config.clone() };
        let inner = Dcca::build(view_features, &config, rng)?
            .with_post_processor(PostProcessor::tensor(config.latent_dims));
        Ok(Self { inner })
    }

    pub fn latent_dims(&self) -> usize {
        self.inner.latent_dims()
    }

    pub fn objective(&self) -> &Objective {
        self.inner.objective()
    }

    pub fn parameters(&self) -> Vec<Tensor> {
        self.inner.parameters()
    }

    pub fn forward(&self, views: &[Tensor]) -> Result<Vec<Tensor>> {
        self.inner.forward(views)
    }

    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        self.inner.loss(views)
    }

    pub fn update_weights(&mut self, views: &[Tensor]) -> Result<f64> {
        self.inner.update_weights(views)
    }

    pub fn transform(&mut self, views: &[Array2<f64>], train: bool) -> Result<Vec<Array2<f64>>> {
        self.inner.transform(views, train)
    }

    pub fn post_transform(&mut self, z: &[Array2<f64>], train: bool) -> Result<Vec<Array2<f64>>> {
        self.inner.post_transform(z, train)
    }
}

impl DeepModel for Dtcca {
    fn update_weights(&mut self, views: &[Tensor]) -> Result<f64> {
        self.inner.update_weights(views)
    }

    fn name(&self) -> &'static str {
        "Dtcca"
    }
}
