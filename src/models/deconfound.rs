//! Deconfounding adversarial deep CCA

use super::{check_finite, DeconfoundingConfig};
use crate::autograd::{backward, scale, sub};
use crate::error::{Error, Result};
use crate::nn::{Module, Network};
use crate::objectives::Objective;
use crate::optim::{clip_grad_norm, Adam, Optimizer};
use crate::trace::{TraceStep, TRACER};
use crate::train::{LossFn, MSELoss};
use crate::Tensor;
use rand::Rng;

/// Two-view deep CCA that hides a confound from its latents.
///
/// Encoders map the views to latents; a decoder per latent tries to predict
/// the confound. The shared loss is
/// `objective(z₁, z₂) − λ₁·MSE(x_c, ẑ_c1) − λ₂·MSE(x_c, ẑ_c2)`. Encoders
/// minimise it, which rewards confound-free latents; decoders minimise its
/// negation, which trains them to recover the confound.
pub struct DeconfoundingDcca {
    pub(crate) encoder_1: Network,
    pub(crate) encoder_2: Network,
    pub(crate) decoder_c1: Network,
    pub(crate) decoder_c2: Network,
    objective: Objective,
    /// Encoder parameters
    pub(crate) optimizer: Adam,
    /// Decoder parameters
    pub(crate) optimizer_c: Adam,
    lambda_1: f64,
    lambda_2: f64,
    latent_dims: usize,
    check_finite: bool,
    max_grad_norm: Option<f64>,
    mse: MSELoss,
}

impl DeconfoundingDcca {
    pub fn new(
        encoders: [Network; 2],
        decoders: [Network; 2],
        config: &DeconfoundingConfig,
    ) -> Result<Self> {
        config.validate()?;
        let [encoder_1, encoder_2] = encoders;
        let [decoder_c1, decoder_c2] = decoders;

        for (name, width) in [("encoder_1", encoder_1.output_dim()), ("encoder_2", encoder_2.output_dim())] {
            if width != config.latent_dims {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} outputs {width} columns, expected latent_dims = {}",
                    config.latent_dims
                )));
            }
        }
        for (name, width) in [("decoder_c1", decoder_c1.input_dim()), ("decoder_c2", decoder_c2.input_dim())] {
            if width != config.latent_dims {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} takes {width} inputs, expected latent_dims = {}",
                    config.latent_dims
                )));
            }
        }
        if decoder_c1.output_dim() != decoder_c2.output_dim() {
            return Err(Error::InvalidConfiguration(
                "both decoders must predict the same confound width".into(),
            ));
        }

        let encoder_params = encoder_1.parameters().into_iter().chain(encoder_2.parameters()).collect();
        let decoder_params = decoder_c1.parameters().into_iter().chain(decoder_c2.parameters()).collect();

        Ok(Self {
            encoder_1,
            encoder_2,
            decoder_c1,
            decoder_c2,
            objective: Objective::new(config.objective, config.latent_dims, config.r, config.eps),
            optimizer: Adam::default_params(encoder_params, config.lr),
            optimizer_c: Adam::default_params(decoder_params, config.lr),
            lambda_1: config.lambda_1,
            lambda_2: config.lambda_2,
            latent_dims: config.latent_dims,
            check_finite: config.check_finite,
            max_grad_norm: config.max_grad_norm,
            mse: MSELoss::default(),
        })
    }

    /// Build encoders and decoders from the configured architectures
    pub fn build<R: Rng>(
        input_1: usize,
        input_2: usize,
        input_c: usize,
        config: &DeconfoundingConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let k = config.latent_dims;
        let encoders = [
            Network::build(&config.encoder_1, input_1, k, rng),
            Network::build(&config.encoder_2, input_2, k, rng),
        ];
        let decoders = [
            Network::build(&config.decoder, k, input_c, rng),
            Network::build(&config.decoder, k, input_c, rng),
        ];
        Self::new(encoders, decoders, config)
    }

    pub fn latent_dims(&self) -> usize {
        self.latent_dims
    }

    pub fn encoder_parameters(&self) -> &[Tensor] {
        self.optimizer.params()
    }

    pub fn decoder_parameters(&self) -> &[Tensor] {
        self.optimizer_c.params()
    }

    /// Latents of both views and the decoders' confound predictions.
    ///
    /// `_x_c` is accepted so every entry point takes the same triple.
    pub fn encode(&self, x_1: &Tensor, x_2: &Tensor, _x_c: &Tensor) -> (Tensor, Tensor, Tensor, Tensor) {
        let (z_1, z_2) = TRACER.span(TraceStep::Encode, "deconfounding", || {
            (self.encoder_1.forward(x_1), self.encoder_2.forward(x_2))
        });
        let z_c1 = self.decoder_c1.forward(&z_1);
        let z_c2 = self.decoder_c2.forward(&z_2);
        (z_1, z_2, z_c1, z_c2)
    }

    pub fn forward(&self, x_1: &Tensor, x_2: &Tensor, x_c: &Tensor) -> (Tensor, Tensor) {
        let (z_1, z_2, _, _) = self.encode(x_1, x_2, x_c);
        (z_1, z_2)
    }

    pub fn loss(&self, x_1: &Tensor, x_2: &Tensor, x_c: &Tensor) -> Result<Tensor> {
        if x_c.cols() != self.decoder_c1.output_dim() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} confound columns", self.decoder_c1.output_dim()),
                actual: format!("{} confound columns", x_c.cols()),
            });
        }
        let (z_1, z_2, z_c1, z_c2) = self.encode(x_1, x_2, x_c);
        let cca = TRACER.span(TraceStep::Objective, "deconfounding", || {
            self.objective.loss(&[z_1, z_2])
        })?;
        let conf_1 = self.mse.forward(x_c, &z_c1);
        let conf_2 = self.mse.forward(x_c, &z_c2);
        Ok(sub(&sub(&cca, &scale(&conf_1, self.lambda_1)), &scale(&conf_2, self.lambda_2)))
    }

    /// Alternating update: encoders on the loss, then decoders on its
    /// negation. Returns the encoder-phase loss.
    ///
    /// # Errors
    ///
    /// With `check_finite`, a non-finite loss in either phase returns
    /// [`Error::NumericalDivergence`] before that phase's step. An error in
    /// the decoder phase leaves the encoder step applied.
    pub fn update_weights(&mut self, x_1: &Tensor, x_2: &Tensor, x_c: &Tensor) -> Result<f64> {
        self.optimizer.zero_grad();
        let loss = self.loss(x_1, x_2, x_c)?;
        let value = check_finite(&loss, "encoder phase", self.check_finite)?;
        TRACER.span(TraceStep::Backward, "encoder phase", || backward(&loss, None));
        if let Some(max_norm) = self.max_grad_norm {
            clip_grad_norm(self.optimizer.params(), max_norm);
        }
        TRACER.span(TraceStep::Step, "encoder phase", || self.optimizer.step());

        self.optimizer_c.zero_grad();
        let confound_loss = scale(&self.loss(x_1, x_2, x_c)?, -1.0);
        check_finite(&confound_loss, "decoder phase", self.check_finite)?;
        TRACER.span(TraceStep::Backward, "decoder phase", || backward(&confound_loss, None));
        if let Some(max_norm) = self.max_grad_norm {
            clip_grad_norm(self.optimizer_c.params(), max_norm);
        }
        TRACER.span(TraceStep::Step, "decoder phase", || self.optimizer_c.step());

        Ok(value)
    }
}
