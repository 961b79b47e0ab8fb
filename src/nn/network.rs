//! Built-in encoder/decoder architectures

use super::{Linear, Mlp, Module};
use crate::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};

fn default_hidden() -> Vec<usize> {
    vec![128]
}

/// Architecture selector as it appears in configuration files
///
/// ```yaml
/// kind: fcn
/// hidden: [64, 64]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NetworkKind {
    /// Fully connected network with LeakyReLU hidden layers
    Fcn {
        #[serde(default = "default_hidden")]
        hidden: Vec<usize>,
    },
    /// Single affine map
    Linear,
}

impl Default for NetworkKind {
    fn default() -> Self {
        NetworkKind::Fcn { hidden: default_hidden() }
    }
}

/// An encoder or decoder
pub enum Network {
    Fcn(Mlp),
    Linear(Linear),
}

impl Network {
    /// Instantiate the architecture for the given input and output widths
    pub fn build<R: Rng>(
        kind: &NetworkKind,
        input_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> Self {
        match kind {
            NetworkKind::Fcn { hidden } => {
                Network::Fcn(Mlp::new(input_dim, hidden, output_dim, rng))
            }
            NetworkKind::Linear => Network::Linear(Linear::new(input_dim, output_dim, true, rng)),
        }
    }

    pub fn input_dim(&self) -> usize {
        match self {
            Network::Fcn(mlp) => mlp.input_dim(),
            Network::Linear(linear) => linear.in_features(),
        }
    }

    pub fn output_dim(&self) -> usize {
        match self {
            Network::Fcn(mlp) => mlp.output_dim(),
            Network::Linear(linear) => linear.out_features(),
        }
    }
}

impl Module for Network {
    fn forward(&self, x: &Tensor) -> Tensor {
        match self {
            Network::Fcn(mlp) => mlp.forward(x),
            Network::Linear(linear) => linear.forward(x),
        }
    }

    fn parameters(&self) -> Vec<Tensor> {
        match self {
            Network::Fcn(mlp) => mlp.parameters(),
            Network::Linear(linear) => linear.parameters(),
        }
    }
}
