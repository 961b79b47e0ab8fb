//! Fully connected layer

use super::Module;
use crate::autograd::{add_bias, matmul};
use crate::Tensor;
use ndarray::Array2;
use rand::Rng;

/// Affine layer `y = x·W + b`
///
/// `W` is stored as `(in_features, out_features)`.
pub struct Linear {
    /// Weight (in_features x out_features)
    pub weight: Tensor,
    /// Optional bias row (1 x out_features)
    pub bias: Option<Tensor>,
}

impl Linear {
    /// Create a layer with uniform initialisation in `±1/√in_features`
    pub fn new<R: Rng>(
        in_features: usize,
        out_features: usize,
        bias: bool,
        rng: &mut R,
    ) -> Self {
        let bound = 1.0 / (in_features.max(1) as f64).sqrt();
        let mut init = |rows, cols| {
            Array2::from_shape_fn((rows, cols), |_| rng.random_range(-bound..bound))
        };
        let weight = Tensor::new(init(in_features, out_features), true);
        let bias = bias.then(|| Tensor::new(init(1, out_features), true));
        Self { weight, bias }
    }

    /// Build a layer around existing weights
    pub fn from_weights(weight: Array2<f64>, bias: Option<Array2<f64>>) -> Self {
        Self { weight: Tensor::new(weight, true), bias: bias.map(|b| Tensor::new(b, true)) }
    }

    pub fn in_features(&self) -> usize {
        self.weight.rows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.cols()
    }
}

impl Module for Linear {
    fn forward(&self, x: &Tensor) -> Tensor {
        let out = matmul(x, &self.weight);
        match &self.bias {
            Some(bias) => add_bias(&out, bias),
            None => out,
        }
    }

    fn parameters(&self) -> Vec<Tensor> {
        let mut params = vec![self.weight.clone()];
        params.extend(self.bias.iter().cloned());
        params
    }
}
