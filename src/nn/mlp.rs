//! Multi-layer perceptron

use super::{Linear, Module};
use crate::autograd::leaky_relu;
use crate::Tensor;
use rand::Rng;

/// Slope of the hidden-layer activation for negative inputs
pub const LEAKY_SLOPE: f64 = 0.01;

/// Hidden `Linear + LeakyReLU` blocks followed by a final `Linear`
pub struct Mlp {
    layers: Vec<Linear>,
}

impl Mlp {
    pub fn new<R: Rng>(
        input_dim: usize,
        hidden: &[usize],
        output_dim: usize,
        rng: &mut R,
    ) -> Self {
        let mut dims = Vec::with_capacity(hidden.len() + 2);
        dims.push(input_dim);
        dims.extend_from_slice(hidden);
        dims.push(output_dim);

        let layers = dims.windows(2).map(|w| Linear::new(w[0], w[1], true, &mut *rng)).collect();
        Self { layers }
    }

    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, Linear::in_features)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, Linear::out_features)
    }
}

impl Module for Mlp {
    fn forward(&self, x: &Tensor) -> Tensor {
        let last = self.layers.len().saturating_sub(1);
        let mut h = x.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h);
            if i < last {
                h = leaky_relu(&h, LEAKY_SLOPE);
            }
        }
        h
    }

    fn parameters(&self) -> Vec<Tensor> {
        self.layers.iter().flat_map(Module::parameters).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, sum};
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mlp_shapes_and_grads() {
        let mut rng = StdRng::seed_from_u64(0);
        let mlp = Mlp::new(5, &[8, 6], 2, &mut rng);
        assert_eq!(mlp.layers().len(), 3);
        assert_eq!(mlp.parameters().len(), 6);

        let x = Tensor::constant(Array2::from_elem((4, 5), 0.3));
        let y = mlp.forward(&x);
        assert_eq!(y.shape(), (4, 2));

        backward(&sum(&y), None);
        assert!(mlp.parameters().iter().all(|p| p.grad().is_some()));
    }

    #[test]
    fn test_no_hidden_is_affine() {
        let mut rng = StdRng::seed_from_u64(1);
        let mlp = Mlp::new(3, &[], 1, &mut rng);
        assert_eq!(mlp.layers().len(), 1);
    }
}
