//! Generalized CCA objective

use super::centered;
use crate::autograd::{add, matmul, scale, sym_pow, top_eigvals_sum, transpose};
use crate::error::Result;
use crate::Tensor;

/// Leading eigenvalues of the summed view projections
/// `Q = Σᵥ Hᵥ((1 - r)HᵥᵀHᵥ + rI)⁻¹Hᵥᵀ`.
///
/// `Q` is `(batch, batch)`; for `r = 0` each term is the orthogonal projection
/// onto a view's column space.
#[derive(Debug, Clone)]
pub struct Gcca {
    pub latent_dims: usize,
    pub r: f64,
    pub eps: f64,
}

impl Gcca {
    pub fn new(latent_dims: usize, r: f64, eps: f64) -> Self {
        Self { latent_dims, r, eps }
    }

    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        let projections = centered(views).into_iter().map(|h| {
            let gram = matmul(&transpose(&h), &h);
            let reg = add(&scale(&gram, 1.0 - self.r), &scale(&Tensor::eye(h.cols()), self.r));
            matmul(&matmul(&h, &sym_pow(&reg, -1.0, self.eps)), &transpose(&h))
        });
        let q = projections.reduce(|acc, p| add(&acc, &p)).unwrap_or_else(|| Tensor::eye(0));
        Ok(scale(&top_eigvals_sum(&q, self.latent_dims), -1.0))
    }
}
