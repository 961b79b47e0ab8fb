//! Two-view CCA objective

use super::{centered, regularized_cov};
use crate::autograd::{matmul, scale, sym_pow, top_eigvals_sum, trace, transpose};
use crate::error::{Error, Result};
use crate::Tensor;

/// Sum of the canonical correlations between two views.
///
/// With `T = Σ₁₁^{-1/2} Σ₁₂ Σ₂₂^{-1/2}` the correlations are the singular
/// values of `T`, i.e. the eigenvalues of `(TᵀT)^{1/2}`. Only the top
/// `latent_dims` enter the loss when fewer than the latent width are asked
/// for.
#[derive(Debug, Clone)]
pub struct Cca {
    pub latent_dims: usize,
    pub r: f64,
    pub eps: f64,
}

impl Cca {
    pub fn new(latent_dims: usize, r: f64, eps: f64) -> Self {
        Self { latent_dims, r, eps }
    }

    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        if views.len() != 2 {
            return Err(Error::InvalidConfiguration(format!(
                "cca objective takes exactly two views, got {}",
                views.len()
            )));
        }
        let m = views[0].rows();
        let h = centered(views);

        let sigma_11 = regularized_cov(&h[0], self.r);
        let sigma_22 = regularized_cov(&h[1], self.r);
        let sigma_12 = scale(&matmul(&transpose(&h[0]), &h[1]), 1.0 / (m - 1) as f64);

        let root_inv_11 = sym_pow(&sigma_11, -0.5, self.eps);
        let root_inv_22 = sym_pow(&sigma_22, -0.5, self.eps);
        let t = matmul(&matmul(&root_inv_11, &sigma_12), &root_inv_22);

        let tmp = matmul(&transpose(&t), &t);
        let singular = sym_pow(&tmp, 0.5, self.eps);
        let corr = if self.latent_dims >= tmp.rows() {
            trace(&singular)
        } else {
            top_eigvals_sum(&singular, self.latent_dims)
        };
        Ok(scale(&corr, -1.0))
    }
}
