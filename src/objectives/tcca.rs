//! Tensor CCA objective

use super::{centered, regularized_cov};
use crate::autograd::{frobenius_norm, matmul, row_khatri_rao, scale, sub, sym_pow, transpose};
use crate::decomp::{cp_als, InitStrategy};
use crate::error::{Error, Result};
use crate::Tensor;
use ndarray::{Array2, ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CP_MAX_ITERS: usize = 100;
const CP_TOL: f64 = 1e-7;

/// Distance between the whitened cross-moment tensor and its best
/// rank-`latent_dims` CP approximation.
///
/// Each view is whitened with its regularised covariance, the order-m moment
/// `M = mean_n(z¹ ⊗ … ⊗ zᵐ)` is formed through its mode-1 unfolding, and the
/// loss is `‖M - M̂‖_F` with `M̂` fitted to a frozen copy of `M`.
#[derive(Debug, Clone)]
pub struct Tcca {
    pub latent_dims: usize,
    pub r: f64,
    pub eps: f64,
}

impl Tcca {
    pub fn new(latent_dims: usize, r: f64, eps: f64) -> Self {
        Self { latent_dims, r, eps }
    }

    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        let m = views[0].rows();
        let whitened: Vec<Tensor> = centered(views)
            .iter()
            .map(|h| matmul(h, &sym_pow(&regularized_cov(h, self.r), -0.5, self.eps)))
            .collect();

        let rest = whitened[2..]
            .iter()
            .fold(whitened[1].clone(), |acc, z| row_khatri_rao(&acc, z));
        let moment = scale(&matmul(&transpose(&whitened[0]), &rest), 1.0 / m as f64);

        let shape: Vec<usize> = whitened.iter().map(Tensor::cols).collect();
        let target = cp_target(&moment.to_array(), &shape, self.latent_dims)?;
        Ok(frobenius_norm(&sub(&moment, &Tensor::constant(target))))
    }
}

/// Rank-`rank` CP approximation of the tensor whose mode-1 unfolding is
/// `unfolded`, returned in the same unfolded layout
pub(crate) fn cp_target(unfolded: &Array2<f64>, shape: &[usize], rank: usize) -> Result<Array2<f64>> {
    let tensor = ArrayD::from_shape_vec(IxDyn(shape), unfolded.iter().copied().collect())
        .map_err(|e| Error::Linalg(format!("moment tensor reshape: {e}")))?;
    let mut rng = StdRng::seed_from_u64(0);
    let cp = cp_als(&tensor, rank, CP_MAX_ITERS, CP_TOL, InitStrategy::Svd, &mut rng)?;
    Array2::from_shape_vec(unfolded.dim(), cp.reconstruct().iter().copied().collect())
        .map_err(|e| Error::Linalg(format!("reconstruction reshape: {e}")))
}
