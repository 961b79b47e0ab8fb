//! Tensor CCA

use super::mcca::unit_variance;
use super::{centre_views, Projection};
use crate::decomp::{cp_als, InitStrategy};
use crate::error::{Error, Result};
use crate::linalg::{mat_pow, regularized_covariance, row_khatri_rao};
use ndarray::{Array2, ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CP_MAX_ITERS: usize = 200;
const CP_TOL: f64 = 1e-8;

/// Linear tensor CCA.
///
/// Whitens each view with its regularised covariance, decomposes the
/// cross-moment tensor `mean_n(z¹ ⊗ … ⊗ zᵐ)` with a rank-`latent_dims` CP
/// model, and maps each factor back through the whitening:
/// `Wᵥ = Σᵥ^{-1/2}·Fᵥ`.
#[derive(Debug, Clone)]
pub struct TensorCca {
    latent_dims: usize,
    r: f64,
    eps: f64,
    seed: u64,
    fitted: Option<Projection>,
}

impl TensorCca {
    pub fn new(latent_dims: usize) -> Self {
        Self { latent_dims, r: 0.0, eps: 1e-9, seed: 0, fitted: None }
    }

    /// Ridge blended into each view covariance before whitening
    pub fn with_regularisation(mut self, r: f64) -> Self {
        self.r = r;
        self
    }

    /// Eigenvalue floor used by the whitening power
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Seed for the decomposition's random padding
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn latent_dims(&self) -> usize {
        self.latent_dims
    }

    pub fn weights(&self) -> Option<&[Array2<f64>]> {
        self.fitted.as_ref().map(|p| p.weights.as_slice())
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fit(&mut self, views: &[Array2<f64>]) -> Result<&mut Self> {
        let (centred, means) = centre_views(views, self.latent_dims)?;
        let n = centred[0].nrows();

        let whitening: Vec<Array2<f64>> = centred
            .iter()
            .map(|h| mat_pow(&regularized_covariance(&h.view(), self.r).view(), -0.5, self.eps))
            .collect();
        let z: Vec<Array2<f64>> = centred.iter().zip(&whitening).map(|(h, w)| h.dot(w)).collect();

        let rest = z[2..].iter().fold(z[1].clone(), |acc, zv| row_khatri_rao(&acc.view(), &zv.view()));
        let unfolded = z[0].t().dot(&rest) / n as f64;
        let shape: Vec<usize> = z.iter().map(Array2::ncols).collect();
        let moment = ArrayD::from_shape_vec(IxDyn(&shape), unfolded.iter().copied().collect())
            .map_err(|e| Error::Linalg(format!("moment tensor reshape: {e}")))?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let cp = cp_als(&moment, self.latent_dims, CP_MAX_ITERS, CP_TOL, InitStrategy::Svd, &mut rng)?;
        tracing::debug!(fit = cp.fit, iters = cp.iters, "tensor cca decomposition");

        let weights = whitening
            .iter()
            .zip(&cp.factors)
            .zip(&centred)
            .map(|((w, factor), h)| {
                let mut wv = w.dot(factor);
                unit_variance(&mut wv, h);
                wv
            })
            .collect();
        self.fitted = Some(Projection { means, weights });
        Ok(self)
    }

    pub fn transform(&self, views: &[Array2<f64>]) -> Result<Vec<Array2<f64>>> {
        self.fitted.as_ref().ok_or(Error::NotFitted("TensorCca"))?.apply(views)
    }

    pub fn fit_transform(&mut self, views: &[Array2<f64>]) -> Result<Vec<Array2<f64>>> {
        self.fit(views)?.transform(views)
    }
}
