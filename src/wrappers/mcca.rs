//! Regularised multiset CCA

use super::{centre_views, Projection};
use crate::error::{Error, Result};
use crate::linalg::{block_diag, mat_pow, regularized_covariance, symmetric_eigen};
use ndarray::{concatenate, s, Array2, Axis};

const EIGEN_FLOOR: f64 = 1e-12;

/// Multiset CCA solved as the eigenproblem of the whitened joint covariance.
///
/// With `C` the covariance of the concatenated views and `D` its regularised
/// block diagonal, the weights are `D^{-1/2}·U` for the leading eigenvectors
/// `U` of `D^{-1/2} C' D^{-1/2}`, where `C'` is `C` with its diagonal blocks
/// replaced by `D`. Each view's projections are rescaled to unit variance.
#[derive(Debug, Clone)]
pub struct Mcca {
    latent_dims: usize,
    r: f64,
    fitted: Option<Projection>,
}

impl Mcca {
    pub fn new(latent_dims: usize, r: f64) -> Self {
        Self { latent_dims, r, fitted: None }
    }

    pub fn latent_dims(&self) -> usize {
        self.latent_dims
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    /// Per-view weights `(p_v, latent_dims)`, if fitted
    pub fn weights(&self) -> Option<&[Array2<f64>]> {
        self.fitted.as_ref().map(|p| p.weights.as_slice())
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fit(&mut self, views: &[Array2<f64>]) -> Result<&mut Self> {
        let (centred, means) = centre_views(views, self.latent_dims)?;
        let widths: Vec<usize> = centred.iter().map(Array2::ncols).collect();
        let total: usize = widths.iter().sum();
        if self.latent_dims > total {
            return Err(Error::InvalidConfiguration(format!(
                "latent_dims {} exceeds the {total} joint features",
                self.latent_dims
            )));
        }

        let joint = {
            let parts: Vec<_> = centred.iter().map(Array2::view).collect();
            concatenate(Axis(1), &parts).map_err(|e| Error::Linalg(e.to_string()))?
        };
        let n = joint.nrows();
        let c = joint.t().dot(&joint) / (n - 1) as f64;

        let d = block_diag(
            &centred.iter().map(|h| regularized_covariance(&h.view(), self.r)).collect::<Vec<_>>(),
        );
        let mut c_prime = c;
        let mut offset = 0;
        for &w in &widths {
            let block = s![offset..offset + w, offset..offset + w];
            c_prime.slice_mut(block).assign(&d.slice(block));
            offset += w;
        }

        let r_half = mat_pow(&d.view(), -0.5, EIGEN_FLOOR);
        let whitened = r_half.dot(&c_prime).dot(&r_half);
        let (_, vectors) = symmetric_eigen(&whitened.view());
        // ascending order: leading eigenvectors are the last columns, largest first
        let leading = Array2::from_shape_fn((total, self.latent_dims), |(row, k)| {
            vectors[[row, total - 1 - k]]
        });
        let all_weights = r_half.dot(&leading);

        let mut weights = Vec::with_capacity(widths.len());
        let mut offset = 0;
        for (h, &w) in centred.iter().zip(&widths) {
            let mut wv = all_weights.slice(s![offset..offset + w, ..]).to_owned();
            unit_variance(&mut wv, h);
            weights.push(wv);
            offset += w;
        }

        tracing::debug!(views = views.len(), latent_dims = self.latent_dims, "mcca fitted");
        self.fitted = Some(Projection { means, weights });
        Ok(self)
    }

    pub fn transform(&self, views: &[Array2<f64>]) -> Result<Vec<Array2<f64>>> {
        self.fitted.as_ref().ok_or(Error::NotFitted("Mcca"))?.apply(views)
    }

    pub fn fit_transform(&mut self, views: &[Array2<f64>]) -> Result<Vec<Array2<f64>>> {
        self.fit(views)?.transform(views)
    }
}

/// Scale columns so the projected centred data has unit sample variance
pub(crate) fn unit_variance(weights: &mut Array2<f64>, centred: &Array2<f64>) {
    let n = centred.nrows().saturating_sub(1).max(1) as f64;
    let scores = centred.dot(&*weights);
    for (k, mut column) in weights.columns_mut().into_iter().enumerate() {
        let std = (scores.column(k).dot(&scores.column(k)) / n).sqrt();
        if std > f64::EPSILON {
            column /= std;
        }
    }
}
