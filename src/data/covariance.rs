//! Within-view covariance blocks

use super::CovarianceStructure;
use crate::error::{Error, Result};
use crate::linalg::{cholesky, svd, symmetrize, toeplitz};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// Redraws allowed for a positive-definite `random` block
pub const RANDOM_COV_DRAWS: usize = 10_000;

/// Covariance block of a view with `p` features
pub fn view_covariance<R: Rng>(
    structure: CovarianceStructure,
    p: usize,
    sigma: f64,
    rng: &mut R,
) -> Result<Array2<f64>> {
    match structure {
        CovarianceStructure::Identity => Ok(Array2::eye(p)),
        CovarianceStructure::Gaussian => Ok(gaussian_cov(p, sigma)),
        CovarianceStructure::Toeplitz => Ok(toeplitz_cov(p, sigma)),
        CovarianceStructure::Random => random_cov(p, rng),
        CovarianceStructure::Simple => Err(Error::InvalidConfiguration(
            "'simple' cannot be used as a per-view covariance structure".into(),
        )),
    }
}

/// Gaussian kernel over `linspace(-1, 1, p)`, scaled so its maximum is 1
pub fn gaussian_cov(p: usize, sigma: f64) -> Array2<f64> {
    if p == 1 {
        return Array2::ones((1, 1));
    }
    let dn = 2.0 / (p - 1) as f64;
    let grid = Array1::linspace(-1.0, 1.0, p);
    let norm = dn / ((2.0 * PI).sqrt() * sigma);
    let cov = Array2::from_shape_fn((p, p), |(i, j)| {
        let d = grid[j] - grid[i];
        (-d * d / (2.0 * sigma * sigma)).exp() * norm
    });
    let max = cov.iter().copied().fold(f64::MIN, f64::max);
    cov / max
}

/// Toeplitz matrix with first row `sigma^0, sigma^1, …, sigma^(p-1)`
pub fn toeplitz_cov(p: usize, sigma: f64) -> Array2<f64> {
    let first_row: Vec<f64> = (0..p).map(|k| sigma.powi(k as i32)).collect();
    toeplitz(&first_row)
}

/// `U·diag(1 + g)·Vᵀ` from the SVD of `AᵀA`, with `A` and `g` standard normal.
///
/// A draw is only positive-definite when every `1 + gᵢ` is positive, so
/// indefinite draws are rejected and redrawn, up to [`RANDOM_COV_DRAWS`]
/// times. The accepted block follows the same law as restarting the whole
/// joint construction, since the block is drawn independently of the rest.
pub fn random_cov<R: Rng>(p: usize, rng: &mut R) -> Result<Array2<f64>> {
    for draw in 1..=RANDOM_COV_DRAWS {
        let cov = random_cov_draw(p, rng)?;
        if cholesky(&cov.view()).is_some() {
            tracing::trace!(p, draw, "accepted random covariance block");
            return Ok(cov);
        }
    }
    Err(Error::CovarianceConstructionFailed { attempts: RANDOM_COV_DRAWS })
}

fn random_cov_draw<R: Rng>(p: usize, rng: &mut R) -> Result<Array2<f64>> {
    let a = Array2::from_shape_fn((p, p), |_| rng.sample::<f64, _>(StandardNormal));
    let (u, _, v_t) = svd(&a.t().dot(&a).view())?;
    let spectrum = Array1::from_shape_fn(p, |_| 1.0 + rng.sample::<f64, _>(StandardNormal));
    let cov = (&u * &spectrum).dot(&v_t);
    Ok(symmetrize(&cov.view()))
}
