//! Single-latent multi-view generator

use super::{MultiViewData, Sparsity};
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::index::sample;
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};

/// Views driven by one shared standard-normal latent `z`.
///
/// Each view is `z·wᵀ + noise` with `w ~ N(0, 1)` of shape `(p, 1)` and
/// Gaussian noise of standard deviation `eps` (`eps = 0` is noiseless).
/// A non-zero sparsity keeps that many random rows of `w` (fractions below 1
/// are rounded up) and zeroes the rest; an empty slice keeps all rows.
pub fn generate_simple_data<R: Rng>(
    n: usize,
    view_features: &[usize],
    view_sparsity: &[Sparsity],
    eps: f64,
    rng: &mut R,
) -> Result<MultiViewData> {
    if !view_sparsity.is_empty() && view_sparsity.len() != view_features.len() {
        return Err(Error::InvalidConfiguration(format!(
            "view_sparsity has {} entries for {} views",
            view_sparsity.len(),
            view_features.len()
        )));
    }
    if !(eps >= 0.0 && eps.is_finite()) {
        return Err(Error::InvalidConfiguration(format!(
            "noise level must be finite and non-negative, got {eps}"
        )));
    }
    let noise = Normal::new(0.0, eps)
        .map_err(|e| Error::InvalidConfiguration(format!("noise level {eps}: {e}")))?;

    let z = Array1::from_shape_fn(n, |_| rng.sample::<f64, _>(StandardNormal)).insert_axis(Axis(1));
    let mut views = Vec::with_capacity(view_features.len());
    let mut weights = Vec::with_capacity(view_features.len());

    for (v, &p) in view_features.iter().enumerate() {
        let mut w = Array2::from_shape_fn((p, 1), |_| rng.sample::<f64, _>(StandardNormal));
        let active = match view_sparsity.get(v).copied() {
            None | Some(Sparsity::Count(0)) => p,
            Some(Sparsity::Count(k)) => k.min(p),
            Some(Sparsity::Fraction(f)) if f < 1.0 => ((f * p as f64).ceil() as usize).min(p),
            Some(Sparsity::Fraction(_)) => p,
        };
        for row in sample(rng, p, p - active) {
            w[[row, 0]] = 0.0;
        }

        let mut view = z.dot(&w.t());
        if eps > 0.0 {
            view.mapv_inplace(|x| x + noise.sample(rng));
        }
        views.push(view);
        weights.push(w);
    }
    Ok((views, weights))
}
