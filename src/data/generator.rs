//! Covariance-structured multi-view generator

use super::{
    view_covariance, Correlation, CovarianceStructure, GeneratorConfig, MultiViewData, Sparsity,
};
use crate::error::{Error, Result};
use crate::linalg::{block_diag, cholesky};
use crate::trace::{TraceStep, TRACER};
use ndarray::{s, Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;

/// Diagonal jitter, relative to the largest variance, added before the joint
/// factorization; a unit correlation makes the joint covariance singular.
const CHOLESKY_JITTER: f64 = 1e-10;

/// Samples views from a joint covariance with a prescribed correlation
/// spectrum between views.
#[derive(Debug, Clone)]
pub struct CovarianceDataGenerator {
    config: GeneratorConfig,
    correlation: Vec<f64>,
}

impl CovarianceDataGenerator {
    /// Validate `config` and expand its correlation spectrum
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let correlation = config.correlation.expand(config.latent_dims, config.decay)?;
        Ok(Self { config, correlation })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Per-dimension target correlations
    pub fn correlation(&self) -> &[f64] {
        &self.correlation
    }

    /// Draw `n` samples of every view together with the true weights.
    ///
    /// Each attempt rebuilds the covariance blocks and weights from fresh
    /// random draws; attempts whose joint covariance is not positive-definite
    /// are discarded. After `max_attempts` failures the call returns
    /// [`Error::CovarianceConstructionFailed`].
    pub fn generate<R: Rng>(&self, n: usize, rng: &mut R) -> Result<MultiViewData> {
        let max_attempts = self.config.max_attempts;
        for attempt in 1..=max_attempts {
            match self.attempt(n, rng)? {
                Some(data) => {
                    tracing::debug!(attempt, n, views = self.config.num_views(), "generated covariance data");
                    return Ok(data);
                }
                None => tracing::debug!(attempt, "joint covariance not positive-definite, retrying"),
            }
        }
        tracing::warn!(max_attempts, "giving up on joint covariance construction");
        Err(Error::CovarianceConstructionFailed { attempts: max_attempts })
    }

    /// One pass of the construction; `Ok(None)` marks a failed attempt
    fn attempt<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Option<MultiViewData>> {
        let config = &self.config;
        let latent_dims = config.latent_dims;
        let mut covs = Vec::with_capacity(config.num_views());
        let mut weights = Vec::with_capacity(config.num_views());

        for (v, &p) in config.view_features.iter().enumerate() {
            let cov = view_covariance(config.structure(v), p, config.sigma, rng)?;
            let mut w = standard_normal(p, latent_dims, rng);

            let active = config.sparsity(v).active_features(p);
            if active < p {
                let Some(mask) = sparsity_mask(p, active, latent_dims, config.max_attempts, rng)
                else {
                    return Ok(None);
                };
                w *= &mask;
                if config.positive(v) {
                    w.mapv_inplace(|x| x.max(0.0));
                }
            }

            decorrelate_dims(&mut w, &cov);
            if !normalize_weights(&mut w, &cov) {
                return Ok(None);
            }
            covs.push(cov);
            weights.push(w);
        }

        let joint = TRACER.span(TraceStep::Covariance, "joint", || {
            joint_covariance(&covs, &weights, &self.correlation)
        });
        let jitter = CHOLESKY_JITTER * joint.diag().fold(0.0_f64, |m, v| m.max(v.abs())).max(1.0);
        let Some(chol) = TRACER.span(TraceStep::Cholesky, "joint", || {
            cholesky(&(&joint + &(Array2::<f64>::eye(joint.nrows()) * jitter)).view())
        }) else {
            return Ok(None);
        };

        // each row is L·ε for ε ~ N(0, I)
        let total = joint.nrows();
        let samples = standard_normal(n, total, rng).dot(&chol.t());

        let mut views = Vec::with_capacity(config.num_views());
        let mut offset = 0;
        for &p in &config.view_features {
            views.push(samples.slice(s![.., offset..offset + p]).to_owned());
            offset += p;
        }
        Ok(Some((views, weights)))
    }
}

/// Generate multi-view data with a prescribed population correlation.
///
/// Empty per-view slices use the defaults (dense weights, identity
/// covariance, unconstrained signs). See [`CovarianceDataGenerator`] for the
/// retry semantics.
///
/// Sparse supports are exact only for the first latent column of each weight
/// matrix; decorrelating later columns against earlier ones can widen their
/// support beyond the sampled mask.
#[allow(clippy::too_many_arguments)]
pub fn generate_covariance_data<R: Rng>(
    n: usize,
    view_features: &[usize],
    latent_dims: usize,
    view_sparsity: &[Sparsity],
    correlation: Correlation,
    structure: &[CovarianceStructure],
    sigma: f64,
    decay: f64,
    positive: &[bool],
    rng: &mut R,
) -> Result<MultiViewData> {
    let config = GeneratorConfig::new(view_features.to_vec())
        .with_latent_dims(latent_dims)
        .with_sparsity(view_sparsity.to_vec())
        .with_correlation(correlation)
        .with_structure(structure.to_vec())
        .with_sigma(sigma)
        .with_decay(decay)
        .with_positive(positive.to_vec());
    CovarianceDataGenerator::new(config)?.generate(n, rng)
}

/// Joint covariance from per-view blocks and true weights.
///
/// Diagonal blocks are the view covariances; block `(i, j)` is
/// `Σ_k corr[k] · Σᵢ wᵢₖ wⱼₖᵀ Σⱼ` and block `(j, i)` its transpose.
pub fn joint_covariance(covs: &[Array2<f64>], weights: &[Array2<f64>], correlation: &[f64]) -> Array2<f64> {
    let mut joint = block_diag(covs);
    let corr = Array1::from(correlation.to_vec());
    let projected: Vec<Array2<f64>> = covs.iter().zip(weights).map(|(c, w)| c.dot(w)).collect();

    let offsets: Vec<usize> = covs
        .iter()
        .scan(0, |acc, c| {
            let start = *acc;
            *acc += c.nrows();
            Some(start)
        })
        .collect();

    for i in 0..covs.len() {
        for j in i + 1..covs.len() {
            let cross = (&projected[i] * &corr).dot(&projected[j].t());
            let (ri, rj) = (offsets[i], offsets[j]);
            let (pi, pj) = cross.dim();
            joint.slice_mut(s![ri..ri + pi, rj..rj + pj]).assign(&cross);
            joint.slice_mut(s![rj..rj + pj, ri..ri + pi]).assign(&cross.t());
        }
    }
    joint
}

/// Activation mask `(p, latent_dims)` with exactly `active` ones per column
/// and pairwise distinct columns.
///
/// Every column is an independent random permutation of the same pattern;
/// the whole mask is redrawn until the columns are distinct, at most
/// `max_draws` times.
pub fn sparsity_mask<R: Rng>(
    p: usize,
    active: usize,
    latent_dims: usize,
    max_draws: usize,
    rng: &mut R,
) -> Option<Array2<f64>> {
    let mut rows: Vec<usize> = (0..p).collect();
    for _ in 0..max_draws {
        let mut mask = Array2::zeros((p, latent_dims));
        for mut column in mask.columns_mut() {
            rows.shuffle(rng);
            for &r in &rows[..active] {
                column[r] = 1.0;
            }
        }
        if columns_distinct(&mask) {
            return Some(mask);
        }
    }
    None
}

fn columns_distinct(mask: &Array2<f64>) -> bool {
    let columns: Vec<_> = mask.columns().into_iter().collect();
    columns.iter().enumerate().all(|(i, a)| columns[i + 1..].iter().all(|b| a != b))
}

/// Make the columns of `weights` orthogonal under `cov`.
///
/// Column `k` is stripped of its `cov`-projection onto column `k - 1` for
/// every later column in turn, which is Gram–Schmidt in the `cov` inner
/// product.
pub fn decorrelate_dims(weights: &mut Array2<f64>, cov: &Array2<f64>) {
    let d = weights.ncols();
    let mut gram = weights.t().dot(cov).dot(&*weights);
    for k in 1..d {
        let pivot = gram[[k - 1, k - 1]];
        let coeffs = gram.slice(s![k - 1, k..]).mapv(|a| a / pivot);
        let prev = weights.column(k - 1).to_owned();
        let update = prev.insert_axis(Axis(1)).dot(&coeffs.insert_axis(Axis(0)));
        let mut tail = weights.slice_mut(s![.., k..]);
        tail -= &update;
        gram = weights.t().dot(cov).dot(&*weights);
    }
}

/// Scale each column so `wₖᵀ·cov·wₖ = 1`; false when a column has no
/// finite positive norm.
pub fn normalize_weights(weights: &mut Array2<f64>, cov: &Array2<f64>) -> bool {
    let norms = weights.t().dot(cov).dot(&*weights).diag().mapv(f64::sqrt);
    if norms.iter().any(|n| !(n.is_finite() && *n > 0.0)) {
        return false;
    }
    *weights /= &norms;
    true
}

fn standard_normal<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.sample(StandardNormal))
}
