//! CP-ALS (Canonical Polyadic decomposition via Alternating Least Squares)
//!
//! The CP decomposition factorizes a tensor X into a sum of rank-1 tensors:
//!
//! X ≈ Σᵣ λᵣ (u₁ᵣ ⊗ u₂ᵣ ⊗ ... ⊗ uₙᵣ)
//!
//! The ALS algorithm alternates between updating each factor matrix while
//! keeping the others fixed, using MTTKRP and a least-squares solve against
//! the Hadamard product of the other factors' Gram matrices.

use crate::error::{Error, Result};
use crate::linalg::{solve_right, svd};
use crate::trace::{TraceStep, TRACER};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Initialization strategy for CP-ALS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitStrategy {
    /// Random initialization from normal distribution N(0, 1)
    RandomNormal,
    /// Leading left singular vectors of each mode unfolding (HOSVD)
    #[default]
    Svd,
}

/// CP decomposition result
#[derive(Debug, Clone)]
pub struct CpDecomp {
    /// Factor matrices, one per mode, each of shape (Iₙ, R)
    pub factors: Vec<Array2<f64>>,

    /// Component weights; `None` when absorbed into the factors
    pub weights: Option<Array1<f64>>,

    /// fit = 1 - ‖X - X̂‖ / ‖X‖
    pub fit: f64,

    /// Number of iterations performed
    pub iters: usize,
}

impl CpDecomp {
    pub fn rank(&self) -> usize {
        self.factors.first().map_or(0, Array2::ncols)
    }

    /// Shape of the decomposed tensor
    pub fn shape(&self) -> Vec<usize> {
        self.factors.iter().map(Array2::nrows).collect()
    }

    /// Reconstruct X̂ = Σᵣ λᵣ (u₁ᵣ ⊗ ... ⊗ uₙᵣ)
    pub fn reconstruct(&self) -> ArrayD<f64> {
        let shape = self.shape();
        let rank = self.rank();
        ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
            (0..rank)
                .map(|r| {
                    let weight = self.weights.as_ref().map_or(1.0, |w| w[r]);
                    self.factors
                        .iter()
                        .enumerate()
                        .fold(weight, |acc, (mode, f)| acc * f[[idx[mode], r]])
                })
                .sum()
        })
    }

    /// Normalize factor columns to unit length, accumulating the norms as
    /// weights
    pub fn extract_weights(&mut self) {
        let rank = self.rank();
        let mut weights = self.weights.take().unwrap_or_else(|| Array1::ones(rank));
        for factor in &mut self.factors {
            for (r, mut column) in factor.columns_mut().into_iter().enumerate() {
                let norm = column.dot(&column).sqrt();
                if norm > f64::EPSILON {
                    weights[r] *= norm;
                    column /= norm;
                }
            }
        }
        self.weights = Some(weights);
    }
}

/// Compute CP-ALS decomposition of a tensor
///
/// # Arguments
///
/// * `tensor` - Input tensor to decompose
/// * `rank` - Target CP rank (number of components)
/// * `max_iters` - Maximum number of ALS iterations
/// * `tol` - Convergence tolerance on fit improvement
/// * `init` - Initialization strategy
/// * `rng` - Source for random initialization and rank padding
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] if the rank is 0 or exceeds a
/// mode size, or the tolerance is outside `[0, 1)`.
pub fn cp_als<R: Rng>(
    tensor: &ArrayD<f64>,
    rank: usize,
    max_iters: usize,
    tol: f64,
    init: InitStrategy,
    rng: &mut R,
) -> Result<CpDecomp> {
    let shape = tensor.shape().to_vec();

    if rank == 0 || shape.iter().any(|&mode_size| rank > mode_size) {
        return Err(Error::InvalidConfiguration(format!(
            "CP rank {rank} invalid for tensor of shape {shape:?}"
        )));
    }
    if !(0.0..1.0).contains(&tol) {
        return Err(Error::InvalidConfiguration(format!("CP tolerance {tol} must be in [0, 1)")));
    }

    TRACER.span(TraceStep::Decompose, format!("cp_als rank={rank}"), || {
        let mut factors = initialize_factors(tensor, rank, init, rng)?;
        let tensor_norm_sq = tensor.iter().map(|x| x * x).sum::<f64>();

        let mut prev_fit = 0.0;
        let mut fit = 0.0;
        let mut iters = 0;

        for iter in 0..max_iters {
            iters = iter + 1;

            for mode in 0..shape.len() {
                let mttkrp_result = mttkrp(tensor, &factors, mode);
                let gram = gram_hadamard(&factors, mode);
                factors[mode] = solve_right(&mttkrp_result.view(), &gram.view())?;
            }

            fit = compute_fit(tensor, &factors, tensor_norm_sq);

            if iter > 0 && (fit - prev_fit).abs() < tol {
                break;
            }
            prev_fit = fit;
        }

        tracing::trace!(rank, iters, fit, "cp_als finished");
        Ok(CpDecomp { factors, weights: None, fit, iters })
    })
}

/// Mode-`mode` unfolding: rows index `mode`, columns run over the remaining
/// modes in row-major order
pub fn unfold(tensor: &ArrayD<f64>, mode: usize) -> Array2<f64> {
    let shape = tensor.shape();
    let rows = shape[mode];
    let cols = tensor.len() / rows.max(1);
    let mut out = Array2::zeros((rows, cols));
    for (idx, &x) in tensor.indexed_iter() {
        let mut col = 0;
        for (m, &size) in shape.iter().enumerate() {
            if m != mode {
                col = col * size + idx[m];
            }
        }
        out[[idx[mode], col]] = x;
    }
    out
}

fn initialize_factors<R: Rng>(
    tensor: &ArrayD<f64>,
    rank: usize,
    init: InitStrategy,
    rng: &mut R,
) -> Result<Vec<Array2<f64>>> {
    let shape = tensor.shape();
    let mut factors = Vec::with_capacity(shape.len());

    match init {
        InitStrategy::RandomNormal => {
            let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Linalg(e.to_string()))?;
            for &mode_size in shape {
                factors.push(Array2::from_shape_fn((mode_size, rank), |_| normal.sample(rng)));
            }
        }
        InitStrategy::Svd => {
            let padding = Normal::new(0.0, 0.01).map_err(|e| Error::Linalg(e.to_string()))?;
            for (mode, &mode_size) in shape.iter().enumerate() {
                let (u, _, _) = svd(&unfold(tensor, mode).view())?;
                let available = rank.min(u.ncols());
                let factor = Array2::from_shape_fn((mode_size, rank), |(i, j)| {
                    if j < available {
                        u[[i, j]]
                    } else {
                        padding.sample(rng)
                    }
                });
                factors.push(factor);
            }
        }
    }

    Ok(factors)
}

/// Matricized tensor times Khatri–Rao product for one mode:
/// `M[i, r] = Σ_{idx: idx[mode] = i} X[idx] · Π_{m ≠ mode} F_m[idx[m], r]`
fn mttkrp(tensor: &ArrayD<f64>, factors: &[Array2<f64>], mode: usize) -> Array2<f64> {
    let rank = factors[0].ncols();
    let mut out = Array2::zeros((tensor.shape()[mode], rank));
    for (idx, &x) in tensor.indexed_iter() {
        if x == 0.0 {
            continue;
        }
        for r in 0..rank {
            let product = factors
                .iter()
                .enumerate()
                .filter(|(m, _)| *m != mode)
                .fold(x, |acc, (m, f)| acc * f[[idx[m], r]]);
            out[[idx[mode], r]] += product;
        }
    }
    out
}

/// Computes: G = (U₁ᵀU₁) ⊙ ... ⊙ (Uₙ₋₁ᵀUₙ₋₁) ⊙ (Uₙ₊₁ᵀUₙ₊₁) ⊙ ... ⊙ (UₙᵀUₙ)
fn gram_hadamard(factors: &[Array2<f64>], skip_mode: usize) -> Array2<f64> {
    let rank = factors[0].ncols();
    factors
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != skip_mode)
        .fold(Array2::ones((rank, rank)), |gram, (_, f)| gram * f.t().dot(f))
}

/// fit = 1 - ‖X - X̂‖ / ‖X‖, using ‖X - X̂‖² = ‖X‖² + ‖X̂‖² - 2⟨X, X̂⟩
fn compute_fit(tensor: &ArrayD<f64>, factors: &[Array2<f64>], tensor_norm_sq: f64) -> f64 {
    let rank = factors[0].ncols();
    let recon_norm_sq = factors
        .iter()
        .fold(Array2::<f64>::ones((rank, rank)), |gram, f| gram * f.t().dot(f))
        .sum();
    let inner = (&mttkrp(tensor, factors, 0) * &factors[0]).sum();

    let error = (tensor_norm_sq + recon_norm_sq - 2.0 * inner).max(0.0).sqrt();
    if tensor_norm_sq > 0.0 {
        (1.0 - error / tensor_norm_sq.sqrt()).clamp(0.0, 1.0)
    } else {
        1.0
    }
}
