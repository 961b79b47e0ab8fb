//! Correlation objectives for deep CCA
//!
//! Every objective maps a batch of latent representations, one tensor per
//! view, to a scalar differentiable loss equal to minus the correlation it
//! captures.

mod cca;
mod gcca;
mod mcca;
mod tcca;

pub use cca::Cca;
pub use gcca::Gcca;
pub use mcca::Mcca;
pub use tcca::Tcca;

use crate::autograd::{add, center, matmul, scale, transpose};
use crate::error::{Error, Result};
use crate::Tensor;
use serde::{Deserialize, Serialize};

/// Default eigenvalue floor for matrix powers inside objectives
pub const DEFAULT_EPS: f64 = 1e-5;

/// Objective family as it appears in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveKind {
    #[default]
    Cca,
    Gcca,
    Mcca,
    Tcca,
}

/// A correlation objective, resolved once from its configuration
#[derive(Debug, Clone)]
pub enum Objective {
    Cca(Cca),
    Gcca(Gcca),
    Mcca(Mcca),
    Tcca(Tcca),
}

impl Objective {
    /// Build the objective of the given family.
    ///
    /// `r` is the ridge regularisation blended into every covariance and
    /// `eps` the eigenvalue floor for matrix powers.
    pub fn new(kind: ObjectiveKind, latent_dims: usize, r: f64, eps: f64) -> Self {
        match kind {
            ObjectiveKind::Cca => Objective::Cca(Cca::new(latent_dims, r, eps)),
            ObjectiveKind::Gcca => Objective::Gcca(Gcca::new(latent_dims, r, eps)),
            ObjectiveKind::Mcca => Objective::Mcca(Mcca::new(latent_dims, r, eps)),
            ObjectiveKind::Tcca => Objective::Tcca(Tcca::new(latent_dims, r, eps)),
        }
    }

    pub fn kind(&self) -> ObjectiveKind {
        match self {
            Objective::Cca(_) => ObjectiveKind::Cca,
            Objective::Gcca(_) => ObjectiveKind::Gcca,
            Objective::Mcca(_) => ObjectiveKind::Mcca,
            Objective::Tcca(_) => ObjectiveKind::Tcca,
        }
    }

    /// Scalar loss for one batch of latents
    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        check_batch(views)?;
        match self {
            Objective::Cca(o) => o.loss(views),
            Objective::Gcca(o) => o.loss(views),
            Objective::Mcca(o) => o.loss(views),
            Objective::Tcca(o) => o.loss(views),
        }
    }
}

/// At least two views with equal row counts, and at least two rows
fn check_batch(views: &[Tensor]) -> Result<()> {
    if views.len() < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "correlation objectives need at least two views, got {}",
            views.len()
        )));
    }
    let rows = views[0].rows();
    if let Some(bad) = views.iter().find(|v| v.rows() != rows) {
        return Err(Error::ShapeMismatch {
            expected: format!("{rows} rows in every view"),
            actual: format!("{} rows", bad.rows()),
        });
    }
    if rows < 2 {
        return Err(Error::InvalidConfiguration("a batch needs at least two samples".into()));
    }
    Ok(())
}

/// `(1 - r)·HᵀH/(m - 1) + r·I` for a centred batch `H`
pub(crate) fn regularized_cov(h: &Tensor, r: f64) -> Tensor {
    let m = h.rows();
    let gram = matmul(&transpose(h), h);
    add(&scale(&gram, (1.0 - r) / (m - 1) as f64), &scale(&Tensor::eye(h.cols()), r))
}

/// Centre every view over the batch
pub(crate) fn centered(views: &[Tensor]) -> Vec<Tensor> {
    views.iter().map(center).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    fn gaussian(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_simple_fn((rows, cols), || rng.sample::<f64, _>(StandardNormal))
    }

    /// Two views spanning the same column space
    fn correlated_pair() -> (Tensor, Tensor) {
        let h = gaussian(50, 2, 7);
        let mixed = h.dot(&array![[2.0, 1.0], [-0.5, 3.0]]);
        (Tensor::new(h, true), Tensor::new(mixed, true))
    }

    #[test]
    fn test_cca_perfect_correlation() {
        let (a, b) = correlated_pair();
        let loss = Objective::new(ObjectiveKind::Cca, 2, 0.0, DEFAULT_EPS).loss(&[a, b]).unwrap();
        assert_abs_diff_eq!(loss.item(), -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cca_top_k_only() {
        let (a, b) = correlated_pair();
        let loss = Objective::new(ObjectiveKind::Cca, 1, 0.0, DEFAULT_EPS).loss(&[a, b]).unwrap();
        assert_abs_diff_eq!(loss.item(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cca_rejects_three_views() {
        let (a, b) = correlated_pair();
        let c = a.clone();
        let err = Objective::new(ObjectiveKind::Cca, 2, 0.0, DEFAULT_EPS).loss(&[a, b, c]);
        assert!(matches!(err, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_cca_independent_views_weak() {
        let a = Tensor::constant(gaussian(2000, 2, 1));
        let b = Tensor::constant(gaussian(2000, 2, 2));
        let loss = Objective::new(ObjectiveKind::Cca, 2, 0.0, DEFAULT_EPS).loss(&[a, b]).unwrap();
        assert!(loss.item() > -0.2, "loss {}", loss.item());
    }

    #[test]
    fn test_cca_gradient_reaches_inputs() {
        let a = Tensor::new(gaussian(40, 2, 3), true);
        let b = Tensor::new(gaussian(40, 2, 4), true);
        let loss = Objective::new(ObjectiveKind::Cca, 2, 0.1, DEFAULT_EPS)
            .loss(&[a.clone(), b.clone()])
            .unwrap();
        backward(&loss, None);
        let grad = a.grad().unwrap();
        assert!(grad.iter().all(|g| g.is_finite()));
        assert!(grad.iter().any(|g| g.abs() > 0.0));
        assert!(b.grad().is_some());
    }

    #[test]
    fn test_mcca_perfect_correlation() {
        let (a, b) = correlated_pair();
        let loss = Objective::new(ObjectiveKind::Mcca, 2, 0.0, DEFAULT_EPS).loss(&[a, b]).unwrap();
        assert_abs_diff_eq!(loss.item(), -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gcca_shared_subspace() {
        let (a, b) = correlated_pair();
        // Both projections coincide, so Q = 2P with rank 2
        let loss = Objective::new(ObjectiveKind::Gcca, 2, 0.0, DEFAULT_EPS).loss(&[a, b]).unwrap();
        assert_abs_diff_eq!(loss.item(), -4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gcca_three_views_gradient() {
        let views: Vec<Tensor> = (0..3).map(|s| Tensor::new(gaussian(20, 2, s), true)).collect();
        let loss = Objective::new(ObjectiveKind::Gcca, 2, 0.1, DEFAULT_EPS).loss(&views).unwrap();
        backward(&loss, None);
        for v in &views {
            assert!(v.grad().unwrap().iter().all(|g| g.is_finite()));
        }
    }

    #[test]
    fn test_tcca_loss_finite_and_differentiable() {
        let shared = gaussian(100, 2, 11);
        let views: Vec<Tensor> = (0..3)
            .map(|s| Tensor::new(&shared + &(gaussian(100, 2, 20 + s) * 0.3), true))
            .collect();
        let loss = Objective::new(ObjectiveKind::Tcca, 2, 0.1, DEFAULT_EPS).loss(&views).unwrap();
        assert!(loss.item().is_finite());
        assert!(loss.item() >= 0.0);
        backward(&loss, None);
        for v in &views {
            let grad = v.grad().unwrap();
            assert!(grad.iter().all(|g| g.is_finite()));
        }
    }

    #[test]
    fn test_tcca_two_views() {
        let (a, b) = correlated_pair();
        let loss = Objective::new(ObjectiveKind::Tcca, 2, 0.0, DEFAULT_EPS).loss(&[a, b]).unwrap();
        // For two views M is a 2x2 matrix, so a rank-2 CP fit is exact
        assert_abs_diff_eq!(loss.item(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_batch_validation() {
        let objective = Objective::new(ObjectiveKind::Cca, 1, 0.0, DEFAULT_EPS);
        let one = Tensor::constant(gaussian(5, 1, 0));
        assert!(matches!(objective.loss(&[one.clone()]), Err(Error::InvalidConfiguration(_))));

        let short = Tensor::constant(gaussian(4, 1, 1));
        assert!(matches!(
            objective.loss(&[one.clone(), short]),
            Err(Error::ShapeMismatch { .. })
        ));

        let single = Tensor::constant(array![[1.0]]);
        assert!(objective.loss(&[single.clone(), single]).is_err());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [ObjectiveKind::Cca, ObjectiveKind::Gcca, ObjectiveKind::Mcca, ObjectiveKind::Tcca] {
            assert_eq!(Objective::new(kind, 1, 0.0, DEFAULT_EPS).kind(), kind);
        }
        let parsed: ObjectiveKind = serde_yaml::from_str("tcca").unwrap();
        assert_eq!(parsed, ObjectiveKind::Tcca);
    }
}
