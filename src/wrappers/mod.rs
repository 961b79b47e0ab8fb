//! Linear CCA solvers
//!
//! These fit closed-form projections on already-encoded views and are used
//! to post-process deep CCA latents. A solver must be fitted before it can
//! transform; transforming applies the training means and the learned
//! per-view weights.

mod mcca;
mod tcca;

pub use mcca::Mcca;
pub use tcca::TensorCca;

use crate::error::{Error, Result};
use crate::linalg::center_columns;
use ndarray::{Array1, Array2};

/// Weights and training means of a fitted linear solver
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    pub means: Vec<Array1<f64>>,
    pub weights: Vec<Array2<f64>>,
}

impl Projection {
    /// `(xᵥ - meanᵥ)·Wᵥ` for every view
    pub fn apply(&self, views: &[Array2<f64>]) -> Result<Vec<Array2<f64>>> {
        if views.len() != self.weights.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} views", self.weights.len()),
                actual: format!("{} views", views.len()),
            });
        }
        views
            .iter()
            .zip(self.means.iter().zip(&self.weights))
            .map(|(x, (mean, w))| {
                if x.ncols() != w.nrows() {
                    return Err(Error::ShapeMismatch {
                        expected: format!("{} features", w.nrows()),
                        actual: format!("{} features", x.ncols()),
                    });
                }
                Ok((x - mean).dot(w))
            })
            .collect()
    }
}

/// Validate a fitting batch and centre it
pub(crate) fn centre_views(
    views: &[Array2<f64>],
    latent_dims: usize,
) -> Result<(Vec<Array2<f64>>, Vec<Array1<f64>>)> {
    if views.len() < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "a linear CCA solver needs at least two views, got {}",
            views.len()
        )));
    }
    if latent_dims == 0 {
        return Err(Error::InvalidConfiguration("latent_dims must be positive".into()));
    }
    let rows = views[0].nrows();
    if rows < 2 {
        return Err(Error::InvalidConfiguration("fitting needs at least two samples".into()));
    }
    if let Some(bad) = views.iter().find(|v| v.nrows() != rows) {
        return Err(Error::ShapeMismatch {
            expected: format!("{rows} rows in every view"),
            actual: format!("{} rows", bad.nrows()),
        });
    }
    Ok(views.iter().map(|v| center_columns(&v.view())).unzip())
}
