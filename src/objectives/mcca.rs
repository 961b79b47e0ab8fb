//! Multiset CCA objective

use super::centered;
use crate::autograd::{
    add, add_scalar, concat_cols, matmul, mul, scale, sym_pow, top_eigvals_sum, transpose,
};
use crate::error::Result;
use crate::Tensor;
use ndarray::{s, Array2};

/// Leading eigenvalues of the whitened joint covariance.
///
/// `C` is the covariance of the concatenated views and `D` its regularised
/// block diagonal. The loss is `-(Σ top-k eig(D^{-1/2} C' D^{-1/2}) - k)`
/// where `C'` is `C` with its diagonal blocks replaced by `D`, so perfectly
/// correlated views score `-k`.
#[derive(Debug, Clone)]
pub struct Mcca {
    pub latent_dims: usize,
    pub r: f64,
    pub eps: f64,
}

impl Mcca {
    pub fn new(latent_dims: usize, r: f64, eps: f64) -> Self {
        Self { latent_dims, r, eps }
    }

    pub fn loss(&self, views: &[Tensor]) -> Result<Tensor> {
        let m = views[0].rows();
        let widths: Vec<usize> = views.iter().map(Tensor::cols).collect();
        let all = concat_cols(&centered(views));
        let total = all.cols();

        let c = scale(&matmul(&transpose(&all), &all), 1.0 / (m - 1) as f64);
        let block_mask = block_mask(&widths);
        let off_mask = block_mask.mapv(|x| 1.0 - x);

        let blocks = mul(&c, &Tensor::constant(block_mask));
        let d = add(&scale(&blocks, 1.0 - self.r), &scale(&Tensor::eye(total), self.r));
        let c_prime = add(&mul(&c, &Tensor::constant(off_mask)), &d);

        let r_half = sym_pow(&d, -0.5, self.eps);
        let whitened = matmul(&matmul(&r_half, &c_prime), &r_half);
        let corr = add_scalar(&top_eigvals_sum(&whitened, self.latent_dims), -(self.latent_dims as f64));
        Ok(scale(&corr, -1.0))
    }
}

/// Ones on the diagonal blocks of the given widths, zeros elsewhere
fn block_mask(widths: &[usize]) -> Array2<f64> {
    let total = widths.iter().sum();
    let mut mask = Array2::zeros((total, total));
    let mut offset = 0;
    for &w in widths {
        mask.slice_mut(s![offset..offset + w, offset..offset + w]).fill(1.0);
        offset += w;
    }
    mask
}
