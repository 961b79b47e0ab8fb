//! Dense linear algebra on `ndarray` matrices, backed by `nalgebra`.
//!
//! Cholesky, symmetric eigendecomposition, SVD and least-squares solves are
//! delegated to nalgebra; this module converts between the two
//! representations and adds the structured constructors (Toeplitz, block
//! diagonal) the data generator needs.

use crate::error::{Error, Result};
use nalgebra::DMatrix;
use ndarray::{s, Array1, Array2, ArrayView2};

/// Copy an ndarray matrix into a column-major nalgebra matrix
pub fn to_dmatrix(a: &ArrayView2<'_, f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

/// Copy an nalgebra matrix back into ndarray
pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// `(A + Aᵀ) / 2`
pub fn symmetrize(a: &ArrayView2<'_, f64>) -> Array2<f64> {
    (a + &a.t()) * 0.5
}

/// Lower Cholesky factor `L` with `A = L Lᵀ`, or `None` when `A` is not
/// positive-definite (or contains non-finite values).
pub fn cholesky(a: &ArrayView2<'_, f64>) -> Option<Array2<f64>> {
    if a.iter().any(|v| !v.is_finite()) {
        return None;
    }
    to_dmatrix(a).cholesky().map(|c| from_dmatrix(&c.l()))
}

/// Eigendecomposition of the symmetric part of `a`.
///
/// Returns eigenvalues in ascending order and the matching eigenvectors as
/// columns. Non-finite input yields NaN eigenvalues and identity vectors
/// instead of iterating forever.
pub fn symmetric_eigen(a: &ArrayView2<'_, f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    if a.iter().any(|v| !v.is_finite()) {
        return (Array1::from_elem(n, f64::NAN), Array2::eye(n));
    }
    let eig = to_dmatrix(&symmetrize(a).view()).symmetric_eigen();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    let values = Array1::from_iter(order.iter().map(|&i| eig.eigenvalues[i]));
    let vectors = Array2::from_shape_fn((n, n), |(row, col)| eig.eigenvectors[(row, order[col])]);
    (values, vectors)
}

/// Matrix power of a symmetric matrix with eigenvalues floored at `eps`:
/// `V · diag(max(λ, eps)^p) · Vᵀ`.
pub fn mat_pow(a: &ArrayView2<'_, f64>, p: f64, eps: f64) -> Array2<f64> {
    let (values, vectors) = symmetric_eigen(a);
    let powered = values.mapv(|l| floored_pow(l, p, eps));
    (&vectors * &powered).dot(&vectors.t())
}

/// `max(l, eps)^p`, keeping NaN as NaN
pub fn floored_pow(l: f64, p: f64, eps: f64) -> f64 {
    if l.is_nan() {
        l
    } else {
        l.max(eps).powf(p)
    }
}

/// Thin singular value decomposition `A = U · diag(S) · Vᵀ`.
pub fn svd(a: &ArrayView2<'_, f64>) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    if a.iter().any(|v| !v.is_finite()) {
        return Err(Error::Linalg("SVD of a matrix with non-finite entries".into()));
    }
    let decomposition = to_dmatrix(a).svd(true, true);
    let u = decomposition.u.as_ref().ok_or_else(|| Error::Linalg("SVD did not return U".into()))?;
    let v_t =
        decomposition.v_t.as_ref().ok_or_else(|| Error::Linalg("SVD did not return Vᵀ".into()))?;
    let s = Array1::from_iter(decomposition.singular_values.iter().copied());
    Ok((from_dmatrix(u), s, from_dmatrix(v_t)))
}

/// Solve `X · G = B` for `X` using the pseudo-inverse of `G`.
pub fn solve_right(b: &ArrayView2<'_, f64>, g: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    if g.iter().any(|v| !v.is_finite()) {
        return Err(Error::Linalg("least-squares solve against non-finite matrix".into()));
    }
    let pinv = to_dmatrix(g)
        .pseudo_inverse(1e-12)
        .map_err(|e| Error::Linalg(format!("pseudo-inverse failed: {e}")))?;
    Ok(b.dot(&from_dmatrix(&pinv)))
}

/// Symmetric Toeplitz matrix with the given first row (and column)
pub fn toeplitz(first_row: &[f64]) -> Array2<f64> {
    let p = first_row.len();
    Array2::from_shape_fn((p, p), |(i, j)| first_row[i.abs_diff(j)])
}

/// Block-diagonal matrix from square or rectangular blocks
pub fn block_diag(blocks: &[Array2<f64>]) -> Array2<f64> {
    let rows: usize = blocks.iter().map(|b| b.nrows()).sum();
    let cols: usize = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = Array2::zeros((rows, cols));
    let (mut r, mut c) = (0, 0);
    for block in blocks {
        let (br, bc) = block.dim();
        out.slice_mut(s![r..r + br, c..c + bc]).assign(block);
        r += br;
        c += bc;
    }
    out
}

/// Row-wise Khatri–Rao product: row `i` of the `(n, p·q)` result is the
/// Kronecker product of row `i` of `a` and row `i` of `b`
pub fn row_khatri_rao(a: &ArrayView2<'_, f64>, b: &ArrayView2<'_, f64>) -> Array2<f64> {
    let (n, p) = a.dim();
    let q = b.ncols();
    Array2::from_shape_fn((n, p * q), |(i, col)| a[[i, col / q]] * b[[i, col % q]])
}

/// Subtract the column means of `a`, returning the centred copy and the means
pub fn center_columns(a: &ArrayView2<'_, f64>) -> (Array2<f64>, Array1<f64>) {
    let means = a.mean_axis(ndarray::Axis(0)).unwrap_or_else(|| Array1::zeros(a.ncols()));
    (a - &means, means)
}

/// Regularised sample covariance `(1 - r)·XᵀX/(n - 1) + r·I` of centred data
pub fn regularized_covariance(centered: &ArrayView2<'_, f64>, r: f64) -> Array2<f64> {
    let n = centered.nrows();
    let p = centered.ncols();
    let denom = n.saturating_sub(1).max(1) as f64;
    centered.t().dot(centered) * ((1.0 - r) / denom) + Array2::<f64>::eye(p) * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_cholesky_reconstructs() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky(&a.view()).unwrap();
        let back = l.dot(&l.t());
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
        assert_eq!(l[[0, 1]], 0.0);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(cholesky(&a.view()).is_none());
        let nan = array![[f64::NAN, 0.0], [0.0, 1.0]];
        assert!(cholesky(&nan.view()).is_none());
    }

    #[test]
    fn test_symmetric_eigen_sorted() {
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let (values, vectors) = symmetric_eigen(&a.view());
        assert_abs_diff_eq!(values[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 3.0, epsilon = 1e-12);
        let av = a.dot(&vectors.column(1));
        for (x, y) in av.iter().zip(vectors.column(1).iter()) {
            assert_abs_diff_eq!(*x, 3.0 * y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_non_finite_input() {
        let a = array![[f64::NAN, 0.0], [0.0, 1.0]];
        let (values, vectors) = symmetric_eigen(&a.view());
        assert!(values.iter().all(|v| v.is_nan()));
        assert_eq!(vectors, Array2::<f64>::eye(2));
        assert!(svd(&a.view()).is_err());
        assert!(mat_pow(&a.view(), -0.5, 1e-9).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_mat_pow_inverse_sqrt() {
        let a = array![[4.0, 0.0], [0.0, 9.0]];
        let w = mat_pow(&a.view(), -0.5, 1e-9);
        assert_abs_diff_eq!(w[[0, 0]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(w[[1, 1]], 1.0 / 3.0, epsilon = 1e-12);
        // Whitening: W A W = I
        let i = w.dot(&a).dot(&w);
        assert_abs_diff_eq!(i[[0, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(i[[1, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mat_pow_floors_eigenvalues() {
        let a = Array2::<f64>::zeros((2, 2));
        let w = mat_pow(&a.view(), -0.5, 1e-4);
        assert_abs_diff_eq!(w[[0, 0]], 100.0, epsilon = 1e-9);
        assert!(w.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_svd_reconstructs() {
        let a = array![[3.0, 1.0], [1.0, 3.0], [0.0, 2.0]];
        let (u, s, vt) = svd(&a.view()).unwrap();
        let back = (&u * &s).dot(&vt);
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_toeplitz() {
        let t = toeplitz(&[1.0, 0.5, 0.25]);
        assert_eq!(t, array![[1.0, 0.5, 0.25], [0.5, 1.0, 0.5], [0.25, 0.5, 1.0]]);
    }

    #[test]
    fn test_block_diag() {
        let b = block_diag(&[array![[1.0]], array![[2.0, 3.0], [4.0, 5.0]]]);
        assert_eq!(b, array![[1.0, 0.0, 0.0], [0.0, 2.0, 3.0], [0.0, 4.0, 5.0]]);
    }

    #[test]
    fn test_solve_right() {
        let g = array![[2.0, 0.0], [0.0, 4.0]];
        let b = array![[2.0, 4.0]];
        let x = solve_right(&b.view(), &g.view()).unwrap();
        assert_abs_diff_eq!(x[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[[0, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_row_khatri_rao() {
        let a = array![[1.0, 2.0], [0.0, 1.0]];
        let b = array![[3.0], [5.0]];
        assert_eq!(row_khatri_rao(&a.view(), &b.view()), array![[3.0, 6.0], [0.0, 5.0]]);
    }

    #[test]
    fn test_regularized_covariance_identity_at_r1() {
        let x = array![[1.0, 2.0], [-1.0, -2.0]];
        let cov = regularized_covariance(&x.view(), 1.0);
        assert_eq!(cov, Array2::<f64>::eye(2));
    }
}
