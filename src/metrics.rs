//! Correlation metrics for learned representations

use ndarray::{Array1, Array2, ArrayView1};

/// Pearson correlation of two equally long vectors; 0 when either is constant
pub fn pearson(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    assert_eq!(a.len(), b.len(), "pearson: length mismatch");
    let n = a.len() as f64;
    if a.is_empty() {
        return 0.0;
    }
    let (mean_a, mean_b) = (a.sum() / n, b.sum() / n);
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 {
        cov / denom
    } else {
        0.0
    }
}

/// Per-dimension correlation between views' latent columns.
///
/// For two views this is the Pearson correlation of each column pair; for
/// more views it is averaged over all view pairs. Fewer than two views give
/// an empty result.
pub fn canonical_correlations(z: &[Array2<f64>]) -> Array1<f64> {
    if z.len() < 2 {
        return Array1::zeros(0);
    }
    let dims = z.iter().map(Array2::ncols).min().unwrap_or(0);
    let mut total = Array1::zeros(dims);
    let mut pairs = 0.0;
    for i in 0..z.len() {
        for j in i + 1..z.len() {
            for k in 0..dims {
                total[k] += pearson(&z[i].column(k), &z[j].column(k));
            }
            pairs += 1.0;
        }
    }
    total / pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_pearson_perfect_and_anti() {
        let a = array![1.0, 2.0, 3.0, 4.0];
        let b = array![2.0, 4.0, 6.0, 8.0];
        assert_abs_diff_eq!(pearson(&a.view(), &b.view()), 1.0, epsilon = 1e-12);
        let c = array![4.0, 3.0, 2.0, 1.0];
        assert_abs_diff_eq!(pearson(&a.view(), &c.view()), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_constant_is_zero() {
        let a = array![1.0, 1.0, 1.0];
        let b = array![1.0, 2.0, 3.0];
        assert_eq!(pearson(&a.view(), &b.view()), 0.0);
    }

    #[test]
    fn test_canonical_correlations_average_pairs() {
        let z1 = array![[1.0, 1.0], [2.0, -1.0], [3.0, 0.0]];
        let z2 = array![[2.0, 1.0], [4.0, -1.0], [6.0, 0.0]];
        let z3 = array![[3.0, -1.0], [2.0, 1.0], [1.0, 0.0]];
        let two = canonical_correlations(&[z1.clone(), z2.clone()]);
        assert_abs_diff_eq!(two[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(two[1], 1.0, epsilon = 1e-12);
        // pairs (1,2)=1, (1,3)=-1, (2,3)=-1
        let three = canonical_correlations(&[z1, z2, z3]);
        assert_abs_diff_eq!(three[0], -1.0 / 3.0, epsilon = 1e-12);
        assert!(canonical_correlations(&[]).is_empty());
    }
}
