//! Test utilities for gradient checking

use crate::autograd::{backward, Tensor};
use ndarray::Array2;

/// Finite difference gradient checker
///
/// Computes numerical gradient using central difference:
/// f'(x) ≈ (f(x + h) - f(x - h)) / (2h)
pub fn finite_difference<F>(f: F, x: &Array2<f64>, epsilon: f64) -> Array2<f64>
where
    F: Fn(&Array2<f64>) -> f64,
{
    let mut grad = Array2::zeros(x.dim());
    let mut probe = x.clone();

    for idx in 0..x.len() {
        let (i, j) = (idx / x.ncols(), idx % x.ncols());
        probe[[i, j]] = x[[i, j]] + epsilon;
        let f_plus = f(&probe);
        probe[[i, j]] = x[[i, j]] - epsilon;
        let f_minus = f(&probe);
        probe[[i, j]] = x[[i, j]];

        grad[[i, j]] = (f_plus - f_minus) / (2.0 * epsilon);
    }

    grad
}

/// Largest absolute difference between the autograd gradient of a scalar
/// function and its central finite difference at `x`.
pub fn gradient_error<F>(f: F, x: &Array2<f64>) -> f64
where
    F: Fn(&Tensor) -> Tensor,
{
    let input = Tensor::new(x.clone(), true);
    let out = f(&input);
    backward(&out, None);
    let analytical = input.grad().expect("gradient should be available");

    let numerical = finite_difference(|values| f(&Tensor::constant(values.clone())).item(), x, 1e-5);

    analytical
        .iter()
        .zip(numerical.iter())
        .map(|(a, n)| (a - n).abs())
        .fold(0.0, f64::max)
}

/// Deterministic matrix with entries in [-scale, scale)
pub fn seeded_matrix(rows: usize, cols: usize, seed: u64, scale: f64) -> Array2<f64> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-scale..scale))
}
