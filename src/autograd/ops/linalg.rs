//! Spectral autograd operations: symmetric matrix power, top eigenvalue sum, trace
//!
//! Gradients of spectral functions follow the Daleckii–Krein formula: for a
//! symmetric `A = V Λ Vᵀ` and `F(A) = V f(Λ) Vᵀ`,
//! `∂L/∂A = V (K ∘ (Vᵀ Ḡ V)) Vᵀ` where `Ḡ` is the symmetrized output gradient
//! and `K` holds the divided differences of `f` over the eigenvalues.

use crate::autograd::{BackwardOp, Tensor};
use crate::linalg::{floored_pow, symmetric_eigen};
use ndarray::{Array1, Array2};
use std::rc::Rc;

/// Relative gap below which two eigenvalues are treated as equal
const DEGENERATE_GAP: f64 = 1e-10;

/// Symmetric matrix power `A^p` with eigenvalues floored at `eps`.
///
/// The input is symmetrized before decomposition, so only `(A + Aᵀ)/2`
/// affects the result.
pub fn sym_pow(a: &Tensor, p: f64, eps: f64) -> Tensor {
    assert_eq!(a.rows(), a.cols(), "sym_pow: matrix must be square");
    let (values, vectors) = symmetric_eigen(&a.data().view());
    let powered = values.mapv(|l| floored_pow(l, p, eps));
    let data = (&vectors * &powered).dot(&vectors.t());
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(SymPowBackward { a: a.clone(), values, vectors, p, eps }));
    }
    result
}

struct SymPowBackward {
    a: Tensor,
    values: Array1<f64>,
    vectors: Array2<f64>,
    p: f64,
    eps: f64,
}

impl SymPowBackward {
    fn f(&self, l: f64) -> f64 {
        floored_pow(l, self.p, self.eps)
    }

    fn df(&self, l: f64) -> f64 {
        if l > self.eps {
            self.p * l.powf(self.p - 1.0)
        } else {
            0.0
        }
    }
}

impl BackwardOp for SymPowBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad_output: &Array2<f64>) {
        let n = self.values.len();
        let k = Array2::from_shape_fn((n, n), |(i, j)| {
            let (li, lj) = (self.values[i], self.values[j]);
            let scale = li.abs().max(lj.abs()).max(1.0);
            if (li - lj).abs() > DEGENERATE_GAP * scale {
                (self.f(li) - self.f(lj)) / (li - lj)
            } else {
                self.df(0.5 * (li + lj))
            }
        });

        let g_sym = (grad_output + &grad_output.t()) * 0.5;
        let inner = self.vectors.t().dot(&g_sym).dot(&self.vectors);
        let grad_a = self.vectors.dot(&(&k * &inner)).dot(&self.vectors.t());
        self.a.accumulate_grad(grad_a);
    }
}

/// Sum of the `k` largest eigenvalues of the symmetric part of `A` (1x1).
///
/// `k` larger than the matrix order sums every eigenvalue.
pub fn top_eigvals_sum(a: &Tensor, k: usize) -> Tensor {
    assert_eq!(a.rows(), a.cols(), "top_eigvals_sum: matrix must be square");
    let (values, vectors) = symmetric_eigen(&a.data().view());
    let n = values.len();
    let k = k.min(n);
    // ascending order: the top k are the last k
    let top: Vec<usize> = (n - k..n).collect();
    let value = top.iter().map(|&i| values[i]).sum::<f64>();
    let requires_grad = a.requires_grad();

    let mut result = Tensor::scalar(value, requires_grad);
    if requires_grad {
        let selected = Array2::from_shape_fn((n, k), |(row, col)| vectors[[row, top[col]]]);
        result.set_backward_op(Rc::new(TopEigBackward { a: a.clone(), selected }));
    }
    result
}

struct TopEigBackward {
    a: Tensor,
    selected: Array2<f64>,
}

impl BackwardOp for TopEigBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad_output: &Array2<f64>) {
        // ∂λᵢ/∂A = vᵢ vᵢᵀ
        let projector = self.selected.dot(&self.selected.t());
        self.a.accumulate_grad(projector * grad_output[[0, 0]]);
    }
}

/// Trace of a square matrix (1x1)
pub fn trace(a: &Tensor) -> Tensor {
    assert_eq!(a.rows(), a.cols(), "trace: matrix must be square");
    let value = a.data().diag().sum();
    let requires_grad = a.requires_grad();

    let mut result = Tensor::scalar(value, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(TraceBackward { a: a.clone() }));
    }
    result
}

struct TraceBackward {
    a: Tensor,
}

impl BackwardOp for TraceBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad_output: &Array2<f64>) {
        let n = self.a.rows();
        self.a.accumulate_grad(Array2::<f64>::eye(n) * grad_output[[0, 0]]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_sym_pow_diagonal() {
        let a = Tensor::constant(array![[4.0, 0.0], [0.0, 16.0]]);
        let r = sym_pow(&a, 0.5, 1e-12).to_array();
        assert_abs_diff_eq!(r[[0, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[[1, 1]], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r[[0, 1]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sym_pow_gradient_of_trace_sqrt_diagonal() {
        // d tr(A^{1/2}) / dA = 0.5 A^{-1/2} for diagonal A
        let a = Tensor::new(array![[4.0, 0.0], [0.0, 9.0]], true);
        let out = trace(&sym_pow(&a, 0.5, 1e-12));
        backward(&out, None);
        let g = a.grad().unwrap();
        assert_abs_diff_eq!(g[[0, 0]], 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(g[[1, 1]], 1.0 / 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g[[0, 1]], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_top_eigvals_sum() {
        let a = Tensor::new(array![[3.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 2.0]], true);
        let top = top_eigvals_sum(&a, 2);
        assert_abs_diff_eq!(top.item(), 5.0, epsilon = 1e-12);
        backward(&top, None);
        let g = a.grad().unwrap();
        assert_abs_diff_eq!(g[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[[1, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[[2, 2]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_top_eigvals_sum_clamps_k() {
        let a = Tensor::constant(array![[1.0, 0.0], [0.0, 2.0]]);
        assert_abs_diff_eq!(top_eigvals_sum(&a, 10).item(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trace() {
        let a = Tensor::new(array![[1.0, 5.0], [7.0, 2.0]], true);
        let t = trace(&a);
        assert_eq!(t.item(), 3.0);
        backward(&t, None);
        assert_eq!(a.grad().unwrap(), array![[1.0, 0.0], [0.0, 1.0]]);
    }
}
