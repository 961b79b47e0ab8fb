//! Matrix multiplication and transpose autograd operations

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array2;
use std::rc::Rc;

/// Matrix multiplication
///
/// Computes C = A @ B where A is m×k and B is k×n.
pub fn matmul(a: &Tensor, b: &Tensor) -> Tensor {
    let (m, k) = a.shape();
    let (k2, n) = b.shape();
    assert_eq!(k, k2, "Matrix inner dimension mismatch: {m}x{k} @ {k2}x{n}");

    let data = a.data().dot(&*b.data());
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(MatmulBackward { a: a.clone(), b: b.clone() }));
    }
    result
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MatmulBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad_output: &Array2<f64>) {
        // ∂L/∂A = ∂L/∂C @ B^T  (m×n) @ (n×k) = (m×k)
        // ∂L/∂B = A^T @ ∂L/∂C  (k×m) @ (m×n) = (k×n)
        if self.a.requires_grad() {
            let grad_a = grad_output.dot(&self.b.data().t());
            self.a.accumulate_grad(grad_a);
        }
        if self.b.requires_grad() {
            let grad_b = self.a.data().t().dot(grad_output);
            self.b.accumulate_grad(grad_b);
        }
    }
}

/// Transpose a matrix
pub fn transpose(a: &Tensor) -> Tensor {
    let data = a.data().t().to_owned();
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(TransposeBackward { a: a.clone() }));
    }
    result
}

struct TransposeBackward {
    a: Tensor,
}

impl BackwardOp for TransposeBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad_output: &Array2<f64>) {
        self.a.accumulate_grad(grad_output.t().to_owned());
    }
}
