//! Structural autograd operations: column centring, column concatenation,
//! row-wise Khatri–Rao product

use crate::autograd::{BackwardOp, Tensor};
use crate::linalg;
use ndarray::{concatenate, s, Array2, Axis};
use std::rc::Rc;

/// Subtract the column means (centre each feature over the batch)
pub fn center(a: &Tensor) -> Tensor {
    let data = {
        let values = a.data();
        let means = values.mean_axis(Axis(0)).unwrap_or_else(|| ndarray::Array1::zeros(a.cols()));
        &*values - &means
    };
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(CenterBackward { a: a.clone() }));
    }
    result
}

struct CenterBackward {
    a: Tensor,
}

impl BackwardOp for CenterBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        // The centring operator is a symmetric projection
        match grad.mean_axis(Axis(0)) {
            Some(means) => self.a.accumulate_grad(grad - &means),
            None => self.a.accumulate_grad(grad.clone()),
        }
    }
}

/// Concatenate tensors with equal row counts along columns
pub fn concat_cols(parts: &[Tensor]) -> Tensor {
    assert!(!parts.is_empty(), "concat_cols: no tensors given");
    let rows = parts[0].rows();
    assert!(parts.iter().all(|p| p.rows() == rows), "concat_cols: row count mismatch");

    let arrays: Vec<Array2<f64>> = parts.iter().map(Tensor::to_array).collect();
    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    let data = concatenate(Axis(1), &views).unwrap_or_else(|_| Array2::zeros((rows, 0)));
    let requires_grad = parts.iter().any(Tensor::requires_grad);

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(ConcatBackward { parts: parts.to_vec() }));
    }
    result
}

struct ConcatBackward {
    parts: Vec<Tensor>,
}

impl BackwardOp for ConcatBackward {
    fn inputs(&self) -> Vec<Tensor> {
        self.parts.clone()
    }

    fn backward(&self, grad: &Array2<f64>) {
        let mut offset = 0;
        for part in &self.parts {
            let width = part.cols();
            if part.requires_grad() {
                part.accumulate_grad(grad.slice(s![.., offset..offset + width]).to_owned());
            }
            offset += width;
        }
    }
}

/// Row-wise Khatri–Rao (face-splitting) product.
///
/// For `a` (n×p) and `b` (n×q) the output is n×(p·q) with
/// `out[i, j·q + k] = a[i, j] · b[i, k]`: each row is the Kronecker product of
/// the corresponding rows.
pub fn row_khatri_rao(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.rows(), b.rows(), "row_khatri_rao: row count mismatch");
    let data = linalg::row_khatri_rao(&a.data().view(), &b.data().view());
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(KhatriRaoBackward { a: a.clone(), b: b.clone() }));
    }
    result
}

struct KhatriRaoBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for KhatriRaoBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        let (n, p) = self.a.shape();
        let q = self.b.cols();
        if self.a.requires_grad() {
            let bv = self.b.data();
            let grad_a = Array2::from_shape_fn((n, p), |(i, j)| {
                (0..q).map(|k| grad[[i, j * q + k]] * bv[[i, k]]).sum()
            });
            drop(bv);
            self.a.accumulate_grad(grad_a);
        }
        if self.b.requires_grad() {
            let av = self.a.data();
            let grad_b = Array2::from_shape_fn((n, q), |(i, k)| {
                (0..p).map(|j| grad[[i, j * q + k]] * av[[i, j]]).sum()
            });
            drop(av);
            self.b.accumulate_grad(grad_b);
        }
    }
}
