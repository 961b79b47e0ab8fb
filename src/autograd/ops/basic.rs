//! Basic autograd operations: add, sub, mul, scale, shift, sum, mean, bias, norm

use crate::autograd::{BackwardOp, Tensor};
use ndarray::{Array2, Axis};
use std::rc::Rc;

/// Add two tensors of the same shape
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.shape(), b.shape(), "add: shape mismatch");
    let data = &*a.data() + &*b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(AddBackward { a: a.clone(), b: b.clone() }));
    }
    result
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for AddBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        if self.a.requires_grad() {
            self.a.accumulate_grad(grad.clone());
        }
        if self.b.requires_grad() {
            self.b.accumulate_grad(grad.clone());
        }
    }
}

/// Subtract `b` from `a`
pub fn sub(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.shape(), b.shape(), "sub: shape mismatch");
    let data = &*a.data() - &*b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(SubBackward { a: a.clone(), b: b.clone() }));
    }
    result
}

struct SubBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for SubBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        if self.a.requires_grad() {
            self.a.accumulate_grad(grad.clone());
        }
        if self.b.requires_grad() {
            self.b.accumulate_grad(-grad);
        }
    }
}

/// Multiply two tensors element-wise
pub fn mul(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.shape(), b.shape(), "mul: shape mismatch");
    let data = &*a.data() * &*b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(MulBackward { a: a.clone(), b: b.clone() }));
    }
    result
}

struct MulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MulBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        if self.a.requires_grad() {
            // ∂L/∂a = ∂L/∂out * b
            self.a.accumulate_grad(grad * &*self.b.data());
        }
        if self.b.requires_grad() {
            // ∂L/∂b = ∂L/∂out * a
            self.b.accumulate_grad(grad * &*self.a.data());
        }
    }
}

/// Scale tensor by a scalar
pub fn scale(a: &Tensor, factor: f64) -> Tensor {
    let data = &*a.data() * factor;
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(ScaleBackward { a: a.clone(), factor }));
    }
    result
}

struct ScaleBackward {
    a: Tensor,
    factor: f64,
}

impl BackwardOp for ScaleBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        self.a.accumulate_grad(grad * self.factor);
    }
}

/// Add a constant to every element
pub fn add_scalar(a: &Tensor, value: f64) -> Tensor {
    let data = &*a.data() + value;
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(ScaleBackward { a: a.clone(), factor: 1.0 }));
    }
    result
}

/// Sum all elements into a 1x1 tensor
pub fn sum(a: &Tensor) -> Tensor {
    reduce(a, 1.0)
}

/// Mean of all elements as a 1x1 tensor
pub fn mean(a: &Tensor) -> Tensor {
    let n = a.len().max(1) as f64;
    reduce(a, 1.0 / n)
}

fn reduce(a: &Tensor, weight: f64) -> Tensor {
    let value = a.data().sum() * weight;
    let requires_grad = a.requires_grad();

    let mut result = Tensor::scalar(value, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(ReduceBackward { a: a.clone(), weight }));
    }
    result
}

struct ReduceBackward {
    a: Tensor,
    weight: f64,
}

impl BackwardOp for ReduceBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        // ∂L/∂a = ∂L/∂sum * weight (broadcast)
        let g = grad[[0, 0]] * self.weight;
        self.a.accumulate_grad(Array2::from_elem(self.a.shape(), g));
    }
}

/// Add a `1 x cols` bias row to every row of `a`
pub fn add_bias(a: &Tensor, bias: &Tensor) -> Tensor {
    assert_eq!(bias.rows(), 1, "add_bias: bias must be a single row");
    assert_eq!(a.cols(), bias.cols(), "add_bias: column mismatch");
    let data = &*a.data() + &*bias.data();
    let requires_grad = a.requires_grad() || bias.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(AddBiasBackward { a: a.clone(), bias: bias.clone() }));
    }
    result
}

struct AddBiasBackward {
    a: Tensor,
    bias: Tensor,
}

impl BackwardOp for AddBiasBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.bias.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        if self.a.requires_grad() {
            self.a.accumulate_grad(grad.clone());
        }
        if self.bias.requires_grad() {
            self.bias.accumulate_grad(grad.sum_axis(Axis(0)).insert_axis(Axis(0)));
        }
    }
}

/// Frobenius norm as a 1x1 tensor
pub fn frobenius_norm(a: &Tensor) -> Tensor {
    let norm = a.data().iter().map(|v| v * v).sum::<f64>().sqrt();
    let requires_grad = a.requires_grad();

    let mut result = Tensor::scalar(norm, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(NormBackward { a: a.clone(), norm }));
    }
    result
}

struct NormBackward {
    a: Tensor,
    norm: f64,
}

impl BackwardOp for NormBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        // ∂‖a‖/∂a = a / ‖a‖, taken as zero at the origin
        if self.norm > 0.0 {
            let g = grad[[0, 0]] / self.norm;
            self.a.accumulate_grad(&*self.a.data() * g);
        } else {
            self.a.accumulate_grad(Array2::zeros(self.a.shape()));
        }
    }
}
