//! Activation function autograd operations: relu, leaky relu, sigmoid

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array2;
use std::rc::Rc;

/// ReLU activation
pub fn relu(a: &Tensor) -> Tensor {
    leaky_relu(a, 0.0)
}

/// Leaky ReLU activation: `x` for `x > 0`, `slope · x` otherwise
pub fn leaky_relu(a: &Tensor, slope: f64) -> Tensor {
    let data = a.data().mapv(|x| if x > 0.0 { x } else { slope * x });
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(LeakyReluBackward { a: a.clone(), slope }));
    }
    result
}

struct LeakyReluBackward {
    a: Tensor,
    slope: f64,
}

impl BackwardOp for LeakyReluBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        // ∂L/∂a = ∂L/∂out * (a > 0 ? 1 : slope)
        let slope = self.slope;
        let mask = self.a.data().mapv(|x| if x > 0.0 { 1.0 } else { slope });
        self.a.accumulate_grad(grad * &mask);
    }
}

/// Logistic sigmoid
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| 1.0 / (1.0 + (-x).exp()));
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data.clone(), requires_grad);
    if requires_grad {
        result.set_backward_op(Rc::new(SigmoidBackward { a: a.clone(), output: data }));
    }
    result
}

struct SigmoidBackward {
    a: Tensor,
    output: Array2<f64>,
}

impl BackwardOp for SigmoidBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }

    fn backward(&self, grad: &Array2<f64>) {
        // σ'(x) = σ(x)(1 - σ(x))
        let local = self.output.mapv(|s| s * (1.0 - s));
        self.a.accumulate_grad(grad * &local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use ndarray::array;

    #[test]
    fn test_relu_forward_backward() {
        let a = Tensor::new(array![[-1.0, 0.0, 2.0]], true);
        let out = relu(&a);
        assert_eq!(out.to_array(), array![[0.0, 0.0, 2.0]]);
        backward(&out, None);
        assert_eq!(a.grad().unwrap(), array![[0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_leaky_relu_slope() {
        let a = Tensor::new(array![[-2.0, 3.0]], true);
        let out = leaky_relu(&a, 0.01);
        assert_eq!(out.to_array(), array![[-0.02, 3.0]]);
        backward(&out, None);
        assert_eq!(a.grad().unwrap(), array![[0.01, 1.0]]);
    }

    #[test]
    fn test_sigmoid_at_zero() {
        let a = Tensor::new(array![[0.0]], true);
        let out = sigmoid(&a);
        assert_eq!(out.item(), 0.5);
        backward(&out, None);
        assert_eq!(a.grad().unwrap()[[0, 0]], 0.25);
    }
}
