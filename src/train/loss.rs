//! Loss functions for training

use crate::autograd::{mean, mul, sub, sum};
use crate::Tensor;

/// Trait for loss functions
pub trait LossFn {
    /// Compute loss given predictions and targets
    ///
    /// Returns a scalar tensor wired into the autograd graph of `predictions`
    /// (and of `targets`, when it requires gradients).
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function
    fn name(&self) -> &str;
}

/// How element-wise losses are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

/// Mean Squared Error Loss
///
/// L = mean((predictions - targets)²), or the plain sum of squares with
/// [`Reduction::Sum`].
///
/// # Example
///
/// ```
/// use cca_zoo::train::{LossFn, MSELoss};
/// use cca_zoo::Tensor;
/// use ndarray::array;
///
/// let loss_fn = MSELoss::default();
/// let pred = Tensor::new(array![[1.0, 2.0, 3.0]], true);
/// let target = Tensor::constant(array![[1.5, 2.5, 3.5]]);
///
/// let loss = loss_fn.forward(&pred, &target);
/// assert!((loss.item() - 0.25).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MSELoss {
    pub reduction: Reduction,
}

impl MSELoss {
    pub fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }

    /// Sum of squared errors
    pub fn sum() -> Self {
        Self::new(Reduction::Sum)
    }
}

impl LossFn for MSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.shape(),
            targets.shape(),
            "Predictions and targets must have same shape"
        );

        let diff = sub(predictions, targets);
        let squared = mul(&diff, &diff);
        match self.reduction {
            Reduction::Mean => mean(&squared),
            Reduction::Sum => sum(&squared),
        }
    }

    fn name(&self) -> &'static str {
        "MSE"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_mse_mean() {
        let pred = Tensor::new(array![[1.0, 2.0], [3.0, 4.0]], true);
        let target = Tensor::constant(array![[1.0, 1.0], [1.0, 1.0]]);
        let loss = MSELoss::default().forward(&pred, &target);
        assert_abs_diff_eq!(loss.item(), (0.0 + 1.0 + 4.0 + 9.0) / 4.0, epsilon = 1e-12);

        backward(&loss, None);
        // d/dpred = 2 (pred - target) / n
        assert_eq!(pred.grad().unwrap(), array![[0.0, 0.5], [1.0, 1.5]]);
    }

    #[test]
    fn test_mse_sum() {
        let pred = Tensor::new(array![[1.0, 2.0], [3.0, 4.0]], true);
        let target = Tensor::constant(array![[1.0, 1.0], [1.0, 1.0]]);
        let loss = MSELoss::sum().forward(&pred, &target);
        assert_abs_diff_eq!(loss.item(), 14.0, epsilon = 1e-12);

        backward(&loss, None);
        assert_eq!(pred.grad().unwrap(), array![[0.0, 2.0], [4.0, 6.0]]);
    }

    #[test]
    fn test_mse_gradient_reaches_targets() {
        let pred = Tensor::constant(array![[2.0]]);
        let target = Tensor::new(array![[0.0]], true);
        let loss = MSELoss::default().forward(&pred, &target);
        backward(&loss, None);
        assert_eq!(target.grad().unwrap(), array![[-4.0]]);
    }

    #[test]
    fn test_mse_name() {
        assert_eq!(MSELoss::default().name(), "MSE");
    }

    #[test]
    #[should_panic(expected = "same shape")]
    fn test_mse_shape_mismatch() {
        let pred = Tensor::constant(array![[1.0, 2.0]]);
        let target = Tensor::constant(array![[1.0], [2.0]]);
        MSELoss::default().forward(&pred, &target);
    }
}
