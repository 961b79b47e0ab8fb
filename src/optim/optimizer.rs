//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms over an owned parameter group
pub trait Optimizer {
    /// Apply one update to every parameter in the group that has a gradient
    fn step(&mut self);

    /// Parameters this optimizer updates
    fn params(&self) -> &[Tensor];

    /// Clear the gradients of this optimizer's parameters only
    fn zero_grad(&mut self) {
        for param in self.params() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f64;

    /// Set learning rate
    fn set_lr(&mut self, lr: f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Minimal optimizer implementation for testing default trait methods
    struct TestOptimizer {
        params: Vec<Tensor>,
        learning_rate: f64,
    }

    impl Optimizer for TestOptimizer {
        fn step(&mut self) {
            for param in &self.params {
                if let Some(grad) = param.grad() {
                    let mut data = param.data_mut();
                    data.scaled_add(-self.learning_rate, &grad);
                }
            }
        }

        fn params(&self) -> &[Tensor] {
            &self.params
        }

        fn lr(&self) -> f64 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f64) {
            self.learning_rate = lr;
        }
    }

    #[test]
    fn test_zero_grad_only_touches_own_group() {
        let mine = Tensor::new(array![[1.0, 2.0]], true);
        let other = Tensor::new(array![[3.0]], true);
        mine.set_grad(array![[0.5, 0.5]]);
        other.set_grad(array![[1.0]]);

        let mut opt = TestOptimizer { params: vec![mine.clone()], learning_rate: 0.1 };
        opt.zero_grad();

        assert!(mine.grad().is_none());
        assert_eq!(other.grad().unwrap(), array![[1.0]]);
    }

    #[test]
    fn test_optimizer_set_lr() {
        let mut opt = TestOptimizer { params: Vec::new(), learning_rate: 0.1 };
        assert_eq!(opt.lr(), 0.1);

        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }

    #[test]
    fn test_step_updates_shared_storage() {
        let param = Tensor::new(array![[1.0, 2.0]], true);
        param.set_grad(array![[1.0, -1.0]]);
        let mut opt = TestOptimizer { params: vec![param.clone()], learning_rate: 0.5 };
        opt.step();
        assert_eq!(param.to_array(), array![[0.5, 2.5]]);
    }
}
