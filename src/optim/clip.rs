//! Gradient clipping utilities

use crate::Tensor;

/// Global L2 norm over every gradient in `params`
pub fn grad_norm(params: &[Tensor]) -> f64 {
    params
        .iter()
        .filter_map(Tensor::grad)
        .map(|grad| grad.iter().map(|&g| g * g).sum::<f64>())
        .sum::<f64>()
        .sqrt()
}

/// Clip gradients by global norm
///
/// Computes the global norm of all gradients and scales them down if the norm
/// exceeds `max_norm`, preserving the relative magnitudes across parameters.
///
/// Returns the global norm before clipping.
pub fn clip_grad_norm(params: &[Tensor], max_norm: f64) -> f64 {
    let global_norm = grad_norm(params);

    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        for param in params {
            if let Some(grad) = param.grad() {
                param.set_grad(grad * clip_coef);
            }
        }
    }

    global_norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_clip_grad_norm_no_clipping() {
        let params = vec![Tensor::new(array![[1.0, 2.0]], true), Tensor::new(array![[3.0]], true)];
        params[0].set_grad(array![[0.1, 0.2]]);
        params[1].set_grad(array![[0.1]]);

        // Global norm = sqrt(0.1^2 + 0.2^2 + 0.1^2) = sqrt(0.06) ≈ 0.245
        let global_norm = clip_grad_norm(&params, 1.0);

        assert_abs_diff_eq!(global_norm, 0.06f64.sqrt(), epsilon = 1e-12);
        assert_eq!(params[0].grad().unwrap(), array![[0.1, 0.2]]);
        assert_eq!(params[1].grad().unwrap(), array![[0.1]]);
    }

    #[test]
    fn test_clip_grad_norm_with_clipping() {
        let params = vec![Tensor::new(array![[1.0, 2.0]], true), Tensor::new(array![[3.0]], true)];
        params[0].set_grad(array![[3.0, 4.0]]);
        params[1].set_grad(array![[0.0]]);

        let global_norm = clip_grad_norm(&params, 1.0);

        assert_abs_diff_eq!(global_norm, 5.0, epsilon = 1e-12);
        let g = params[0].grad().unwrap();
        assert_abs_diff_eq!(g[[0, 0]], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(g[[0, 1]], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(grad_norm(&params), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_ignores_missing_grads() {
        let params = vec![Tensor::new(array![[1.0]], true)];
        assert_eq!(clip_grad_norm(&params, 1.0), 0.0);
        assert!(params[0].grad().is_none());
    }
}
