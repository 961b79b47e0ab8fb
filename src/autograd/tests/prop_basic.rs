//! Property-based tests for element-wise operations

use super::test_utils::{gradient_error, seeded_matrix};
use crate::autograd::{
    add, add_bias, frobenius_norm, leaky_relu, mean, mul, scale, sigmoid, sub, sum, Tensor,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_add_sub_mul_gradient_check(
        rows in 1usize..5,
        cols in 1usize..5,
        seed in 0u64..1000,
    ) {
        let other = seeded_matrix(rows, cols, seed + 1, 3.0);
        let x = seeded_matrix(rows, cols, seed, 3.0);

        let err = gradient_error(|a| {
            let b = Tensor::constant(other.clone());
            sum(&mul(&add(a, &b), &sub(a, &b)))
        }, &x);
        prop_assert!(err < 1e-5, "add/sub/mul gradient error {}", err);
    }

    #[test]
    fn prop_scale_mean_gradient_check(
        rows in 1usize..5,
        cols in 1usize..5,
        factor in -4.0f64..4.0,
        seed in 0u64..1000,
    ) {
        let x = seeded_matrix(rows, cols, seed, 2.0);
        let err = gradient_error(|a| mean(&mul(&scale(a, factor), a)), &x);
        prop_assert!(err < 1e-5, "scale/mean gradient error {}", err);
    }

    #[test]
    fn prop_activation_gradient_check(
        rows in 1usize..4,
        cols in 1usize..4,
        seed in 0u64..1000,
    ) {
        // keep away from the kink at zero
        let x = seeded_matrix(rows, cols, seed, 2.0).mapv(|v| if v.abs() < 0.05 { v + 0.1 } else { v });
        let err = gradient_error(|a| sum(&mul(&leaky_relu(a, 0.01), &sigmoid(a))), &x);
        prop_assert!(err < 1e-5, "activation gradient error {}", err);
    }

    #[test]
    fn prop_bias_and_norm_gradient_check(
        rows in 1usize..5,
        cols in 1usize..5,
        seed in 0u64..1000,
    ) {
        let base = seeded_matrix(rows, cols, seed + 7, 1.0);
        let bias = seeded_matrix(1, cols, seed, 1.0);
        let err = gradient_error(|b| {
            frobenius_norm(&add_bias(&Tensor::constant(base.clone()), b))
        }, &bias);
        prop_assert!(err < 1e-5, "bias/norm gradient error {}", err);
    }
}
