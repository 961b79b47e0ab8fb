//! Property-based tests for matmul operations

use super::test_utils::{gradient_error, seeded_matrix};
use crate::autograd::{matmul, mul, sum, transpose, Tensor};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_matmul_backward_gradient_check(
        m in 1usize..5,
        k in 1usize..5,
        n in 1usize..5,
        seed in 0u64..1000,
    ) {
        let b_data = seeded_matrix(k, n, seed + 1, 5.0);
        let weights = seeded_matrix(m, n, seed + 2, 1.0);
        let a_data = seeded_matrix(m, k, seed, 5.0);

        // weighted sum so that every output entry carries a distinct gradient
        let err = gradient_error(|a| {
            let c = matmul(a, &Tensor::constant(b_data.clone()));
            sum(&mul(&c, &Tensor::constant(weights.clone())))
        }, &a_data);
        prop_assert!(err < 1e-6, "matmul gradient error {}", err);
    }

    #[test]
    fn prop_gram_matrix_gradient_check(
        n in 2usize..6,
        p in 1usize..4,
        seed in 0u64..1000,
    ) {
        let x = seeded_matrix(n, p, seed, 2.0);
        let weights = seeded_matrix(p, p, seed + 3, 1.0);
        let err = gradient_error(|a| {
            let gram = matmul(&transpose(a), a);
            sum(&mul(&gram, &Tensor::constant(weights.clone())))
        }, &x);
        prop_assert!(err < 1e-6, "gram gradient error {}", err);
    }
}
