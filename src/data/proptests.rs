//! Property tests for the covariance-structured generator

use super::*;
use crate::linalg::cholesky;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn structure_strategy() -> impl Strategy<Value = CovarianceStructure> {
    prop_oneof![
        Just(CovarianceStructure::Identity),
        Just(CovarianceStructure::Gaussian),
        Just(CovarianceStructure::Toeplitz),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_generated_shapes(
        n in 1usize..40,
        features in prop::collection::vec(2usize..8, 1..4),
        latent_dims in 1usize..3,
        seed in 0u64..1000,
    ) {
        let views_count = features.len();
        let config = GeneratorConfig::new(features.clone())
            .with_latent_dims(latent_dims)
            .with_correlation(Correlation::Scalar(0.7))
            .with_max_attempts(500);
        let mut rng = StdRng::seed_from_u64(seed);
        let (views, weights) = CovarianceDataGenerator::new(config).unwrap().generate(n, &mut rng).unwrap();

        prop_assert_eq!(views.len(), views_count);
        prop_assert!(views.iter().all(|v| v.nrows() == n));
        prop_assert_eq!(views.iter().map(|v| v.ncols()).sum::<usize>(), features.iter().sum::<usize>());
        for (w, p) in weights.iter().zip(&features) {
            prop_assert_eq!(w.dim(), (*p, latent_dims));
        }
    }

    #[test]
    fn prop_joint_covariance_positive_definite(
        structures in prop::collection::vec(structure_strategy(), 2),
        p in 3usize..7,
        seed in 0u64..1000,
    ) {
        let config = GeneratorConfig::new(vec![p, p])
            .with_latent_dims(2)
            .with_structure(structures.clone())
            .with_correlation(Correlation::PerDimension(vec![0.8, 0.4]));
        let generator = CovarianceDataGenerator::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let (_, weights) = generator.generate(5, &mut rng).unwrap();

        let covs: Vec<_> = structures
            .iter()
            .map(|s| view_covariance(*s, p, 0.5, &mut rng).unwrap())
            .collect();
        let joint = joint_covariance(&covs, &weights, generator.correlation());
        for ((i, j), v) in joint.indexed_iter() {
            prop_assert!((v - joint[[j, i]]).abs() < 1e-12);
        }
        prop_assert!(cholesky(&joint.view()).is_some());
    }
}
