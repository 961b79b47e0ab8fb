//! Tests for experiment validation

use super::validate_spec;
use crate::config::{ExperimentSpec, ModelSpec};
use crate::error::Error;
use crate::models::{DccaConfig, DeconfoundingConfig, NoiConfig};

fn spec(views: &[usize], model: ModelSpec) -> ExperimentSpec {
    let yaml = format!("data:\n  view_features: {views:?}\nmodel:\n  type: dcca\n");
    let mut spec = ExperimentSpec::from_yaml_str(&yaml).unwrap();
    spec.model = model;
    spec
}

#[test]
fn test_valid_specs() {
    assert!(validate_spec(&spec(&[4, 4], ModelSpec::Dcca(DccaConfig::default()))).is_ok());
    assert!(validate_spec(&spec(&[4, 4, 4], ModelSpec::Dtcca(DccaConfig::default()))).is_ok());
    assert!(validate_spec(&spec(&[4, 4], ModelSpec::DccaNoi(NoiConfig::default()))).is_ok());
    assert!(validate_spec(&spec(
        &[4, 4, 1],
        ModelSpec::Deconfounding(DeconfoundingConfig::default())
    ))
    .is_ok());
}

#[test]
fn test_cca_objective_needs_two_views() {
    let err = validate_spec(&spec(&[4, 4, 4], ModelSpec::Dcca(DccaConfig::default()))).unwrap_err();
    assert!(err.to_string().contains("exactly 2"));
}

#[test]
fn test_noi_rho_propagates() {
    let model = ModelSpec::DccaNoi(NoiConfig { rho: 1.5, ..NoiConfig::default() });
    assert!(matches!(validate_spec(&spec(&[4, 4], model)), Err(Error::InvalidConfiguration(_))));
}

#[test]
fn test_deconfounding_needs_confound_view() {
    let model = ModelSpec::Deconfounding(DeconfoundingConfig::default());
    assert!(validate_spec(&spec(&[4, 4], model)).is_err());
}

#[test]
fn test_dtcca_latent_width() {
    let model = ModelSpec::Dtcca(DccaConfig { latent_dims: 5, ..DccaConfig::default() });
    assert!(validate_spec(&spec(&[6, 3], model)).is_err());
}

#[test]
fn test_sample_count_and_sections() {
    let mut s = spec(&[4, 4], ModelSpec::Dcca(DccaConfig::default()));
    s.samples = 1;
    assert!(validate_spec(&s).is_err());

    let mut s = spec(&[4, 4], ModelSpec::Dcca(DccaConfig::default()));
    s.training.epochs = 0;
    assert!(validate_spec(&s).is_err());

    let mut s = spec(&[4, 4], ModelSpec::Dcca(DccaConfig::default()));
    s.data.latent_dims = 0;
    assert!(validate_spec(&s).is_err());
}
