//! YAML schema for experiments

use crate::data::GeneratorConfig;
use crate::error::{Error, Result};
use crate::models::{DccaConfig, DeconfoundingConfig, NoiConfig};
use crate::train::TrainConfig;
use serde::{Deserialize, Serialize};

fn default_samples() -> usize {
    500
}

/// Complete experiment specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    /// Generator settings
    pub data: GeneratorConfig,

    /// Rows drawn from the generator
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Seed for data generation and parameter initialisation
    #[serde(default)]
    pub seed: u64,

    /// Model to train
    pub model: ModelSpec,

    /// Training loop settings
    #[serde(default)]
    pub training: TrainConfig,
}

impl ExperimentSpec {
    /// Parse from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse experiment spec: {e}")))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize experiment spec: {e}")))
    }
}

/// Model selector
///
/// `deconfounding` treats the last generated view as the confound, so its
/// data section must describe three views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Dcca(DccaConfig),
    Dtcca(DccaConfig),
    DccaNoi(NoiConfig),
    Deconfounding(DeconfoundingConfig),
}

impl ModelSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ModelSpec::Dcca(_) => "Dcca",
            ModelSpec::Dtcca(_) => "Dtcca",
            ModelSpec::DccaNoi(_) => "DccaNoi",
            ModelSpec::Deconfounding(_) => "DeconfoundingDcca",
        }
    }

    pub fn latent_dims(&self) -> usize {
        match self {
            ModelSpec::Dcca(c) | ModelSpec::Dtcca(c) => c.latent_dims,
            ModelSpec::DccaNoi(c) => c.latent_dims,
            ModelSpec::Deconfounding(c) => c.latent_dims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::NetworkKind;
    use crate::objectives::ObjectiveKind;

    const MINIMAL: &str = "
data:
  view_features: [6, 5]
model:
  type: dcca
";

    #[test]
    fn test_minimal_spec_defaults() {
        let spec = ExperimentSpec::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(spec.samples, 500);
        assert_eq!(spec.seed, 0);
        assert_eq!(spec.model, ModelSpec::Dcca(DccaConfig::default()));
        assert_eq!(spec.training, TrainConfig::default());
        assert_eq!(spec.data.view_features, vec![6, 5]);
    }

    #[test]
    fn test_model_variants() {
        let yaml = "
data:
  view_features: [4, 4]
model:
  type: dcca_noi
  latent_dims: 2
  n: 100
  rho: 0.5
  encoder:
    kind: linear
";
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        let ModelSpec::DccaNoi(noi) = &spec.model else {
            panic!("expected dcca_noi, got {:?}", spec.model);
        };
        assert_eq!(noi.n, Some(100));
        assert_eq!(noi.rho, 0.5);
        assert_eq!(noi.encoder, NetworkKind::Linear);
        assert_eq!(spec.model.name(), "DccaNoi");

        let yaml = "data:\n  view_features: [3, 3, 3]\nmodel:\n  type: dtcca\n  objective: cca\n";
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        assert!(matches!(&spec.model, ModelSpec::Dtcca(c) if c.objective == ObjectiveKind::Cca));

        let yaml = "data:\n  view_features: [3, 3, 1]\nmodel:\n  type: deconfounding\n  lambda_1: 10.0\n";
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        assert!(matches!(&spec.model, ModelSpec::Deconfounding(c) if c.lambda_1 == 10.0 && c.lambda_2 == 1e6));
    }

    #[test]
    fn test_unknown_model_rejected() {
        let yaml = "data:\n  view_features: [3, 3]\nmodel:\n  type: kcca\n";
        assert!(matches!(ExperimentSpec::from_yaml_str(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let spec = ExperimentSpec::from_yaml_str(MINIMAL).unwrap();
        let yaml = spec.to_yaml_string().unwrap();
        assert_eq!(ExperimentSpec::from_yaml_str(&yaml).unwrap(), spec);
    }
}
