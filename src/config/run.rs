//! Run an experiment end to end from its specification

use super::schema::{ExperimentSpec, ModelSpec};
use super::validate::validate_spec;
use crate::data::CovarianceDataGenerator;
use crate::error::{Error, Result};
use crate::metrics::canonical_correlations;
use crate::models::{Dcca, DccaNoi, DeconfoundingDcca, Dtcca, NoiConfig};
use crate::train::{fit, fit_deconfounding, TrainResult};
use crate::Tensor;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::Path;

/// Outcome of an experiment
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub model: &'static str,
    pub training: TrainResult,
    /// Per-dimension correlation of the post-processed training latents
    pub correlations: Array1<f64>,
    /// Correlation spectrum the generator targeted
    pub target_correlations: Vec<f64>,
}

/// Load and parse an experiment file
pub fn load_spec<P: AsRef<Path>>(path: P) -> Result<ExperimentSpec> {
    let yaml = fs::read_to_string(path.as_ref()).map_err(|e| {
        Error::Config(format!("Failed to read experiment file {}: {e}", path.as_ref().display()))
    })?;
    ExperimentSpec::from_yaml_str(&yaml)
}

/// Load, validate and run an experiment file
///
/// # Example
///
/// ```no_run
/// use cca_zoo::config::run_from_yaml;
///
/// let report = run_from_yaml("experiment.yaml")?;
/// println!("{}: {:?}", report.model, report.correlations);
/// # Ok::<(), cca_zoo::Error>(())
/// ```
pub fn run_from_yaml<P: AsRef<Path>>(path: P) -> Result<ExperimentReport> {
    run_experiment(&load_spec(path)?)
}

/// Generate the data, train the model and measure the learned correlations
pub fn run_experiment(spec: &ExperimentSpec) -> Result<ExperimentReport> {
    validate_spec(spec)?;
    let mut rng = StdRng::seed_from_u64(spec.seed);

    let generator = CovarianceDataGenerator::new(spec.data.clone())?;
    let (views, _) = generator.generate(spec.samples, &mut rng)?;
    let widths: Vec<usize> = views.iter().map(Array2::ncols).collect();
    tracing::info!(
        model = spec.model.name(),
        samples = spec.samples,
        views = views.len(),
        "experiment data generated"
    );

    let (training, latents) = match &spec.model {
        ModelSpec::Dcca(config) => {
            let mut model = Dcca::build(&widths, config, &mut rng)?;
            let result = fit(&mut model, &views, &spec.training)?;
            (result, model.transform(&views, true)?)
        }
        ModelSpec::Dtcca(config) => {
            let mut model = Dtcca::build(&widths, config, &mut rng)?;
            let result = fit(&mut model, &views, &spec.training)?;
            (result, model.transform(&views, true)?)
        }
        ModelSpec::DccaNoi(config) => {
            let config = noi_config(config, spec.samples);
            let mut model = DccaNoi::build(&widths, &config, &mut rng)?;
            let result = fit(&mut model, &views, &spec.training)?;
            (result, model.transform(&views, true)?)
        }
        ModelSpec::Deconfounding(config) => {
            let mut model =
                DeconfoundingDcca::build(widths[0], widths[1], widths[2], config, &mut rng)?;
            let result = fit_deconfounding(&mut model, &views[..2], &views[2], &spec.training)?;
            let inputs: Vec<Tensor> = views.iter().cloned().map(Tensor::constant).collect();
            let (z_1, z_2) = model.forward(&inputs[0], &inputs[1], &inputs[2]);
            (result, vec![z_1.to_array(), z_2.to_array()])
        }
    };

    let correlations = canonical_correlations(&latents);
    tracing::info!(
        model = spec.model.name(),
        final_loss = training.final_loss,
        correlations = ?correlations.to_vec(),
        "experiment finished"
    );

    Ok(ExperimentReport {
        model: spec.model.name(),
        training,
        correlations,
        target_correlations: generator.correlation().to_vec(),
    })
}

/// Orthogonal iterations scale batch covariances to the generated sample count
/// unless the file sets `n`
fn noi_config(config: &NoiConfig, samples: usize) -> NoiConfig {
    NoiConfig { n: config.n.or(Some(samples)), ..config.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SPEC: &str = "
samples: 120
seed: 1
data:
  view_features: [5, 4]
  latent_dims: 1
  correlation: 0.9
model:
  type: dcca
  latent_dims: 1
  lr: 0.01
  encoder:
    kind: linear
training:
  epochs: 5
  batch_size: 60
";

    #[test]
    fn test_run_experiment() {
        let spec = ExperimentSpec::from_yaml_str(SPEC).unwrap();
        let report = run_experiment(&spec).unwrap();
        assert_eq!(report.model, "Dcca");
        assert_eq!(report.training.final_epoch, 5);
        assert_eq!(report.correlations.len(), 1);
        assert_eq!(report.target_correlations, vec![0.9]);
    }

    #[test]
    fn test_noi_sample_count_defaults_to_samples() {
        let yaml = "samples: 80\ndata:\n  view_features: [4, 4]\nmodel:\n  type: dcca_noi\n";
        let spec = ExperimentSpec::from_yaml_str(yaml).unwrap();
        let ModelSpec::DccaNoi(config) = &spec.model else {
            panic!("expected dcca_noi, got {:?}", spec.model);
        };
        assert_eq!(config.n, None);
        assert_eq!(noi_config(config, spec.samples).n, Some(80));

        let explicit = NoiConfig { n: Some(7), ..config.clone() };
        assert_eq!(noi_config(&explicit, spec.samples).n, Some(7));

        let report = run_experiment(&spec).unwrap();
        assert_eq!(report.model, "DccaNoi");
        assert!(report.training.final_loss.is_finite());
    }

    #[test]
    fn test_run_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SPEC.as_bytes()).unwrap();
        let report = run_from_yaml(file.path()).unwrap();
        assert!(report.training.final_loss.is_finite());
    }

    #[test]
    fn test_missing_file() {
        let err = load_spec("/nonexistent/experiment.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_spec_stops_before_generation() {
        let mut spec = ExperimentSpec::from_yaml_str(SPEC).unwrap();
        spec.data.view_features.push(3);
        assert!(matches!(run_experiment(&spec), Err(Error::InvalidConfiguration(_))));
    }
}
