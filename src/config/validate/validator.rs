//! Experiment validation logic

use crate::config::schema::{ExperimentSpec, ModelSpec};
use crate::error::{Error, Result};
use crate::objectives::ObjectiveKind;

/// Validate an experiment specification
///
/// Checks:
/// - Each section is valid on its own
/// - The number of generated views suits the model and its objective
/// - The model's latent width fits the generated views
pub fn validate_spec(spec: &ExperimentSpec) -> Result<()> {
    if spec.samples < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "samples must be at least 2, got {}",
            spec.samples
        )));
    }
    spec.data.validate()?;
    spec.training.validate()?;

    let views = spec.data.num_views();
    match &spec.model {
        ModelSpec::Dcca(config) => {
            config.validate()?;
            if config.objective == ObjectiveKind::Cca && views != 2 {
                return Err(view_count("the cca objective", "exactly 2", views));
            }
        }
        ModelSpec::Dtcca(config) => {
            config.validate()?;
            // the tensor objective's CP rank is bounded by every mode
            if let Some(&narrowest) = spec.data.view_features.iter().min() {
                if config.latent_dims > narrowest {
                    return Err(Error::InvalidConfiguration(format!(
                        "dtcca latent_dims {} exceeds the narrowest view ({narrowest} features)",
                        config.latent_dims
                    )));
                }
            }
        }
        ModelSpec::DccaNoi(config) => {
            config.validate()?;
            if views != 2 {
                return Err(view_count("dcca_noi", "exactly 2", views));
            }
        }
        ModelSpec::Deconfounding(config) => {
            config.validate()?;
            if views != 3 {
                return Err(view_count("deconfounding (two views plus confound)", "exactly 3", views));
            }
        }
    }
    Ok(())
}

fn view_count(what: &str, expected: &str, actual: usize) -> Error {
    Error::InvalidConfiguration(format!("{what} needs {expected} views, data describes {actual}"))
}
