//! Generator configuration schema

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Within-view covariance structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum CovarianceStructure {
    /// Identity matrix
    #[default]
    Identity,
    /// Gaussian kernel over an evenly spaced grid, scaled to a unit maximum
    Gaussian,
    /// Powers of `sigma` along the diagonals
    Toeplitz,
    /// Random symmetric matrix with a perturbed spectrum
    Random,
    /// Single-latent generator; not a per-view covariance
    Simple,
}

impl FromStr for CovarianceStructure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "identity" => Ok(Self::Identity),
            "gaussian" => Ok(Self::Gaussian),
            "toeplitz" => Ok(Self::Toeplitz),
            "random" => Ok(Self::Random),
            "simple" => Ok(Self::Simple),
            _ => Err(Error::InvalidStructureTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for CovarianceStructure {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for CovarianceStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Identity => "identity",
            Self::Gaussian => "gaussian",
            Self::Toeplitz => "toeplitz",
            Self::Random => "random",
            Self::Simple => "simple",
        };
        f.write_str(tag)
    }
}

/// Number of active features in a view
///
/// Values up to and including 1 are read as a fraction of the view's
/// features, so both `1` and `1.0` mean every feature is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sparsity {
    Count(usize),
    Fraction(f64),
}

impl Default for Sparsity {
    fn default() -> Self {
        Sparsity::Count(1)
    }
}

impl Sparsity {
    /// Active feature count for a view with `p` features, capped at `p`
    pub fn active_features(&self, p: usize) -> usize {
        let k = match *self {
            Sparsity::Count(k) if k > 1 => k,
            Sparsity::Count(k) => k * p,
            Sparsity::Fraction(f) => (f * p as f64).ceil() as usize,
        };
        k.min(p)
    }

    fn validate(&self, view: usize) -> Result<()> {
        match *self {
            Sparsity::Count(0) => Err(Error::InvalidConfiguration(format!(
                "view {view}: sparsity must activate at least one feature"
            ))),
            Sparsity::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(Error::InvalidConfiguration(
                format!("view {view}: sparsity fraction must be in (0, 1], got {f}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Target canonical correlations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Correlation {
    /// Leading correlation, decayed geometrically over later dimensions
    Scalar(f64),
    /// One correlation per latent dimension
    PerDimension(Vec<f64>),
}

impl Default for Correlation {
    fn default() -> Self {
        Correlation::Scalar(1.0)
    }
}

impl Correlation {
    /// Per-dimension correlations: `c · decay^k` for a scalar `c`
    pub fn expand(&self, latent_dims: usize, decay: f64) -> Result<Vec<f64>> {
        match self {
            Correlation::Scalar(c) => Ok((0..latent_dims).map(|k| c * decay.powi(k as i32)).collect()),
            Correlation::PerDimension(values) if values.len() == latent_dims => Ok(values.clone()),
            Correlation::PerDimension(values) => Err(Error::InvalidConfiguration(format!(
                "expected {latent_dims} correlations, got {}",
                values.len()
            ))),
        }
    }
}

fn default_latent_dims() -> usize {
    1
}

fn default_sigma() -> f64 {
    0.5
}

fn default_decay() -> f64 {
    0.5
}

fn default_max_attempts() -> usize {
    100
}

/// Configuration of the covariance-structured generator
///
/// Per-view lists left empty fall back to their defaults for every view:
/// dense weights, identity covariance, unconstrained signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of features in each view
    pub view_features: Vec<usize>,

    /// Number of correlated latent dimensions
    #[serde(default = "default_latent_dims")]
    pub latent_dims: usize,

    /// Active features per view
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub view_sparsity: Vec<Sparsity>,

    /// Target correlation spectrum
    #[serde(default)]
    pub correlation: Correlation,

    /// Within-view covariance structure per view
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structure: Vec<CovarianceStructure>,

    /// Kernel width (gaussian) or decay base (toeplitz)
    #[serde(default = "default_sigma")]
    pub sigma: f64,

    /// Ratio between consecutive correlations when `correlation` is a scalar
    #[serde(default = "default_decay")]
    pub decay: f64,

    /// Clamp negative weights to zero per view (sparse views only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positive: Vec<bool>,

    /// Attempts at building a positive-definite joint covariance
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl GeneratorConfig {
    /// Defaults for the given view widths
    pub fn new(view_features: Vec<usize>) -> Self {
        Self {
            view_features,
            latent_dims: default_latent_dims(),
            view_sparsity: Vec::new(),
            correlation: Correlation::default(),
            structure: Vec::new(),
            sigma: default_sigma(),
            decay: default_decay(),
            positive: Vec::new(),
            max_attempts: default_max_attempts(),
        }
    }

    pub fn with_latent_dims(mut self, latent_dims: usize) -> Self {
        self.latent_dims = latent_dims;
        self
    }

    pub fn with_sparsity(mut self, view_sparsity: Vec<Sparsity>) -> Self {
        self.view_sparsity = view_sparsity;
        self
    }

    pub fn with_correlation(mut self, correlation: Correlation) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_structure(mut self, structure: Vec<CovarianceStructure>) -> Self {
        self.structure = structure;
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_positive(mut self, positive: Vec<bool>) -> Self {
        self.positive = positive;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Parse from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse generator config: {e}")))
    }

    pub fn num_views(&self) -> usize {
        self.view_features.len()
    }

    pub fn sparsity(&self, view: usize) -> Sparsity {
        self.view_sparsity.get(view).copied().unwrap_or_default()
    }

    pub fn structure(&self, view: usize) -> CovarianceStructure {
        self.structure.get(view).copied().unwrap_or_default()
    }

    pub fn positive(&self, view: usize) -> bool {
        self.positive.get(view).copied().unwrap_or(false)
    }

    /// Check the configuration before any random draw
    pub fn validate(&self) -> Result<()> {
        let views = self.num_views();
        if views == 0 {
            return Err(Error::InvalidConfiguration("at least one view is required".into()));
        }
        if let Some(v) = self.view_features.iter().position(|&p| p == 0) {
            return Err(Error::InvalidConfiguration(format!("view {v} has no features")));
        }
        if self.latent_dims == 0 {
            return Err(Error::InvalidConfiguration("latent_dims must be > 0".into()));
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfiguration("max_attempts must be > 0".into()));
        }
        for (name, len) in [
            ("view_sparsity", self.view_sparsity.len()),
            ("structure", self.structure.len()),
            ("positive", self.positive.len()),
        ] {
            if len != 0 && len != views {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} has {len} entries for {views} views"
                )));
            }
        }
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(Error::InvalidConfiguration(format!("sigma must be > 0, got {}", self.sigma)));
        }
        self.correlation.expand(self.latent_dims, self.decay)?;

        for (v, &p) in self.view_features.iter().enumerate() {
            if self.structure(v) == CovarianceStructure::Simple {
                return Err(Error::InvalidConfiguration(format!(
                    "view {v}: 'simple' is a generator, not a per-view covariance structure; \
                     use generate_simple_data"
                )));
            }
            let sparsity = self.sparsity(v);
            sparsity.validate(v)?;
            let k = sparsity.active_features(p);
            if k < p && !patterns_available(p, k, self.latent_dims) {
                return Err(Error::InvalidConfiguration(format!(
                    "view {v}: {k} active of {p} features cannot give {} distinct patterns",
                    self.latent_dims
                )));
            }
        }
        Ok(())
    }
}

/// Whether `C(p, k) >= needed`
fn patterns_available(p: usize, k: usize, needed: usize) -> bool {
    let k = k.min(p - k);
    let mut count: u128 = 1;
    for i in 0..k {
        count = count * (p - i) as u128 / (i + 1) as u128;
        if count >= needed as u128 {
            return true;
        }
    }
    count >= needed as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_tags() {
        assert_eq!("Toeplitz".parse::<CovarianceStructure>().unwrap(), CovarianceStructure::Toeplitz);
        let err = "banded".parse::<CovarianceStructure>().unwrap_err();
        assert!(matches!(err, Error::InvalidStructureTag(tag) if tag == "banded"));
        assert_eq!(CovarianceStructure::Gaussian.to_string(), "gaussian");
    }

    #[test]
    fn test_sparsity_active_features() {
        assert_eq!(Sparsity::Fraction(0.3).active_features(10), 3);
        assert_eq!(Sparsity::Fraction(0.25).active_features(10), 3);
        assert_eq!(Sparsity::Count(4).active_features(10), 4);
        assert_eq!(Sparsity::Count(1).active_features(10), 10);
        assert_eq!(Sparsity::Fraction(1.0).active_features(10), 10);
        assert_eq!(Sparsity::Count(20).active_features(10), 10);
    }

    #[test]
    fn test_correlation_expand() {
        let c = Correlation::Scalar(0.9).expand(3, 0.5).unwrap();
        assert_eq!(c, vec![0.9, 0.45, 0.225]);
        assert!(Correlation::PerDimension(vec![0.9]).expand(2, 0.5).is_err());
    }

    #[test]
    fn test_yaml_roundtrip_with_defaults() {
        let yaml = r"
view_features: [10, 8]
latent_dims: 2
view_sparsity: [0.3, 2]
structure: [toeplitz, identity]
correlation: [0.9, 0.5]
";
        let config = GeneratorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.view_sparsity, vec![Sparsity::Fraction(0.3), Sparsity::Count(2)]);
        assert_eq!(config.structure(0), CovarianceStructure::Toeplitz);
        assert_eq!(config.correlation, Correlation::PerDimension(vec![0.9, 0.5]));
        assert_eq!(config.max_attempts, 100);
        assert!(!config.positive(1));
        config.validate().unwrap();
    }

    #[test]
    fn test_yaml_unknown_structure() {
        let err = GeneratorConfig::from_yaml_str("view_features: [3]\nstructure: [banded]").unwrap_err();
        assert!(err.to_string().contains("banded"));
    }

    #[test]
    fn test_validate_rejects() {
        let base = GeneratorConfig::new(vec![10, 10]);
        assert!(base.clone().with_latent_dims(0).validate().is_err());
        assert!(base.clone().with_structure(vec![CovarianceStructure::Identity]).validate().is_err());
        assert!(base
            .clone()
            .with_structure(vec![CovarianceStructure::Simple, CovarianceStructure::Identity])
            .validate()
            .is_err());
        assert!(base.clone().with_sparsity(vec![Sparsity::Count(0), Sparsity::Count(1)]).validate().is_err());
        assert!(base
            .clone()
            .with_sparsity(vec![Sparsity::Fraction(1.5), Sparsity::Count(1)])
            .validate()
            .is_err());
        // C(3, 2) = 3 patterns cannot cover 4 latent dimensions
        assert!(GeneratorConfig::new(vec![3, 3])
            .with_latent_dims(4)
            .with_sparsity(vec![Sparsity::Count(2), Sparsity::Count(2)])
            .validate()
            .is_err());
        base.validate().unwrap();
    }

    #[test]
    fn test_patterns_available() {
        assert!(patterns_available(10, 3, 120));
        assert!(!patterns_available(10, 3, 121));
        assert!(patterns_available(4, 4, 1));
        assert!(patterns_available(200, 100, usize::MAX));
    }
}
