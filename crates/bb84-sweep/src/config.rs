//! Sweep configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with BB84_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ```yaml
//! n: 50000
//! seed: 1
//! noise_model: depolarizing
//! p_noise: { start: 0.0, stop: 0.2, steps: 21 }
//! q_eve: [0.0, 0.5, 1.0]
//! workers: 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use bb84_core::{Bb84Params, NoiseModel};

use crate::error::{SweepError, SweepResult};

/// One axis of the parameter grid.
///
/// Either an evenly spaced range with inclusive endpoints, or an explicit
/// list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridAxis {
    /// `steps` evenly spaced values from `start` to `stop` inclusive.
    Range {
        /// First value.
        start: f64,
        /// Last value.
        stop: f64,
        /// Number of values.
        steps: usize,
    },
    /// Explicit values, used in the given order.
    Values(Vec<f64>),
}

impl GridAxis {
    /// Shorthand for [`GridAxis::Range`].
    pub fn linspace(start: f64, stop: f64, steps: usize) -> Self {
        GridAxis::Range { start, stop, steps }
    }

    /// Expand into concrete values.
    pub fn values(&self) -> Vec<f64> {
        match self {
            GridAxis::Range { start, stop, steps } => match *steps {
                0 => Vec::new(),
                1 => vec![*start],
                n => (0..n)
                    .map(|i| {
                        if i == n - 1 {
                            *stop
                        } else {
                            start + (stop - start) * i as f64 / (n - 1) as f64
                        }
                    })
                    .collect(),
            },
            GridAxis::Values(v) => v.clone(),
        }
    }

    /// Number of values on this axis.
    pub fn len(&self) -> usize {
        match self {
            GridAxis::Range { steps, .. } => *steps,
            GridAxis::Values(v) => v.len(),
        }
    }

    /// True if the axis has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Complete sweep configuration.
///
/// Unknown keys are rejected so that a misspelled field cannot silently fall
/// back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Rounds per grid point.
    #[serde(default = "default_n")]
    pub n: usize,

    /// Seed shared by every grid point; `None` seeds each point from entropy.
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,

    /// Channel noise model.
    #[serde(default)]
    pub noise_model: NoiseModel,

    /// Channel noise probabilities.
    #[serde(default = "default_p_noise")]
    pub p_noise: GridAxis,

    /// Interception probabilities.
    #[serde(default = "default_q_eve")]
    pub q_eve: GridAxis,

    /// Worker threads; `None` uses every available core.
    #[serde(default)]
    pub workers: Option<usize>,
}

// Default value functions
fn default_n() -> usize {
    50_000
}

fn default_seed() -> Option<u64> {
    Some(1)
}

fn default_p_noise() -> GridAxis {
    GridAxis::linspace(0.0, 0.20, 21)
}

fn default_q_eve() -> GridAxis {
    GridAxis::linspace(0.0, 1.0, 21)
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            n: default_n(),
            seed: default_seed(),
            noise_model: NoiseModel::default(),
            p_noise: default_p_noise(),
            q_eve: default_q_eve(),
            workers: None,
        }
    }
}

impl SweepConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SweepResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SweepError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    ///
    /// Values are not validated here; later layers may still override them.
    pub fn from_yaml(contents: &str) -> SweepResult<Self> {
        Ok(serde_yaml_ng::from_str(contents)?)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    /// 3. Load .env file if it exists
    pub fn load(config_file: Option<&Path>) -> SweepResult<Self> {
        let config = Self::load_unvalidated(config_file)?;
        config.validate()?;
        Ok(config)
    }

    /// Same layering as [`SweepConfig::load`], without the final
    /// [`SweepConfig::validate`]. For callers that apply further overrides
    /// and validate once at the end.
    pub fn load_unvalidated(config_file: Option<&Path>) -> SweepResult<Self> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => SweepConfig::default(),
        };

        let config = config.merge_env()?;
        debug!(?config, "sweep configuration loaded");
        Ok(config)
    }

    /// Merge `BB84_*` environment variables into this configuration.
    pub fn merge_env(self) -> SweepResult<Self> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup.
    ///
    /// Only variables that are present override the current values. A
    /// present but unparseable value is an error.
    pub fn merge_env_from<F>(mut self, lookup: F) -> SweepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BB84_N") {
            self.n = parse_env("BB84_N", &v)?;
        }
        if let Some(v) = lookup("BB84_SEED") {
            self.seed = match v.trim() {
                "" | "none" => None,
                s => Some(parse_env("BB84_SEED", s)?),
            };
        }
        if let Some(v) = lookup("BB84_NOISE_MODEL") {
            self.noise_model = v.parse().map_err(|e: bb84_core::Bb84Error| {
                SweepError::Config(format!("BB84_NOISE_MODEL: {e}"))
            })?;
        }
        if let Some(v) = lookup("BB84_WORKERS") {
            self.workers = Some(parse_env("BB84_WORKERS", &v)?);
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> SweepResult<()> {
        if self.n == 0 {
            return Err(SweepError::Config("n must be greater than 0".to_string()));
        }

        for (name, axis) in [("p_noise", &self.p_noise), ("q_eve", &self.q_eve)] {
            if axis.is_empty() {
                return Err(SweepError::Config(format!("{name} axis has no values")));
            }
            if let Some(bad) = axis.values().into_iter().find(|v| !(0.0..=1.0).contains(v)) {
                return Err(SweepError::Config(format!(
                    "{name} values must be in [0, 1], got {bad}"
                )));
            }
        }

        if self.workers == Some(0) {
            return Err(SweepError::Config(
                "workers must be greater than 0; omit the field to use all cores".to_string(),
            ));
        }

        Ok(())
    }

    /// Every `(p_noise, q_eve)` grid point, p-major.
    pub fn points(&self) -> Vec<(f64, f64)> {
        let q_values = self.q_eve.values();
        self.p_noise
            .values()
            .into_iter()
            .flat_map(|p| q_values.iter().map(move |&q| (p, q)))
            .collect()
    }

    /// Core parameters for a single grid point.
    pub fn params_at(&self, p_noise: f64, q_eve: f64) -> Bb84Params {
        Bb84Params::new(self.n)
            .with_p_noise(p_noise)
            .with_q_eve(q_eve)
            .with_noise_model(self.noise_model)
            .with_seed(self.seed)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> SweepResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| SweepError::Config(format!("{key}: invalid value '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert_eq!(config.n, 50_000);
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.noise_model, NoiseModel::Depolarizing);
        assert_eq!(config.p_noise.len(), 21);
        assert_eq!(config.points().len(), 21 * 21);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_linspace_endpoints() {
        let values = GridAxis::linspace(0.0, 0.2, 21).values();
        assert_eq!(values.len(), 21);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[20], 0.2);
        assert!((values[10] - 0.1).abs() < 1e-12);
        assert_eq!(GridAxis::linspace(0.3, 0.9, 1).values(), vec![0.3]);
    }

    #[test]
    fn test_yaml_range_and_list_axes() {
        let yaml = "n: 1000\nnoise_model: bitflip\np_noise: { start: 0.0, stop: 0.1, steps: 3 }\nq_eve: [0.0, 0.5]\n";
        let config = SweepConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.n, 1000);
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.noise_model, NoiseModel::BitFlip);
        assert_eq!(config.q_eve, GridAxis::Values(vec![0.0, 0.5]));
        assert_eq!(config.points().len(), 6);
        assert_eq!(config.points()[1], (0.0, 0.5));
    }

    #[test]
    fn test_yaml_unknown_noise_model() {
        assert!(matches!(
            SweepConfig::from_yaml("noise_model: amplitude\n"),
            Err(SweepError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let yaml = "n: 1000\np_noise_values: [0.0, 0.1]\n";
        assert!(matches!(
            SweepConfig::from_yaml(yaml),
            Err(SweepError::Config(msg)) if msg.contains("p_noise_values")
        ));
    }

    #[test]
    fn test_yaml_invalid_value_fixed_by_env() {
        let config = SweepConfig::from_yaml("n: 0\nworkers: 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = config
            .merge_env_from(lookup(&[("BB84_N", "100"), ("BB84_WORKERS", "2")]))
            .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.n, 100);
    }

    #[test]
    fn test_from_file_defers_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.yaml");
        std::fs::write(&path, "n: 0\nq_eve: [0.0]\n").unwrap();
        let config = SweepConfig::from_file(&path).unwrap();
        assert_eq!(config.n, 0);
        assert_eq!(config.q_eve.len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SweepConfig::default();
        config.n = 0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.q_eve = GridAxis::Values(vec![0.5, 1.2]);
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.p_noise = GridAxis::Values(vec![]);
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.workers = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = SweepConfig::default()
            .merge_env_from(lookup(&[
                ("BB84_N", "200"),
                ("BB84_SEED", "none"),
                ("BB84_NOISE_MODEL", "bitflip"),
                ("BB84_WORKERS", "2"),
            ]))
            .unwrap();
        assert_eq!(config.n, 200);
        assert_eq!(config.seed, None);
        assert_eq!(config.noise_model, NoiseModel::BitFlip);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_env_absent_leaves_values() {
        let config = SweepConfig::default().merge_env_from(lookup(&[])).unwrap();
        assert_eq!(config, SweepConfig::default());
    }

    #[test]
    fn test_env_invalid_value() {
        let result = SweepConfig::default().merge_env_from(lookup(&[("BB84_N", "many")]));
        assert!(matches!(result, Err(SweepError::Config(_))));
    }

    #[test]
    fn test_params_at() {
        let config = SweepConfig::default();
        let params = config.params_at(0.1, 0.5);
        assert_eq!(params.n, config.n);
        assert_eq!(params.seed, config.seed);
        assert_eq!(params.p_noise, 0.1);
        assert_eq!(params.q_eve, 0.5);
    }
}
