//! Configuration file schema for loopcurate.
//!
//! A config carries the scorer's weights and decision thresholds. Every field
//! is optional; missing values fall back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names searched in the working directory, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["loopcurate.yaml", "loopcurate.yml", ".loopcurate.yaml"];

/// Tolerance for the weights summing to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Invalid configuration. The scorer and the pipeline refuse to construct.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("scoring weights sum to {0}, expected 1.0")]
    WeightSum(f64),
    #[error("weight {name} = {value} is outside [0,1]")]
    WeightOutOfRange { name: &'static str, value: f64 },
    #[error("threshold {name} = {value} is outside [0,1]")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
    #[error("rejection threshold {rejection} must be below approval threshold {approval}")]
    ThresholdOrder { approval: f64, rejection: f64 },
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Directory holding the persisted collections (default: "data")
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Whether batches are processed on the rayon pool (default: true)
    #[serde(default)]
    pub parallel: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// First default-named config file present in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()
    }
}

/// Weights and thresholds of the quality scorer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()
    }
}

/// Relative importance of each sub-score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Weights {
    pub popularity: f64,
    pub code_quality: f64,
    pub content_quality: f64,
    pub categorization: f64,
    pub recency: f64,
    pub author: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            popularity: 0.25,
            code_quality: 0.20,
            content_quality: 0.20,
            categorization: 0.15,
            recency: 0.10,
            author: 0.10,
        }
    }
}

impl Weights {
    /// Named weights in summation order.
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("popularity", self.popularity),
            ("code_quality", self.code_quality),
            ("content_quality", self.content_quality),
            ("categorization", self.categorization),
            ("recency", self.recency),
            ("author", self.author),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }
        let sum: f64 = self.entries().iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Decision thresholds: approved at or above `approval`, rejected strictly
/// below `rejection`, needs review in between.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    pub approval: f64,
    pub rejection: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            approval: 0.60,
            rejection: 0.35,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("approval", self.approval), ("rejection", self.rejection)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.rejection >= self.approval {
            return Err(ConfigError::ThresholdOrder {
                approval: self.approval,
                rejection: self.rejection,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1.0"
scoring:
  weights:
    popularity: 0.30
    code_quality: 0.15
  thresholds:
    approval: 0.7
data_dir: "out"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scoring.weights.popularity, 0.30);
        assert_eq!(config.scoring.weights.code_quality, 0.15);
        // unspecified fields keep their defaults
        assert_eq!(config.scoring.weights.author, 0.10);
        assert_eq!(config.scoring.thresholds.approval, 0.7);
        assert_eq!(config.scoring.thresholds.rejection, 0.35);
        assert_eq!(config.data_dir(), PathBuf::from("out"));
        assert!(config.is_parallel());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.data_dir(), PathBuf::from("data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_template_is_valid() {
        let config: Config =
            serde_yaml::from_str(include_str!("templates/default.yaml")).unwrap();
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weight_sum_rejected() {
        let weights = Weights {
            popularity: 0.5,
            ..Weights::default()
        };
        assert!(matches!(weights.validate(), Err(ConfigError::WeightSum(_))));
    }

    #[test]
    fn test_weight_out_of_range() {
        let weights = Weights {
            popularity: 1.25,
            code_quality: -0.05,
            content_quality: -0.05,
            categorization: -0.05,
            recency: -0.05,
            author: -0.05,
        };
        assert_eq!(
            weights.validate(),
            Err(ConfigError::WeightOutOfRange {
                name: "popularity",
                value: 1.25
            })
        );
    }

    #[test]
    fn test_threshold_validation() {
        let inverted = Thresholds {
            approval: 0.3,
            rejection: 0.5,
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::ThresholdOrder { .. })
        ));

        let equal = Thresholds {
            approval: 0.5,
            rejection: 0.5,
        };
        assert!(equal.validate().is_err());

        let out_of_range = Thresholds {
            approval: 1.5,
            rejection: 0.35,
        };
        assert!(matches!(
            out_of_range.validate(),
            Err(ConfigError::ThresholdOutOfRange { name: "approval", .. })
        ));
    }
}
