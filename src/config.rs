//! YAML configuration file support for motifmine.
//!
//! Deployments can describe a whole mining run in a single YAML file —
//! sketch error parameters, mining knobs, and planner budget — and load it
//! at runtime instead of assembling an [`EnrichConfig`] in code.
//!
//! ## Example YAML configuration
//!
//! ```yaml
//! # Motifmine pipeline configuration
//! version: "1.0"
//! name: "attribution-motifs"
//!
//! sketch:
//!   delta: 1.0e-4
//!   epsilon: 5.0e-5
//!   seed: 1732584193
//!
//! mining:
//!   motif_size: 3
//!   filter_len: 8
//!   min_count: 1
//!   batch_size: null        # null = let the planner decide
//!   partition_width: 10
//!   accelerator: cpu
//!   use_parallel: true
//!
//! planner:
//!   target_gb: 1.0
//!   safety: 0.8
//!   min_batch: 10
//!   max_batch: 10000
//!
//! env_overrides:
//!   sketch.seed: MOTIFMINE_SEED
//! ```
//!
//! `env_overrides` maps a config path to an environment variable; when the
//! variable is set at load time its value replaces the field.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Accelerator, BatchPolicy, EnrichConfig, PlanningOptions, SketchConfig};

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid override for {key}: {value}")]
    InvalidOverride { key: String, value: String },
}

/// Top-level YAML configuration for a mining run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MotifmineConfig {
    /// Configuration format version.
    pub version: String,

    /// Optional configuration name/description.
    #[serde(default)]
    pub name: Option<String>,

    /// Sketch error parameters.
    #[serde(default)]
    pub sketch: SketchYamlConfig,

    /// Mining knobs.
    #[serde(default)]
    pub mining: MiningYamlConfig,

    /// Planner budget.
    #[serde(default)]
    pub planner: PlannerYamlConfig,

    /// Config-path -> environment-variable overrides.
    #[serde(default)]
    pub env_overrides: HashMap<String, String>,
}

/// YAML view of [`SketchConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchYamlConfig {
    pub delta: f64,
    pub epsilon: f64,
    pub seed: u64,
}

impl Default for SketchYamlConfig {
    fn default() -> Self {
        let cfg = SketchConfig::default();
        Self {
            delta: cfg.delta,
            epsilon: cfg.epsilon,
            seed: cfg.seed,
        }
    }
}

/// YAML view of the mining knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningYamlConfig {
    pub motif_size: usize,
    #[serde(default)]
    pub filter_len: Option<i32>,
    pub min_count: u32,
    /// `null` lets the planner decide.
    #[serde(default)]
    pub batch_size: Option<usize>,
    pub partition_width: usize,
    pub accelerator: Accelerator,
    pub use_parallel: bool,
}

impl Default for MiningYamlConfig {
    fn default() -> Self {
        let cfg = EnrichConfig::default();
        Self {
            motif_size: cfg.motif_size,
            filter_len: cfg.filter_len,
            min_count: cfg.min_count,
            batch_size: None,
            partition_width: cfg.partition_width,
            accelerator: cfg.accelerator,
            use_parallel: cfg.use_parallel,
        }
    }
}

/// YAML view of [`PlanningOptions`], budget given in GB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerYamlConfig {
    #[serde(default)]
    pub target_gb: Option<f64>,
    pub safety: f64,
    pub min_batch: usize,
    pub max_batch: usize,
}

impl Default for PlannerYamlConfig {
    fn default() -> Self {
        let opts = PlanningOptions::default();
        Self {
            target_gb: None,
            safety: opts.safety,
            min_batch: opts.min_batch,
            max_batch: opts.max_batch,
        }
    }
}

impl MotifmineConfig {
    /// Load a YAML configuration file from the given path.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let text = fs::read_to_string(path)?;
        Self::load_from_str(&text)
    }

    /// Parse a YAML configuration from a string.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigLoadError> {
        let mut cfg: MotifmineConfig = serde_yaml::from_str(text)?;
        if cfg.version != "1.0" && cfg.version != "1" {
            return Err(ConfigLoadError::UnsupportedVersion(cfg.version));
        }
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// Apply any `env_overrides` whose environment variable is set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigLoadError> {
        let overrides: Vec<(String, String)> = self
            .env_overrides
            .iter()
            .filter_map(|(key, var)| {
                std::env::var(var).ok().map(|value| (key.clone(), value))
            })
            .collect();
        for (key, value) in overrides {
            self.apply_override(&key, &value)?;
        }
        Ok(())
    }

    fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigLoadError> {
        let invalid = || ConfigLoadError::InvalidOverride {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "sketch.delta" => self.sketch.delta = value.parse().map_err(|_| invalid())?,
            "sketch.epsilon" => self.sketch.epsilon = value.parse().map_err(|_| invalid())?,
            "sketch.seed" => self.sketch.seed = value.parse().map_err(|_| invalid())?,
            "mining.motif_size" => {
                self.mining.motif_size = value.parse().map_err(|_| invalid())?
            }
            "mining.filter_len" => {
                self.mining.filter_len = Some(value.parse().map_err(|_| invalid())?)
            }
            "mining.min_count" => self.mining.min_count = value.parse().map_err(|_| invalid())?,
            "mining.batch_size" => {
                self.mining.batch_size = Some(value.parse().map_err(|_| invalid())?)
            }
            "mining.partition_width" => {
                self.mining.partition_width = value.parse().map_err(|_| invalid())?
            }
            "mining.use_parallel" => {
                self.mining.use_parallel = value.parse().map_err(|_| invalid())?
            }
            "planner.target_gb" => {
                self.planner.target_gb = Some(value.parse().map_err(|_| invalid())?)
            }
            "planner.safety" => self.planner.safety = value.parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        }
        Ok(())
    }

    /// Convert into a validated [`EnrichConfig`].
    pub fn into_enrich_config(self) -> Result<EnrichConfig, ConfigLoadError> {
        let batch = match self.mining.batch_size {
            Some(batch_size) => BatchPolicy::Fixed(batch_size),
            None => BatchPolicy::Auto,
        };
        let target_bytes = self
            .planner
            .target_gb
            .map(|gb| (gb * 1024.0 * 1024.0 * 1024.0) as u64);
        let cfg = EnrichConfig {
            motif_size: self.mining.motif_size,
            filter_len: self.mining.filter_len,
            sketch: SketchConfig {
                delta: self.sketch.delta,
                epsilon: self.sketch.epsilon,
                seed: self.sketch.seed,
            },
            min_count: self.mining.min_count,
            batch,
            planning: PlanningOptions {
                target_bytes,
                safety: self.planner.safety,
                min_batch: self.planner.min_batch,
                max_batch: self.planner.max_batch,
            },
            partition_width: self.mining.partition_width,
            accelerator: self.mining.accelerator,
            use_parallel: self.mining.use_parallel,
        };
        cfg.validate()
            .map_err(|err| ConfigLoadError::Validation(err.to_string()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
version: "1.0"
name: "attribution-motifs"

sketch:
  delta: 1.0e-3
  epsilon: 1.0e-4
  seed: 99

mining:
  motif_size: 2
  filter_len: 8
  min_count: 4
  batch_size: 500
  partition_width: 5
  accelerator: cpu
  use_parallel: false

planner:
  target_gb: 1.0
  safety: 0.9
  min_batch: 10
  max_batch: 2000
"#;

    #[test]
    fn load_full_configuration() {
        let cfg = MotifmineConfig::load_from_str(FULL_YAML).unwrap();
        assert_eq!(cfg.name.as_deref(), Some("attribution-motifs"));
        assert_eq!(cfg.sketch.seed, 99);
        assert_eq!(cfg.mining.motif_size, 2);
        assert_eq!(cfg.planner.max_batch, 2000);
    }

    #[test]
    fn into_enrich_config_maps_every_field() {
        let cfg = MotifmineConfig::load_from_str(FULL_YAML)
            .unwrap()
            .into_enrich_config()
            .unwrap();
        assert_eq!(cfg.motif_size, 2);
        assert_eq!(cfg.filter_len, Some(8));
        assert_eq!(cfg.min_count, 4);
        assert_eq!(cfg.batch, BatchPolicy::Fixed(500));
        assert_eq!(cfg.partition_width, 5);
        assert!(!cfg.use_parallel);
        assert_eq!(cfg.sketch.delta, 1.0e-3);
        assert_eq!(
            cfg.planning.target_bytes,
            Some(1024 * 1024 * 1024)
        );
        assert_eq!(cfg.planning.safety, 0.9);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = MotifmineConfig::load_from_str("version: \"1.0\"\n").unwrap();
        let enrich = cfg.into_enrich_config().unwrap();
        assert_eq!(enrich, EnrichConfig::default());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let result = MotifmineConfig::load_from_str("version: \"2.0\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(version)) if version == "2.0"
        ));
    }

    #[test]
    fn invalid_knobs_fail_validation() {
        let yaml = "version: \"1.0\"\nmining:\n  motif_size: 0\n  min_count: 1\n  partition_width: 10\n  accelerator: cpu\n  use_parallel: true\n";
        let result = MotifmineConfig::load_from_str(yaml)
            .unwrap()
            .into_enrich_config();
        assert!(matches!(result, Err(ConfigLoadError::Validation(_))));
    }

    #[test]
    fn env_override_replaces_field_when_set() {
        std::env::set_var("MOTIFMINE_TEST_SEED", "4242");
        let yaml = "version: \"1.0\"\nenv_overrides:\n  sketch.seed: MOTIFMINE_TEST_SEED\n";
        let cfg = MotifmineConfig::load_from_str(yaml).unwrap();
        assert_eq!(cfg.sketch.seed, 4242);
        std::env::remove_var("MOTIFMINE_TEST_SEED");
    }

    #[test]
    fn env_override_with_bad_value_errors() {
        std::env::set_var("MOTIFMINE_TEST_BAD_SEED", "not-a-number");
        let yaml = "version: \"1.0\"\nenv_overrides:\n  sketch.seed: MOTIFMINE_TEST_BAD_SEED\n";
        let result = MotifmineConfig::load_from_str(yaml);
        assert!(matches!(
            result,
            Err(ConfigLoadError::InvalidOverride { .. })
        ));
        std::env::remove_var("MOTIFMINE_TEST_BAD_SEED");
    }

    #[test]
    fn unknown_override_key_errors() {
        std::env::set_var("MOTIFMINE_TEST_UNKNOWN", "1");
        let yaml = "version: \"1.0\"\nenv_overrides:\n  nope.nothing: MOTIFMINE_TEST_UNKNOWN\n";
        let result = MotifmineConfig::load_from_str(yaml);
        assert!(matches!(
            result,
            Err(ConfigLoadError::InvalidOverride { .. })
        ));
        std::env::remove_var("MOTIFMINE_TEST_UNKNOWN");
    }
}
