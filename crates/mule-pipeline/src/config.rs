//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries the scoring policy (CBI weights, risk thresholds)
//! and the worker-pool size. Defaults match the published policy constants.
//! [`PipelineConfig::load`] layers an optional TOML file and `MULEGRAPH__*`
//! environment variables over those defaults.

use std::path::Path;

use config::{Config, Environment, File};
use mule_core::error::PipelineError;
use mule_core::policy::{CbiWeights, RiskThresholds};
use serde::{Deserialize, Serialize};

/// Prefix for environment overrides, e.g. `MULEGRAPH__THRESHOLDS__HIGH=0.8`.
pub const ENV_PREFIX: &str = "MULEGRAPH";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Weights of the composite behavioral index.
    pub cbi_weights: CbiWeights,
    /// Probability cut-offs for the risk tiers.
    pub thresholds: RiskThresholds,
    /// Size of a dedicated worker pool. `None` uses the global rayon pool.
    pub worker_threads: Option<usize>,
}

impl PipelineConfig {
    /// Defaults, then `path` (if given), then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        Self::load_from(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(env.separator(ENV_SEPARATOR).try_parsing(true))
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let cfg: Self = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.cbi_weights.is_valid() {
            return Err(PipelineError::Config(
                "cbi weights must be finite".into(),
            ));
        }
        if !self.thresholds.is_valid() {
            return Err(PipelineError::Config(format!(
                "thresholds must satisfy 0 <= medium <= high <= 1 (medium={}, high={})",
                self.thresholds.medium, self.thresholds.high
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(PipelineError::Config("worker_threads must be at least 1".into()));
        }
        Ok(())
    }
}
