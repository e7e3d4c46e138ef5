//! Logistic-regression probability oracle loaded from a JSON model file.
//!
//! Model file format:
//!
//! ```json
//! {
//!   "weights": [0.8, 0.000002, 0.00001, 0.4, 0.3, 2.5],
//!   "bias": -4.0,
//!   "means": [2.0, 5000.0, 1200.0, 1.5, 1.5, 0.1],
//!   "scales": [1.5, 9000.0, 2000.0, 1.0, 1.0, 0.2]
//! }
//! ```
//!
//! `means` and `scales` are optional standardization parameters applied as
//! `(x - mean) / scale` before the linear term.

use std::fs;
use std::path::Path;

use mule_core::error::OracleError;
use mule_core::traits::ProbabilityOracle;
use mule_core::types::FeatureVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("reading model file: {0}")] Io(String),
    #[error("parsing model file: {0}")] Parse(String),
    #[error("invalid model: {0}")] Invalid(String),
}

/// `p = σ(bias + Σ wᵢ·zᵢ)` with optional standardization `zᵢ = (xᵢ - meanᵢ) / scaleᵢ`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LogisticOracle {
    weights: Vec<f64>,
    bias: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    means: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scales: Option<Vec<f64>>,
}

impl LogisticOracle {
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Self, ModelError> {
        let oracle = Self {
            weights,
            bias,
            means: None,
            scales: None,
        };
        oracle.validate()?;
        Ok(oracle)
    }

    pub fn with_standardization(
        mut self,
        means: Vec<f64>,
        scales: Vec<f64>,
    ) -> Result<Self, ModelError> {
        self.means = Some(means);
        self.scales = Some(scales);
        self.validate()?;
        Ok(self)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let oracle: Self =
            serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))?;
        oracle.validate()?;
        Ok(oracle)
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.weights.is_empty() {
            return Err(ModelError::Invalid("no weights".into()));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::Invalid("non-finite coefficient".into()));
        }
        for (name, column) in [("means", &self.means), ("scales", &self.scales)] {
            if let Some(values) = column {
                if values.len() != self.weights.len() {
                    return Err(ModelError::Invalid(format!(
                        "{name} has {} entries, expected {}",
                        values.len(),
                        self.weights.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::Invalid(format!("non-finite {name}")));
                }
            }
        }
        if let Some(scales) = &self.scales {
            if scales.iter().any(|s| *s == 0.0) {
                return Err(ModelError::Invalid("zero scale".into()));
            }
        }
        Ok(())
    }

    fn logit(&self, x: &[f64]) -> f64 {
        let mut z = self.bias;
        for (i, (w, v)) in self.weights.iter().zip(x).enumerate() {
            let mean = self.means.as_ref().map_or(0.0, |m| m[i]);
            let scale = self.scales.as_ref().map_or(1.0, |s| s[i]);
            z += w * (v - mean) / scale;
        }
        z
    }
}

/// Logistic function without overflow for large `|z|`.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl ProbabilityOracle for LogisticOracle {
    fn arity(&self) -> usize {
        self.weights.len()
    }

    fn probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        if features.len() != self.weights.len() {
            return Err(OracleError::Unavailable(format!(
                "model expects {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        Ok(sigmoid(self.logit(features.as_slice())))
    }

    fn name(&self) -> &str {
        "logistic"
    }
}
