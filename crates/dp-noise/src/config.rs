//! Noise Generation Configuration
//!
//! A serializable description of one generation request, for callers that
//! keep their release parameters in JSON next to the query definitions.
//!
//! ```json
//! { "sensitivity": 1.0, "epsilon": 0.5, "count": 2 }
//! ```
//!
//! `count` defaults to 1. `seed` is optional; when present, draws come from
//! a seeded ChaCha20 stream and are reproducible (test and audit use only).

use crate::error::NoiseError;
use crate::laplace::LaplaceParams;
use crate::rng::{OsEntropy, SeededSource};
use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_count() -> usize {
    1
}

/// One noise generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseConfig {
    /// L1 sensitivity of the query
    pub sensitivity: f64,
    /// Privacy-loss budget for this release
    pub epsilon: f64,
    /// Number of independent samples
    #[serde(default = "default_count")]
    pub count: usize,
    /// Fixed seed for reproducible draws
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl NoiseConfig {
    pub fn new(sensitivity: f64, epsilon: f64) -> Self {
        Self {
            sensitivity,
            epsilon,
            count: default_count(),
            seed: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a configuration from JSON
    ///
    /// Malformed JSON and unknown fields are reported as `InvalidParameter`
    /// on `config`. Values are not range-checked until [`Self::params`] or
    /// [`Self::generate`].
    pub fn from_json(json: &str) -> Result<Self, NoiseError> {
        serde_json::from_str(json).map_err(|e| NoiseError::invalid("config", e.to_string()))
    }

    /// Validated query descriptor for this configuration
    pub fn params(&self) -> Result<LaplaceParams, NoiseError> {
        LaplaceParams::new(self.sensitivity, self.epsilon)
    }

    /// Draw `count` samples as configured
    pub fn generate(&self) -> Result<Vec<f64>, NoiseError> {
        let params = self.params()?;
        match self.seed {
            Some(seed) => {
                warn!("generating noise from a fixed seed; output is reproducible");
                params.sample_n(&mut SeededSource::from_seed_u64(seed), self.count)
            }
            None => params.sample_n(&mut OsEntropy, self.count),
        }
    }
}
