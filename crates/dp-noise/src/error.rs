//! Error taxonomy for noise generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the noise generator.
///
/// Both kinds are raised synchronously at the call boundary. A failed call
/// never returns a partial batch of samples.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[non_exhaustive]
pub enum NoiseError {
    /// A caller-supplied value lies outside its valid domain
    #[error("Invalid parameter `{parameter}`: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// The random source failed, ran dry, or produced an out-of-range draw
    #[error("Random source failure: {0}")]
    RandomSourceFailure(String),
}

impl NoiseError {
    pub(crate) fn invalid(parameter: &str, reason: impl Into<String>) -> Self {
        NoiseError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn source_failure(reason: impl Into<String>) -> Self {
        NoiseError::RandomSourceFailure(reason.into())
    }

    /// True for `InvalidParameter`
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, NoiseError::InvalidParameter { .. })
    }

    /// True for `RandomSourceFailure`
    pub fn is_source_failure(&self) -> bool {
        matches!(self, NoiseError::RandomSourceFailure(_))
    }
}
