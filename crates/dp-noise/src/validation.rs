//! Input Validation for Laplace Mechanism Parameters
//!
//! Every check runs before any entropy is consumed, so a rejected call
//! leaves the random source untouched.
//!
//! # Parameter Constraints
//!
//! ## Epsilon (ε)
//! - Must be positive (> 0) and finite
//! - Smaller = more private, but more noise
//! - Values > 10 are accepted but provide little protection
//!
//! ## Sensitivity (Δf)
//! - Must be positive (> 0) and finite
//! - L1 sensitivity of the query, computed by the caller:
//!   - Count query: Δf = 1
//!   - Sum query: Δf = max contribution of one record
//!   - Histogram with disjoint groups: Δf = 1 per group
//!
//! ## Count
//! - At least one sample per call

use crate::error::NoiseError;
use tracing::warn;

/// Epsilon above which the guarantee is considered weak (logged, not rejected)
pub const WEAK_EPSILON: f64 = 10.0;

/// Largest accepted scale. |ln(1 - 2|u|)| never exceeds ~37 for draws in
/// (0, 1), so every sample at this scale stays finite.
pub const MAX_SCALE: f64 = f64::MAX / 64.0;

/// Validate epsilon parameter
///
/// # Constraints
/// - Must be finite
/// - Must be positive (> 0)
pub fn validate_epsilon(epsilon: f64) -> Result<(), NoiseError> {
    if !epsilon.is_finite() {
        return Err(NoiseError::invalid(
            "epsilon",
            format!("{} is not a finite number", epsilon),
        ));
    }

    if epsilon <= 0.0 {
        return Err(NoiseError::invalid(
            "epsilon",
            format!("{} must be positive", epsilon),
        ));
    }

    if epsilon > WEAK_EPSILON {
        warn!(epsilon, "epsilon above {} gives a weak privacy guarantee", WEAK_EPSILON);
    }

    Ok(())
}

/// Validate sensitivity parameter
///
/// # Constraints
/// - Must be finite
/// - Must be positive (> 0)
pub fn validate_sensitivity(sensitivity: f64) -> Result<(), NoiseError> {
    if !sensitivity.is_finite() {
        return Err(NoiseError::invalid(
            "sensitivity",
            format!("{} is not a finite number", sensitivity),
        ));
    }

    if sensitivity <= 0.0 {
        return Err(NoiseError::invalid(
            "sensitivity",
            format!("{} must be positive", sensitivity),
        ));
    }

    Ok(())
}

/// Validate the number of samples requested
pub fn validate_count(count: usize) -> Result<(), NoiseError> {
    if count == 0 {
        return Err(NoiseError::invalid("count", "must be at least 1"));
    }
    Ok(())
}

/// Validate the derived scale b = Δf/ε
///
/// Both inputs can be individually valid while their ratio overflows
/// (e.g. 1e300 / 1e-300) or underflows to zero.
pub fn validate_scale(sensitivity: f64, epsilon: f64) -> Result<f64, NoiseError> {
    validate_sensitivity(sensitivity)?;
    validate_epsilon(epsilon)?;

    let scale = sensitivity / epsilon;
    if !scale.is_finite() || scale <= 0.0 || scale > MAX_SCALE {
        return Err(NoiseError::invalid(
            "sensitivity",
            format!(
                "scale {} / {} = {} must be positive and at most {:e}",
                sensitivity, epsilon, scale, MAX_SCALE
            ),
        ));
    }

    Ok(scale)
}

/// Validate a true aggregate before it is perturbed
///
/// The value itself is never included in the error or in logs.
pub fn validate_true_value(value: f64) -> Result<(), NoiseError> {
    if !value.is_finite() {
        return Err(NoiseError::invalid("true_value", "must be a finite number"));
    }
    Ok(())
}

/// Validate a confidence level in the open interval (0, 1)
pub fn validate_confidence_level(level: f64) -> Result<(), NoiseError> {
    if !(level > 0.0 && level < 1.0) {
        return Err(NoiseError::invalid(
            "level",
            format!("{} must lie strictly between 0 and 1", level),
        ));
    }
    Ok(())
}
