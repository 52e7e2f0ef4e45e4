//! Releasing Perturbed Aggregates
//!
//! Adds Laplace noise to true aggregates and hands back only the perturbed
//! values. True values are taken by value and never logged, so once a
//! release returns, the library holds no copy of them.
//!
//! Releasing several groups (e.g. one count per region) draws one
//! independent sample per group with the same parameters. Whether those
//! groups share one epsilon (disjoint groups, parallel composition) or each
//! spend their own is the caller's accounting decision.

use crate::error::NoiseError;
use crate::laplace::LaplaceParams;
use crate::rng::RandomSource;
use crate::validation::validate_true_value;
use tracing::debug;

/// Perturb one true aggregate: `true_value + Lap(0, Δf/ε)`
///
/// # Errors
/// - `InvalidParameter` if `true_value` is not finite, or if the perturbed
///   value overflows
/// - `RandomSourceFailure` if the source fails
///
/// # Example
/// ```
/// use dp_noise::{release, LaplaceParams, ScriptedSource};
///
/// let params = LaplaceParams::new(1.0, 1.0)?;
/// let mut source = ScriptedSource::new(vec![0.5]); // zero noise
/// assert_eq!(release(42.0, &params, &mut source)?, 42.0);
/// # Ok::<(), dp_noise::NoiseError>(())
/// ```
pub fn release<S: RandomSource + ?Sized>(
    true_value: f64,
    params: &LaplaceParams,
    source: &mut S,
) -> Result<f64, NoiseError> {
    validate_true_value(true_value)?;
    let noise = params.sample(source)?;
    let released = perturb(true_value, noise)?;

    debug!(scale = params.scale(), "released perturbed aggregate");

    Ok(released)
}

/// Perturb a batch of true aggregates, one independent sample each
///
/// The input buffer is consumed and overwritten in place. All or nothing:
/// on any failure no perturbed values are returned.
///
/// # Errors
/// - `InvalidParameter` if the batch is empty, any value is not finite, or
///   any perturbed value overflows
/// - `RandomSourceFailure` if the source fails
pub fn release_all<S: RandomSource + ?Sized>(
    mut true_values: Vec<f64>,
    params: &LaplaceParams,
    source: &mut S,
) -> Result<Vec<f64>, NoiseError> {
    for &value in &true_values {
        validate_true_value(value)?;
    }

    let noise = params.sample_n(source, true_values.len()).map_err(|e| match e {
        NoiseError::InvalidParameter { reason, .. } => NoiseError::invalid("true_values", reason),
        other => other,
    })?;

    for (value, n) in true_values.iter_mut().zip(noise) {
        *value = perturb(*value, n)?;
    }

    debug!(
        scale = params.scale(),
        groups = true_values.len(),
        "released perturbed aggregates"
    );

    Ok(true_values)
}

fn perturb(true_value: f64, noise: f64) -> Result<f64, NoiseError> {
    let released = true_value + noise;
    if !released.is_finite() {
        return Err(NoiseError::invalid(
            "true_value",
            "perturbed value overflowed; reduce the magnitude of the aggregate",
        ));
    }
    Ok(released)
}
