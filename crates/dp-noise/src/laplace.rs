//! Laplace Noise Generator
//!
//! Implements the classic Laplace mechanism for (ε, 0)-differential privacy.
//!
//! # Mathematical Foundation
//!
//! For a numeric query f with L1 sensitivity Δf, the mechanism releases
//!
//! ```text
//! M(D) = f(D) + Lap(0, Δf/ε)
//! ```
//!
//! The Laplace distribution with scale b = Δf/ε has PDF and CDF:
//!
//! ```text
//! p(x) = (1/2b) * e^(-|x|/b)
//! F(x) = 0.5 + 0.5 * sign(x) * (1 - e^(-|x|/b))
//! ```
//!
//! # Inverse CDF Sampling
//!
//! Given a uniform draw x in (0, 1), let u = x - 0.5 in (-0.5, 0.5):
//!
//! ```text
//! X = -b * sign(u) * ln(1 - 2|u|)
//! ```
//!
//! X ~ Laplace(0, b). Draws for which 1 - 2|u| is not strictly positive
//! would produce ln(0) and are rejected as a random source failure.

use crate::error::NoiseError;
use crate::rng::{OsEntropy, RandomSource};
use crate::validation::{validate_confidence_level, validate_count, validate_scale};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Validated query descriptor: sensitivity, epsilon and the derived scale
///
/// Construction is the only validation point. A `LaplaceParams` value
/// always carries a positive, finite scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParamsRepr", into = "ParamsRepr")]
pub struct LaplaceParams {
    sensitivity: f64,
    epsilon: f64,
    scale: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct ParamsRepr {
    sensitivity: f64,
    epsilon: f64,
}

impl TryFrom<ParamsRepr> for LaplaceParams {
    type Error = NoiseError;

    fn try_from(repr: ParamsRepr) -> Result<Self, Self::Error> {
        LaplaceParams::new(repr.sensitivity, repr.epsilon)
    }
}

impl From<LaplaceParams> for ParamsRepr {
    fn from(params: LaplaceParams) -> Self {
        ParamsRepr {
            sensitivity: params.sensitivity,
            epsilon: params.epsilon,
        }
    }
}

impl LaplaceParams {
    /// Validate sensitivity and epsilon and compute scale = Δf/ε
    ///
    /// # Errors
    /// `InvalidParameter` if either input is non-positive or non-finite, or
    /// if their ratio is not a positive finite number.
    pub fn new(sensitivity: f64, epsilon: f64) -> Result<Self, NoiseError> {
        let scale = validate_scale(sensitivity, epsilon)?;
        Ok(Self {
            sensitivity,
            epsilon,
            scale,
        })
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Scale parameter b = Δf/ε
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Var(Lap(0, b)) = 2b²
    pub fn variance(&self) -> f64 {
        2.0 * self.scale * self.scale
    }

    /// SD = √2 · b
    pub fn std_dev(&self) -> f64 {
        std::f64::consts::SQRT_2 * self.scale
    }

    /// E[|X|] = b
    pub fn expected_magnitude(&self) -> f64 {
        self.scale
    }

    /// Half-width of the central interval holding `level` of the noise mass
    ///
    /// P(|X| < x) = 1 - e^(-x/b), so x = -b · ln(1 - level).
    /// At 95 % this is b · ln(20) ≈ 3b.
    pub fn confidence_interval(&self, level: f64) -> Result<f64, NoiseError> {
        validate_confidence_level(level)?;
        Ok(-self.scale * (1.0 - level).ln())
    }

    /// CDF of Lap(0, b) at `x`
    pub fn cdf(&self, x: f64) -> f64 {
        laplace_cdf(x, self.scale)
    }

    /// Draw one sample from Lap(0, b)
    ///
    /// # Errors
    /// `RandomSourceFailure` if the source fails or yields a draw outside
    /// the open interval (0, 1).
    pub fn sample<S: RandomSource + ?Sized>(&self, source: &mut S) -> Result<f64, NoiseError> {
        let x = source.next_uniform()?;
        inverse_cdf(x, self.scale)
    }

    /// Draw `count` independent samples from Lap(0, b)
    ///
    /// All or nothing: a failure on any draw discards the batch.
    pub fn sample_n<S: RandomSource + ?Sized>(
        &self,
        source: &mut S,
        count: usize,
    ) -> Result<Vec<f64>, NoiseError> {
        validate_count(count)?;

        debug!(
            scale = self.scale,
            epsilon = self.epsilon,
            sensitivity = self.sensitivity,
            count,
            "drawing laplace noise"
        );

        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            match self.sample(source) {
                Ok(noise) => samples.push(noise),
                Err(e) => {
                    warn!(
                        drawn = samples.len(),
                        requested = count,
                        error = %e,
                        "noise generation aborted"
                    );
                    return Err(e);
                }
            }
        }

        Ok(samples)
    }
}

/// Map a uniform draw in (0, 1) to Lap(0, scale)
fn inverse_cdf(x: f64, scale: f64) -> Result<f64, NoiseError> {
    if !(x > 0.0 && x < 1.0) {
        return Err(NoiseError::source_failure(format!(
            "uniform draw {} outside the open interval (0, 1)",
            x
        )));
    }

    let u = x - 0.5;
    let tail = 1.0 - 2.0 * u.abs();
    if tail <= 0.0 {
        // x within rounding distance of 0 or 1: ln(0) territory
        return Err(NoiseError::source_failure(format!(
            "uniform draw {} too close to the interval boundary",
            x
        )));
    }

    Ok(-scale * u.signum() * tail.ln())
}

/// CDF of the zero-centered Laplace distribution
///
/// F(x) = 0.5 + 0.5 · sign(x) · (1 - e^(-|x|/b)). `scale` must be positive;
/// a non-positive scale yields NaN.
pub fn laplace_cdf(x: f64, scale: f64) -> f64 {
    if !(scale > 0.0) {
        return f64::NAN;
    }
    let tail = 0.5 * (-x.abs() / scale).exp();
    if x < 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

/// Draw `count` Laplace samples calibrated to `sensitivity / epsilon`
/// from the process-default OS entropy source.
///
/// # Example
/// ```
/// let noise = dp_noise::generate_noise(1.0, 1.0, 2)?;
/// assert_eq!(noise.len(), 2);
/// # Ok::<(), dp_noise::NoiseError>(())
/// ```
pub fn generate_noise(sensitivity: f64, epsilon: f64, count: usize) -> Result<Vec<f64>, NoiseError> {
    generate_noise_with(&mut OsEntropy, sensitivity, epsilon, count)
}

/// Draw `count` Laplace samples calibrated to `sensitivity / epsilon`
/// from an injected source.
///
/// Parameters are validated before any entropy is consumed.
///
/// # Errors
/// - `InvalidParameter`: sensitivity or epsilon non-positive or non-finite,
///   non-finite scale, or `count == 0`
/// - `RandomSourceFailure`: the source failed or produced a bad draw
pub fn generate_noise_with<S: RandomSource + ?Sized>(
    source: &mut S,
    sensitivity: f64,
    epsilon: f64,
    count: usize,
) -> Result<Vec<f64>, NoiseError> {
    let params = LaplaceParams::new(sensitivity, epsilon)?;
    params.sample_n(source, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedSource, SeededSource};

    #[test]
    fn test_canonical_draw() {
        // Uniform draw 0.75 is the centered draw u = 0.25
        let mut source = ScriptedSource::new(vec![0.75]);
        let noise = generate_noise_with(&mut source, 1.0, 1.0, 1).unwrap();
        assert_eq!(noise.len(), 1);
        assert_eq!(noise[0], -(0.5_f64).ln());
        assert!((noise[0] - 0.6931).abs() < 1e-4);
    }

    #[test]
    fn test_negative_half_mirrors_positive() {
        let mut source = ScriptedSource::new(vec![0.75, 0.25]);
        let noise = generate_noise_with(&mut source, 2.0, 0.5, 2).unwrap();
        assert_eq!(noise[0], -noise[1]);
        assert!(noise[0] > 0.0);
    }

    #[test]
    fn test_midpoint_draw_is_zero_noise() {
        let mut source = ScriptedSource::new(vec![0.5]);
        let noise = generate_noise_with(&mut source, 1.0, 1.0, 1).unwrap();
        assert_eq!(noise[0], 0.0);
    }

    #[test]
    fn test_sensitivity_scales_noise_exactly() {
        let draws = vec![0.1, 0.3, 0.6, 0.95];
        let base = generate_noise_with(&mut ScriptedSource::new(draws.clone()), 1.0, 1.0, 4).unwrap();
        let tenfold = generate_noise_with(&mut ScriptedSource::new(draws), 10.0, 1.0, 4).unwrap();

        for (b, t) in base.iter().zip(&tenfold) {
            assert!((t - 10.0 * b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let cases = [
            (0.0, 1.0, 1),
            (-1.0, 1.0, 1),
            (f64::NAN, 1.0, 1),
            (f64::INFINITY, 1.0, 1),
            (1.0, 0.0, 1),
            (1.0, -0.5, 1),
            (1.0, f64::NAN, 1),
            (1.0, f64::INFINITY, 1),
            (1.0, 1.0, 0),
            (1e300, 1e-300, 1),
            (1e308, 1.0, 1),
        ];

        for (sensitivity, epsilon, count) in cases {
            let mut source = ScriptedSource::new(vec![0.75]);
            let err = generate_noise_with(&mut source, sensitivity, epsilon, count).unwrap_err();
            assert!(
                err.is_invalid_parameter(),
                "expected InvalidParameter for ({}, {}, {}), got {:?}",
                sensitivity,
                epsilon,
                count,
                err
            );
            // Nothing drawn
            assert_eq!(source.remaining(), 1);
        }
    }

    #[test]
    fn test_exhausted_source_yields_no_samples() {
        let mut source = ScriptedSource::new(vec![0.75, 0.25]);
        let err = generate_noise_with(&mut source, 1.0, 1.0, 3).unwrap_err();
        assert!(err.is_source_failure());
    }

    #[test]
    fn test_out_of_range_draws_rejected() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN, f64::INFINITY] {
            let mut source = ScriptedSource::new(vec![bad]);
            let err = generate_noise_with(&mut source, 1.0, 1.0, 1).unwrap_err();
            assert!(err.is_source_failure(), "draw {} should be rejected", bad);
        }
    }

    #[test]
    fn test_boundary_rounding_rejected() {
        // Smallest subnormal: x - 0.5 rounds to exactly -0.5
        let mut source = ScriptedSource::new(vec![f64::from_bits(1)]);
        let err = generate_noise_with(&mut source, 1.0, 1.0, 1).unwrap_err();
        assert!(err.is_source_failure());
    }

    #[test]
    fn test_extreme_valid_draws_are_finite() {
        let eps = 1.0 / (1u64 << 53) as f64;
        let mut source = ScriptedSource::new(vec![eps, 1.0 - eps]);
        let noise = generate_noise_with(&mut source, 1.0, 1.0, 2).unwrap();
        assert!(noise.iter().all(|n| n.is_finite()));
        assert!(noise[0] < -30.0);
        assert!(noise[1] > 30.0);
    }

    #[test]
    fn test_seeded_reproducible() {
        let a = generate_noise_with(&mut SeededSource::from_seed_u64(42), 1.0, 0.1, 50).unwrap();
        let b = generate_noise_with(&mut SeededSource::from_seed_u64(42), 1.0, 0.1, 50).unwrap();
        let a_bits: Vec<u64> = a.iter().map(|x| x.to_bits()).collect();
        let b_bits: Vec<u64> = b.iter().map(|x| x.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn test_default_source_produces_values() {
        let noise = generate_noise(1.0, 1.0, 5).unwrap();
        assert_eq!(noise.len(), 5);
        assert!(noise.iter().all(|n| n.is_finite()));
    }

    #[test]
    fn test_variance_calculation() {
        let params = LaplaceParams::new(1.0, 0.1).unwrap();
        // Var = 2 * (1/0.1)² = 200
        assert!((params.variance() - 200.0).abs() < 1e-10);
        assert!((params.std_dev() - 200.0_f64.sqrt()).abs() < 1e-10);
        assert!((params.expected_magnitude() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_interval_95() {
        let params = LaplaceParams::new(1.0, 1.0).unwrap();
        let half_width = params.confidence_interval(0.95).unwrap();
        assert!((half_width - 20.0_f64.ln()).abs() < 1e-12);
        assert!((params.cdf(half_width) - params.cdf(-half_width) - 0.95).abs() < 1e-12);
        assert!(params.confidence_interval(1.0).is_err());
    }

    #[test]
    fn test_cdf_shape() {
        assert_eq!(laplace_cdf(0.0, 1.0), 0.5);
        assert!((laplace_cdf(1.0, 1.0) - (1.0 - 0.5 * (-1.0_f64).exp())).abs() < 1e-15);
        assert!((laplace_cdf(-1.0, 1.0) - 0.5 * (-1.0_f64).exp()).abs() < 1e-15);
        assert!(laplace_cdf(1.0, 0.0).is_nan());
    }

    #[test]
    fn test_sample_mean_approximately_zero() {
        let params = LaplaceParams::new(1.0, 1.0).unwrap();
        let n = 10000;
        let samples = params.sample_n(&mut SeededSource::from_seed_u64(3), n).unwrap();
        let mean = samples.iter().sum::<f64>() / n as f64;

        // Within 4 standard errors: SE = sqrt(2)/sqrt(n)
        let se = params.std_dev() / (n as f64).sqrt();
        assert!(mean.abs() < 4.0 * se, "Mean {} too far from 0", mean);
    }

    #[test]
    fn test_params_serde_validates() {
        let params = LaplaceParams::new(2.0, 0.5).unwrap();
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"sensitivity":2.0,"epsilon":0.5}"#);

        let back: LaplaceParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
        assert_eq!(back.scale(), 4.0);

        let bad: Result<LaplaceParams, _> =
            serde_json::from_str(r#"{"sensitivity":1.0,"epsilon":0.0}"#);
        assert!(bad.is_err());
    }
}
