//! Laplace Mechanism for Differential Privacy
//!
//! Provides a hardened noise generator for releasing numeric aggregates
//! (counts, sums, totals) under ε-differential privacy:
//! - Upfront validation of sensitivity, epsilon and sample count
//! - Inverse-CDF Laplace sampling with boundary-safe uniform draws
//! - Injectable random sources (OS entropy, seeded ChaCha20, scripted draws)
//! - Release helpers that add one independent sample per true aggregate
//!
//! # Mathematical Guarantee
//!
//! For a query f with L1 sensitivity Δf and any two neighboring datasets D
//! and D' (differing by one record), the mechanism
//!
//! ```text
//! M(D) = f(D) + Lap(0, Δf/ε)
//! ```
//!
//! satisfies P[M(D) ∈ S] ≤ e^ε · P[M(D') ∈ S] for every output set S.
//!
//! Privacy accounting across several releases (per-group counts, repeated
//! queries) is the caller's responsibility: every call here is independent
//! and nothing is tracked between calls.
//!
//! # Example
//!
//! ```
//! use dp_noise::{generate_noise_with, release, LaplaceParams, SeededSource};
//!
//! let mut source = SeededSource::from_seed_u64(7);
//!
//! // Three independent draws for a count query (sensitivity = 1) at ε = 0.5
//! let noise = generate_noise_with(&mut source, 1.0, 0.5, 3)?;
//! assert_eq!(noise.len(), 3);
//!
//! // Release a single total
//! let params = LaplaceParams::new(1.0, 0.5)?;
//! let noisy_total = release(1_250.0, &params, &mut source)?;
//! assert!(noisy_total.is_finite());
//! # Ok::<(), dp_noise::NoiseError>(())
//! ```

pub mod config;
pub mod error;
pub mod laplace;
pub mod release;
pub mod rng;
pub mod validation;

// Re-export commonly used items
pub use config::NoiseConfig;
pub use error::NoiseError;
pub use laplace::{generate_noise, generate_noise_with, laplace_cdf, LaplaceParams};
pub use release::{release, release_all};
pub use rng::{OsEntropy, RandomSource, RngSource, ScriptedSource, SeededSource};
