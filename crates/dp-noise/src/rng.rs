//! Injectable Random Sources
//!
//! The noise generator never reaches for ambient global randomness. Every
//! draw goes through a [`RandomSource`] handed in by the caller, so entropy
//! consumption can be isolated per caller and tests can substitute a
//! deterministic stub.
//!
//! # Sources
//!
//! | Source           | State     | Concurrency                         |
//! |------------------|-----------|-------------------------------------|
//! | `OsEntropy`      | none      | `Send + Sync`, share freely         |
//! | `SeededSource`   | ChaCha20  | `Send`, one handle per thread       |
//! | `RngSource<R>`   | `R`       | whatever `R` is                     |
//! | `ScriptedSource` | draw list | `Send`, one handle per thread       |
//!
//! Stateful sources take `&mut self`, so the compiler rejects unsynchronized
//! sharing between threads.
//!
//! # Uniform Construction
//!
//! Sources built on raw bits keep the top 53 bits (the f64 mantissa
//! precision) and divide by 2^53. A zero draw is rejected and redrawn, so
//! every value lies in the open interval (0, 1) and is an exact multiple of
//! 2^-53.

use crate::error::NoiseError;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::warn;

const MANTISSA_SCALE: f64 = (1u64 << 53) as f64;

/// Capability to draw uniform values in the open interval (0, 1)
pub trait RandomSource {
    /// Draw one value strictly between 0 and 1
    fn next_uniform(&mut self) -> Result<f64, NoiseError>;
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn next_uniform(&mut self) -> Result<f64, NoiseError> {
        (**self).next_uniform()
    }
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    fn next_uniform(&mut self) -> Result<f64, NoiseError> {
        (**self).next_uniform()
    }
}

/// Map 64 random bits to (0, 1), or `None` when the top 53 bits are zero
fn bits_to_open_unit(bits: u64) -> Option<f64> {
    let mantissa = bits >> 11;
    if mantissa == 0 {
        None
    } else {
        Some(mantissa as f64 / MANTISSA_SCALE)
    }
}

/// Process-default source reading the OS CSPRNG via `getrandom`
///
/// Holds no state; any number of threads may draw from it concurrently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OsEntropy;

impl OsEntropy {
    /// Fill a buffer with OS entropy
    pub fn fill_bytes(buffer: &mut [u8]) -> Result<(), NoiseError> {
        getrandom::fill(buffer).map_err(|e| {
            warn!(error = %e, "OS entropy source failed");
            NoiseError::source_failure(format!("failed to read OS entropy: {}", e))
        })
    }

    /// Draw a random u64 from OS entropy
    pub fn random_u64() -> Result<u64, NoiseError> {
        let mut bytes = [0u8; 8];
        Self::fill_bytes(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }
}

impl RandomSource for OsEntropy {
    fn next_uniform(&mut self) -> Result<f64, NoiseError> {
        loop {
            if let Some(u) = bits_to_open_unit(Self::random_u64()?) {
                return Ok(u);
            }
        }
    }
}

/// Adapter turning any `rand` generator into a [`RandomSource`]
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Recover the wrapped generator
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: RngCore> RandomSource for RngSource<R> {
    fn next_uniform(&mut self) -> Result<f64, NoiseError> {
        loop {
            let mut bytes = [0u8; 8];
            self.rng.try_fill_bytes(&mut bytes).map_err(|e| {
                warn!(error = %e, "wrapped generator failed");
                NoiseError::source_failure(format!("generator failed: {}", e))
            })?;
            if let Some(u) = bits_to_open_unit(u64::from_le_bytes(bytes)) {
                return Ok(u);
            }
        }
    }
}

/// Deterministic ChaCha20 source for reproducible runs
///
/// The same seed yields a bit-identical sequence of draws on every
/// platform. A seeded source gives no privacy: anyone holding the seed can
/// subtract the noise. Use it for tests and audits, never for releases.
pub type SeededSource = RngSource<ChaCha20Rng>;

impl RngSource<ChaCha20Rng> {
    /// Seed from a single u64
    pub fn from_seed_u64(seed: u64) -> Self {
        Self::new(ChaCha20Rng::seed_from_u64(seed))
    }

    /// Seed from 32 raw bytes
    pub fn from_seed_bytes(seed: [u8; 32]) -> Self {
        Self::new(ChaCha20Rng::from_seed(seed))
    }

    /// Fresh ChaCha20 stream keyed from OS entropy
    pub fn from_os_entropy() -> Result<Self, NoiseError> {
        let mut seed = [0u8; 32];
        OsEntropy::fill_bytes(&mut seed)?;
        Ok(Self::from_seed_bytes(seed))
    }
}

/// Replays a fixed list of uniform draws, then fails
///
/// Test double for pinning the sampler to known inputs. Once the list is
/// exhausted every further draw is a `RandomSourceFailure`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    position: usize,
}

impl ScriptedSource {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            position: 0,
        }
    }

    /// Draws not yet consumed
    pub fn remaining(&self) -> usize {
        self.draws.len() - self.position
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> Result<f64, NoiseError> {
        match self.draws.get(self.position) {
            Some(&u) => {
                self.position += 1;
                Ok(u)
            }
            None => Err(NoiseError::source_failure(format!(
                "scripted source exhausted after {} draws",
                self.draws.len()
            ))),
        }
    }
}
