//! Finite-sample ("shots") fidelity estimation.

use super::{EncodingPair, EvaluationBackend, StatevectorBackend};
use crate::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// Sample-based evaluation backend.
///
/// Models a shot-limited device running the compute–uncompute overlap
/// test: the circuit U(y)†U(x) measures all-zeros with probability equal
/// to the pair fidelity, and the estimate is the all-zeros frequency over
/// a fixed number of shots. Entries therefore carry binomial sampling
/// noise with standard deviation √(p(1−p)/shots), and the diagonal is
/// only approximately 1.
///
/// The RNG is seeded, so a given backend configuration reproduces the
/// same noisy estimates run to run.
///
/// # Examples
///
/// ```
/// use entrelazar::backend::{EncodingPair, EvaluationBackend, SampledBackend};
/// use entrelazar::encoding::{encode, EncoderConfig};
///
/// let config = EncoderConfig::new();
/// let a = encode(&[0.4, 1.1], &config).unwrap();
/// let backend = SampledBackend::new(4096, 7);
/// let sims = backend
///     .evaluate_batch(&[EncodingPair { left: &a, right: &a }])
///     .unwrap();
/// assert!((sims[0] - 1.0).abs() < 0.05);
/// ```
#[derive(Debug)]
pub struct SampledBackend {
    shots: u32,
    rng: RefCell<StdRng>,
}

impl SampledBackend {
    /// Creates a sampled backend with the given shot count and RNG seed.
    ///
    /// # Panics
    ///
    /// Panics if `shots` is 0.
    #[must_use]
    pub fn new(shots: u32, seed: u64) -> Self {
        assert!(shots > 0, "shots must be at least 1");
        Self {
            shots,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Shots per entry.
    #[must_use]
    pub fn shots(&self) -> u32 {
        self.shots
    }
}

impl EvaluationBackend for SampledBackend {
    fn name(&self) -> &str {
        "sampled"
    }

    fn evaluate_batch(&self, pairs: &[EncodingPair<'_>]) -> Result<Vec<f64>> {
        let mut rng = self.rng.borrow_mut();
        let mut out = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let p = StatevectorBackend::pair_fidelity(pair)?;
            let mut hits = 0u32;
            for _ in 0..self.shots {
                if rng.gen::<f64>() < p {
                    hits += 1;
                }
            }
            out.push(f64::from(hits) / f64::from(self.shots));
        }
        Ok(out)
    }
}
