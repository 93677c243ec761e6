//! Exact fidelity evaluation by dense statevector simulation.

use super::{EncodingPair, EvaluationBackend};
use crate::encoding::EncodingDescription;
use crate::error::{EntrelazarError, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Dense statevector over n qubits, split into real and imaginary parts.
///
/// The feature-map circuit only needs two primitives: a Hadamard on one
/// qubit and diagonal phase gates, so the simulator implements exactly
/// those.
#[derive(Debug, Clone)]
struct Statevector {
    n_qubits: usize,
    re: Vec<f64>,
    im: Vec<f64>,
}

impl Statevector {
    /// |0...0⟩ over n qubits.
    fn zero_state(n_qubits: usize) -> Self {
        let dim = 1usize << n_qubits;
        let mut re = vec![0.0; dim];
        re[0] = 1.0;
        Self {
            n_qubits,
            re,
            im: vec![0.0; dim],
        }
    }

    /// Hadamard on qubit q.
    fn hadamard(&mut self, q: usize) {
        let mask = 1usize << q;
        for i in 0..self.re.len() {
            if i & mask == 0 {
                let j = i | mask;
                let (ar, ai) = (self.re[i], self.im[i]);
                let (br, bi) = (self.re[j], self.im[j]);
                self.re[i] = (ar + br) * FRAC_1_SQRT_2;
                self.im[i] = (ai + bi) * FRAC_1_SQRT_2;
                self.re[j] = (ar - br) * FRAC_1_SQRT_2;
                self.im[j] = (ai - bi) * FRAC_1_SQRT_2;
            }
        }
    }

    /// Phase e^{iθ} on basis states where qubit q is 1.
    fn phase_on_bit(&mut self, q: usize, theta: f64) {
        let mask = 1usize << q;
        let (sin, cos) = theta.sin_cos();
        for i in 0..self.re.len() {
            if i & mask != 0 {
                let (r, m) = (self.re[i], self.im[i]);
                self.re[i] = r * cos - m * sin;
                self.im[i] = r * sin + m * cos;
            }
        }
    }

    /// Phase e^{iθ} on basis states where qubits a and b disagree.
    ///
    /// This is the CX–P(θ)–CX sandwich of the ZZ feature map reduced to
    /// its diagonal action.
    fn phase_on_parity(&mut self, a: usize, b: usize, theta: f64) {
        let mask_a = 1usize << a;
        let mask_b = 1usize << b;
        let (sin, cos) = theta.sin_cos();
        for i in 0..self.re.len() {
            let bit_a = i & mask_a != 0;
            let bit_b = i & mask_b != 0;
            if bit_a != bit_b {
                let (r, m) = (self.re[i], self.im[i]);
                self.re[i] = r * cos - m * sin;
                self.im[i] = r * sin + m * cos;
            }
        }
    }

    /// Prepares φ(x) = U(x)|0⟩ from a circuit description.
    fn prepare(desc: &EncodingDescription) -> Self {
        let mut state = Self::zero_state(desc.n_qubits);
        for layer in &desc.layers {
            for q in 0..state.n_qubits {
                state.hadamard(q);
            }
            for (q, &theta) in layer.rotations.iter().enumerate() {
                state.phase_on_bit(q, theta);
            }
            for &(a, b, theta) in &layer.couplings {
                state.phase_on_parity(a, b, theta);
            }
        }
        state
    }

    /// Squared overlap |⟨self|other⟩|².
    fn fidelity(&self, other: &Self) -> f64 {
        let mut dot_re = 0.0;
        let mut dot_im = 0.0;
        for i in 0..self.re.len() {
            // conj(a) * b
            dot_re += self.re[i] * other.re[i] + self.im[i] * other.im[i];
            dot_im += self.re[i] * other.im[i] - self.im[i] * other.re[i];
        }
        dot_re * dot_re + dot_im * dot_im
    }
}

/// Exact analytic evaluation backend.
///
/// Prepares both encoded states on a dense statevector and returns the
/// squared overlap. Fully deterministic: re-running a pipeline against
/// this backend reproduces every kernel entry bit for bit.
///
/// # Examples
///
/// ```
/// use entrelazar::backend::{EncodingPair, EvaluationBackend, StatevectorBackend};
/// use entrelazar::encoding::{encode, EncoderConfig};
///
/// let config = EncoderConfig::new();
/// let a = encode(&[0.4, 1.1], &config).unwrap();
/// let backend = StatevectorBackend::new();
/// let sims = backend
///     .evaluate_batch(&[EncodingPair { left: &a, right: &a }])
///     .unwrap();
/// assert!((sims[0] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatevectorBackend;

impl StatevectorBackend {
    /// Creates a new exact backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn pair_fidelity(pair: &EncodingPair<'_>) -> Result<f64> {
        if pair.left.n_qubits != pair.right.n_qubits {
            return Err(EntrelazarError::shape_mismatch(
                "pair fidelity",
                format!("{} qubits", pair.left.n_qubits),
                format!("{} qubits", pair.right.n_qubits),
            ));
        }
        let left = Statevector::prepare(pair.left);
        let right = Statevector::prepare(pair.right);
        Ok(left.fidelity(&right))
    }
}

impl EvaluationBackend for StatevectorBackend {
    fn name(&self) -> &str {
        "statevector"
    }

    #[cfg(feature = "parallel")]
    fn evaluate_batch(&self, pairs: &[EncodingPair<'_>]) -> Result<Vec<f64>> {
        // Pairs are independent; each worker owns its output slot.
        pairs.par_iter().map(Self::pair_fidelity).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_batch(&self, pairs: &[EncodingPair<'_>]) -> Result<Vec<f64>> {
        pairs.iter().map(Self::pair_fidelity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{encode, EncoderConfig, Entanglement};

    fn pair<'a>(
        a: &'a EncodingDescription,
        b: &'a EncodingDescription,
    ) -> EncodingPair<'a> {
        EncodingPair { left: a, right: b }
    }

    #[test]
    fn test_zero_state_normalized() {
        let s = Statevector::zero_state(3);
        let norm: f64 = s
            .re
            .iter()
            .zip(s.im.iter())
            .map(|(r, m)| r * r + m * m)
            .sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hadamard_uniform_superposition() {
        let mut s = Statevector::zero_state(2);
        s.hadamard(0);
        s.hadamard(1);
        for r in &s.re {
            assert!((r - 0.5).abs() < 1e-12);
        }
        for m in &s.im {
            assert!(m.abs() < 1e-12);
        }
    }

    #[test]
    fn test_phase_preserves_norm() {
        let mut s = Statevector::zero_state(2);
        s.hadamard(0);
        s.hadamard(1);
        s.phase_on_bit(0, 1.234);
        s.phase_on_parity(0, 1, 0.777);
        let norm: f64 = s
            .re
            .iter()
            .zip(s.im.iter())
            .map(|(r, m)| r * r + m * m)
            .sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_self_fidelity_is_exactly_one() {
        let config = EncoderConfig::new().with_reps(2);
        let desc = encode(&[0.3, 1.9, 2.2], &config).expect("valid");
        let backend = StatevectorBackend::new();
        let sims = backend
            .evaluate_batch(&[pair(&desc, &desc)])
            .expect("evaluate");
        assert!((sims[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fidelity_symmetric_and_in_range() {
        let config = EncoderConfig::new()
            .with_reps(2)
            .with_entanglement(Entanglement::Circular);
        let a = encode(&[0.1, 2.0, 1.5], &config).expect("valid");
        let b = encode(&[1.2, 0.4, 2.8], &config).expect("valid");
        let backend = StatevectorBackend::new();
        let sims = backend
            .evaluate_batch(&[pair(&a, &b), pair(&b, &a)])
            .expect("evaluate");
        assert!((sims[0] - sims[1]).abs() < 1e-12);
        assert!(sims[0] >= 0.0 && sims[0] <= 1.0 + 1e-12);
    }

    #[test]
    fn test_qubit_mismatch_rejected() {
        let config = EncoderConfig::new();
        let a = encode(&[0.1, 0.2], &config).expect("valid");
        let b = encode(&[0.1, 0.2, 0.3], &config).expect("valid");
        let backend = StatevectorBackend::new();
        let result = backend.evaluate_batch(&[pair(&a, &b)]);
        assert!(matches!(
            result,
            Err(crate::error::EntrelazarError::DataShape { .. })
        ));
    }

    #[test]
    fn test_hand_computed_fidelity_two_qubits_linear() {
        // d = 2, reps = 1, linear entanglement. After H⊗H every basis
        // amplitude is 1/2 times a pure phase:
        //   θ(b1 b0) = 2 x0 b0 + 2 x1 b1 + 2 (π − x0)(π − x1) (b0 ⊕ b1)
        // so ⟨φ(y)|φ(x)⟩ = 1/4 Σ_b e^{i (θx(b) − θy(b))}.
        let x = [0.7, 1.3];
        let y = [2.1, 0.4];
        use std::f64::consts::PI;
        let theta = |v: &[f64], b0: f64, b1: f64| -> f64 {
            2.0 * v[0] * b0
                + 2.0 * v[1] * b1
                + 2.0 * (PI - v[0]) * (PI - v[1]) * ((b0 + b1) % 2.0)
        };
        let mut sum_re = 0.0;
        let mut sum_im = 0.0;
        for (b0, b1) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            let delta = theta(&x, b0, b1) - theta(&y, b0, b1);
            sum_re += delta.cos();
            sum_im += delta.sin();
        }
        let expected = (sum_re * sum_re + sum_im * sum_im) / 16.0;

        let config = EncoderConfig::new()
            .with_reps(1)
            .with_entanglement(Entanglement::Linear);
        let dx = encode(&x, &config).expect("valid");
        let dy = encode(&y, &config).expect("valid");
        let backend = StatevectorBackend::new();
        let sims = backend.evaluate_batch(&[pair(&dx, &dy)]).expect("evaluate");
        assert!(
            (sims[0] - expected).abs() < 1e-9,
            "engine {} vs hand-computed {}",
            sims[0],
            expected
        );
    }
}
