//! Feature-map encoding: classical vectors to parameterized circuit descriptions.
//!
//! The encoder maps a bounded feature vector to a ZZ-feature-map circuit
//! description: per repetition, a Hadamard layer, one phase rotation per
//! component, and one pairwise coupling phase per connected pair under the
//! chosen entanglement topology. The description is plain data; evaluation
//! backends interpret it, the encoder never touches a simulator.
//!
//! Encoding is deterministic and side-effect free: identical input and
//! configuration always produce an identical description.

use crate::error::{EntrelazarError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Hardware-imposed ceiling on the number of encoding slots (qubits).
///
/// Statevector cost is 2^d, and near-term devices top out around this
/// width, so the ceiling is part of the public contract rather than an
/// internal detail.
pub const MAX_QUBITS: usize = 20;

/// Pairwise coupling topology between encoding slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entanglement {
    /// Every pair (i, j) with i < j is coupled.
    Full,
    /// Neighboring pairs (i, i+1) only.
    Linear,
    /// Linear plus the wrap-around pair (d-1, 0).
    Circular,
}

/// Configuration of the feature-map encoder.
///
/// A trained model carries its exact `EncoderConfig`; scoring must rebuild
/// kernels with the identical encoding or the decision function is
/// meaningless.
///
/// # Examples
///
/// ```
/// use entrelazar::encoding::{EncoderConfig, Entanglement};
///
/// let config = EncoderConfig::new()
///     .with_reps(2)
///     .with_entanglement(Entanglement::Full);
/// assert_eq!(config.reps, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Number of feature-map repetitions (R ≥ 1).
    pub reps: usize,
    /// Coupling topology.
    pub entanglement: Entanglement,
}

impl EncoderConfig {
    /// Creates the default configuration: 2 repetitions, full entanglement.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reps: 2,
            entanglement: Entanglement::Full,
        }
    }

    /// Sets the repetition count.
    #[must_use]
    pub fn with_reps(mut self, reps: usize) -> Self {
        self.reps = reps;
        self
    }

    /// Sets the entanglement topology.
    #[must_use]
    pub fn with_entanglement(mut self, entanglement: Entanglement) -> Self {
        self.entanglement = entanglement;
        self
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One repetition of the feature map.
///
/// `rotations[i]` is the phase angle applied to slot i after the Hadamard
/// layer; `couplings` holds `(a, b, angle)` entries for each connected
/// pair, applied as a relative phase on basis states where slots a and b
/// disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingLayer {
    /// Per-slot rotation angles.
    pub rotations: Vec<f64>,
    /// Pairwise coupling angles as (slot_a, slot_b, angle).
    pub couplings: Vec<(usize, usize, f64)>,
}

/// Deterministic, plain-data description of an encoding circuit.
///
/// Two descriptions compare equal exactly when they would prepare the same
/// state, which is what makes encode determinism testable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingDescription {
    /// Number of encoding slots (qubits).
    pub n_qubits: usize,
    /// One layer per repetition.
    pub layers: Vec<EncodingLayer>,
}

/// Returns the coupled pairs for a topology over `d` slots.
///
/// For `d <= 2`, circular degenerates to linear: the wrap-around pair
/// (1, 0) would duplicate (0, 1).
fn coupled_pairs(d: usize, entanglement: Entanglement) -> Vec<(usize, usize)> {
    match entanglement {
        Entanglement::Full => {
            let mut pairs = Vec::with_capacity(d * (d.saturating_sub(1)) / 2);
            for i in 0..d {
                for j in (i + 1)..d {
                    pairs.push((i, j));
                }
            }
            pairs
        }
        Entanglement::Linear => (0..d.saturating_sub(1)).map(|i| (i, i + 1)).collect(),
        Entanglement::Circular => {
            let mut pairs: Vec<(usize, usize)> =
                (0..d.saturating_sub(1)).map(|i| (i, i + 1)).collect();
            if d > 2 {
                pairs.push((d - 1, 0));
            }
            pairs
        }
    }
}

/// Encodes a feature vector into a circuit description.
///
/// Rotation angles follow the ZZ-feature-map convention: `2·x_i` per slot,
/// and `2·(π − x_a)·(π − x_b)` per coupled pair, so the coupling term
/// injects feature-interaction information into the encoding. Components
/// are expected pre-scaled into `[0, π]` upstream (see
/// [`crate::preprocessing::AngleScaler`]); wider ranges wrap in phase and
/// alias distinct inputs onto the same encoding.
///
/// # Errors
///
/// Returns [`EntrelazarError::Configuration`] if the dimension is 0 or
/// exceeds [`MAX_QUBITS`], or if `reps` is 0.
///
/// # Examples
///
/// ```
/// use entrelazar::encoding::{encode, EncoderConfig, Entanglement};
///
/// let config = EncoderConfig::new().with_reps(1).with_entanglement(Entanglement::Linear);
/// let desc = encode(&[0.5, 1.2], &config).unwrap();
/// assert_eq!(desc.n_qubits, 2);
/// assert_eq!(desc.layers.len(), 1);
/// assert_eq!(desc.layers[0].rotations, vec![1.0, 2.4]);
/// ```
pub fn encode(x: &[f64], config: &EncoderConfig) -> Result<EncodingDescription> {
    let d = x.len();
    if d == 0 || d > MAX_QUBITS {
        return Err(EntrelazarError::config(
            "n_features",
            d,
            "between 1 and 20 encoding slots",
        ));
    }
    if config.reps == 0 {
        return Err(EntrelazarError::config("reps", config.reps, "at least 1"));
    }

    let pairs = coupled_pairs(d, config.entanglement);
    let layer = EncodingLayer {
        rotations: x.iter().map(|&xi| 2.0 * xi).collect(),
        couplings: pairs
            .iter()
            .map(|&(a, b)| (a, b, 2.0 * (PI - x[a]) * (PI - x[b])))
            .collect(),
    };

    // Every repetition applies the same angles; layers are cloned rather
    // than shared so the description stays a self-contained value.
    Ok(EncodingDescription {
        n_qubits: d,
        layers: vec![layer; config.reps],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_deterministic() {
        let config = EncoderConfig::new();
        let x = [0.3, 1.7, 2.9];
        let a = encode(&x, &config).expect("valid input");
        let b = encode(&x, &config).expect("valid input");
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_rotation_angles() {
        let config = EncoderConfig::new().with_reps(1);
        let desc = encode(&[0.5, 1.0], &config).expect("valid input");
        assert_eq!(desc.layers[0].rotations, vec![1.0, 2.0]);
    }

    #[test]
    fn test_encode_coupling_angle_product_form() {
        let config = EncoderConfig::new()
            .with_reps(1)
            .with_entanglement(Entanglement::Linear);
        let desc = encode(&[0.5, 1.0], &config).expect("valid input");
        let (a, b, angle) = desc.layers[0].couplings[0];
        assert_eq!((a, b), (0, 1));
        let expected = 2.0 * (PI - 0.5) * (PI - 1.0);
        assert!((angle - expected).abs() < 1e-12);
    }

    #[test]
    fn test_encode_reps_layers() {
        let config = EncoderConfig::new().with_reps(3);
        let desc = encode(&[0.1, 0.2], &config).expect("valid input");
        assert_eq!(desc.layers.len(), 3);
        assert_eq!(desc.layers[0], desc.layers[2]);
    }

    #[test]
    fn test_encode_dimension_zero_rejected() {
        let result = encode(&[], &EncoderConfig::new());
        assert!(matches!(
            result,
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_encode_dimension_over_ceiling_rejected() {
        let x = vec![0.0; MAX_QUBITS + 1];
        let result = encode(&x, &EncoderConfig::new());
        assert!(matches!(
            result,
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_encode_zero_reps_rejected() {
        let config = EncoderConfig::new().with_reps(0);
        let result = encode(&[0.1], &config);
        assert!(matches!(
            result,
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_full_pairs() {
        let pairs = coupled_pairs(4, Entanglement::Full);
        assert_eq!(pairs.len(), 6);
        assert!(pairs.contains(&(0, 3)));
        assert!(pairs.contains(&(1, 2)));
    }

    #[test]
    fn test_linear_pairs() {
        let pairs = coupled_pairs(4, Entanglement::Linear);
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_circular_pairs_wrap() {
        let pairs = coupled_pairs(4, Entanglement::Circular);
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);
    }

    #[test]
    fn test_circular_degenerates_for_two_slots() {
        // (1, 0) would duplicate (0, 1) as a coupling.
        let pairs = coupled_pairs(2, Entanglement::Circular);
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_single_slot_has_no_pairs() {
        for ent in [Entanglement::Full, Entanglement::Linear, Entanglement::Circular] {
            assert!(coupled_pairs(1, ent).is_empty());
        }
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = EncoderConfig::new()
            .with_reps(3)
            .with_entanglement(Entanglement::Circular);
        let json = serde_json::to_string(&config).expect("serialize");
        let back: EncoderConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(config, back);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_encode_is_deterministic(
                xs in proptest::collection::vec(0.0f64..std::f64::consts::TAU, 1..=8),
                reps in 1usize..4,
            ) {
                let config = EncoderConfig::new().with_reps(reps);
                let a = encode(&xs, &config).expect("valid");
                let b = encode(&xs, &config).expect("valid");
                prop_assert_eq!(a, b);
            }

            #[test]
            fn prop_layer_shape_matches_topology(
                xs in proptest::collection::vec(0.0f64..1.0, 2..=6),
            ) {
                let d = xs.len();
                let config = EncoderConfig::new()
                    .with_reps(1)
                    .with_entanglement(Entanglement::Full);
                let desc = encode(&xs, &config).expect("valid");
                prop_assert_eq!(desc.layers[0].rotations.len(), d);
                prop_assert_eq!(desc.layers[0].couplings.len(), d * (d - 1) / 2);
            }
        }
    }
}
