//! Evaluation backends for encoding-pair similarity.
//!
//! A backend turns pairs of [`EncodingDescription`]s into squared-overlap
//! similarities in [0, 1]. The kernel engine receives a backend instance at
//! construction (explicit dependency injection — there is deliberately no
//! process-wide client), which is also what makes the engine testable with
//! deterministic doubles.
//!
//! Two backends ship with the crate:
//!
//! - [`StatevectorBackend`]: exact analytic evaluation by dense state
//!   simulation. Deterministic; diagonal entries are exactly 1.
//! - [`SampledBackend`]: finite-sample ("shots") estimation with a seeded
//!   RNG; entries carry sampling noise and the diagonal is only ≈1.
//!
//! A remote execution provider plugs in by implementing
//! [`EvaluationBackend`] for its client handle: `evaluate_batch` submits
//! the batch and blocks on the provider's poll loop. Credential and queue
//! management belong to that client, not to this crate.

mod sampled;
mod statevector;

pub use sampled::SampledBackend;
pub use statevector::StatevectorBackend;

use crate::encoding::EncodingDescription;
use crate::error::Result;

/// A borrowed pair of encodings to be compared.
#[derive(Debug, Clone, Copy)]
pub struct EncodingPair<'a> {
    /// Left encoding.
    pub left: &'a EncodingDescription,
    /// Right encoding.
    pub right: &'a EncodingDescription,
}

/// Capability for evaluating batches of encoding-pair similarities.
///
/// Independent pairwise evaluations are submitted as one batch because
/// backend round-trips dominate latency; implementations are free to
/// parallelize internally as long as result order matches input order.
pub trait EvaluationBackend {
    /// Human-readable backend name, used in error context.
    fn name(&self) -> &str;

    /// Evaluates every pair in the batch, returning one similarity in
    /// [0, 1] per pair, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EntrelazarError::DataShape`] if a pair's
    /// encodings disagree on qubit count, or
    /// [`crate::error::EntrelazarError::BackendUnavailable`] on transient
    /// evaluation failure (the kernel engine retries the latter).
    fn evaluate_batch(&self, pairs: &[EncodingPair<'_>]) -> Result<Vec<f64>>;
}
