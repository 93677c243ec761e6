//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use entrelazar::prelude::*;
//! ```

pub use crate::backend::{EvaluationBackend, SampledBackend, StatevectorBackend};
pub use crate::encoding::{EncoderConfig, Entanglement};
pub use crate::error::{EntrelazarError, Result};
pub use crate::kernel::{KernelConfig, KernelEngine};
pub use crate::metrics::{average_precision, best_f1_threshold, roc_auc, BinaryMetrics};
pub use crate::pipeline::QuantumClassifier;
pub use crate::primitives::{Matrix, Vector};
pub use crate::svm::{KernelSvm, TrainedModel};
