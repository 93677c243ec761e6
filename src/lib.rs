//! Entrelazar: quantum-kernel classification for imbalanced binary data.
//!
//! Entrelazar implements the quantum-kernel SVM pipeline: feature vectors
//! are encoded into parameterized circuit descriptions, an evaluation
//! backend turns encoding pairs into squared-overlap similarities, the
//! resulting kernel matrices feed a precomputed-kernel SVM, and an
//! imbalance-aware metric suite scores the result.
//!
//! # Quick Start
//!
//! ```
//! use entrelazar::prelude::*;
//!
//! // Two tight clusters, one per class.
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.5, 1.0,
//!     0.5, 1.0,
//!     4.0, 5.5,
//!     4.0, 5.5,
//! ]).unwrap();
//! let y = vec![0, 0, 1, 1];
//!
//! let mut clf = QuantumClassifier::new(
//!     StatevectorBackend::new(),
//!     EncoderConfig::new(),
//!     KernelConfig::new(),
//! );
//! clf.fit(&x, &y).unwrap();
//! assert_eq!(clf.predict(&x, 0.0).unwrap(), y);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Matrix and Vector types
//! - [`error`]: The crate-wide error taxonomy
//! - [`encoding`]: Feature-map encoder (vectors → circuit descriptions)
//! - [`backend`]: Evaluation backends (exact statevector, shot-sampled)
//! - [`kernel`]: Kernel engine (Gram/cross matrices, retry, memoization)
//! - [`svm`]: Precomputed-kernel SVM and the serializable trained model
//! - [`metrics`]: Imbalance-aware binary classification metrics
//! - [`preprocessing`]: Angle scaling and variance-based feature selection
//! - [`pipeline`]: End-to-end fit/predict/evaluate classifier

pub mod backend;
pub mod encoding;
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod svm;
