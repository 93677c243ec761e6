//! Error types for entrelazar operations.
//!
//! Every stage of the encode → kernel → train → evaluate pipeline surfaces
//! failures through [`EntrelazarError`] with enough context (stage, shapes,
//! configuration) to diagnose without re-running.

use std::fmt;

/// Main error type for entrelazar operations.
///
/// # Examples
///
/// ```
/// use entrelazar::error::EntrelazarError;
///
/// let err = EntrelazarError::DataShape {
///     context: "train kernel".to_string(),
///     expected: "200x200".to_string(),
///     actual: "200x180".to_string(),
/// };
/// assert!(err.to_string().contains("shape mismatch"));
/// ```
#[derive(Debug)]
pub enum EntrelazarError {
    /// Invalid configuration value (dimension over the qubit ceiling,
    /// unrecognized topology, non-positive regularization, ...).
    /// Fatal; never retried.
    Configuration {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Evaluation backend unavailable after exhausting the retry ceiling
    /// or the per-run duration budget.
    BackendUnavailable {
        /// Backend name (e.g. "statevector", "sampled")
        backend: String,
        /// Number of attempts made before giving up
        attempts: usize,
    },

    /// Kernel matrix violates the symmetry/PSD tolerance. Surfaced
    /// immediately; the engine's symmetrize-and-clip step is the only
    /// silent repair permitted anywhere in the pipeline.
    KernelIllConditioned {
        /// Largest observed violation
        max_violation: f64,
        /// Configured tolerance
        tolerance: f64,
    },

    /// Mismatched dimensions between pipeline stages. Indicates a caller
    /// contract violation; fatal, never retried.
    DataShape {
        /// Which stage detected the mismatch
        context: String,
        /// Expected shape description
        expected: String,
        /// Actual shape found
        actual: String,
    },

    /// The dual optimizer failed to converge, including the one retry at
    /// relaxed tolerance.
    Convergence {
        /// Number of optimization passes attempted
        passes: usize,
        /// Whether the relaxed-tolerance retry was already taken
        relaxed: bool,
    },

    /// I/O error (model save/load).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),
}

impl fmt::Display for EntrelazarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrelazarError::Configuration {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid configuration: {param} = {value}, expected {constraint}"
                )
            }
            EntrelazarError::BackendUnavailable { backend, attempts } => {
                write!(
                    f,
                    "Evaluation backend '{backend}' unavailable after {attempts} attempt(s)"
                )
            }
            EntrelazarError::KernelIllConditioned {
                max_violation,
                tolerance,
            } => {
                write!(
                    f,
                    "Kernel matrix ill-conditioned: violation {max_violation:e} exceeds tolerance {tolerance:e}"
                )
            }
            EntrelazarError::DataShape {
                context,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Data shape mismatch in {context}: expected {expected}, got {actual}"
                )
            }
            EntrelazarError::Convergence { passes, relaxed } => {
                if *relaxed {
                    write!(
                        f,
                        "Dual optimizer failed to converge after {passes} passes (relaxed tolerance retry included)"
                    )
                } else {
                    write!(f, "Dual optimizer failed to converge after {passes} passes")
                }
            }
            EntrelazarError::Io(e) => write!(f, "I/O error: {e}"),
            EntrelazarError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for EntrelazarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EntrelazarError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EntrelazarError {
    fn from(err: std::io::Error) -> Self {
        EntrelazarError::Io(err)
    }
}

impl From<serde_json::Error> for EntrelazarError {
    fn from(err: serde_json::Error) -> Self {
        EntrelazarError::Serialization(err.to_string())
    }
}

impl EntrelazarError {
    /// Create a shape mismatch error with descriptive context.
    #[must_use]
    pub fn shape_mismatch(
        context: &str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::DataShape {
            context: context.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(param: &str, value: impl fmt::Display, constraint: &str) -> Self {
        Self::Configuration {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

#[allow(clippy::cmp_owned)]
impl PartialEq<&str> for EntrelazarError {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, EntrelazarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = EntrelazarError::config("n_features", 25, "1..=20 qubits");
        assert!(err.to_string().contains("Invalid configuration"));
        assert!(err.to_string().contains("n_features"));
        assert!(err.to_string().contains("25"));
    }

    #[test]
    fn test_backend_unavailable_display() {
        let err = EntrelazarError::BackendUnavailable {
            backend: "sampled".to_string(),
            attempts: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("unavailable"));
        assert!(msg.contains("sampled"));
        assert!(msg.contains('4'));
    }

    #[test]
    fn test_kernel_ill_conditioned_display() {
        let err = EntrelazarError::KernelIllConditioned {
            max_violation: 0.05,
            tolerance: 1e-6,
        };
        let msg = err.to_string();
        assert!(msg.contains("ill-conditioned"));
    }

    #[test]
    fn test_data_shape_display() {
        let err = EntrelazarError::shape_mismatch("cross kernel", "8 columns", "5 columns");
        let msg = err.to_string();
        assert!(msg.contains("cross kernel"));
        assert!(msg.contains("8 columns"));
        assert!(msg.contains("5 columns"));
    }

    #[test]
    fn test_convergence_display_relaxed() {
        let err = EntrelazarError::Convergence {
            passes: 2000,
            relaxed: true,
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to converge"));
        assert!(msg.contains("relaxed"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "model file missing");
        let err: EntrelazarError = io_err.into();
        assert!(matches!(err, EntrelazarError::Io(_)));
    }

    #[test]
    fn test_error_source_io() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = EntrelazarError::Io(io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_source_other() {
        use std::error::Error;
        let err = EntrelazarError::Serialization("bad json".to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_error_eq_str() {
        let err = EntrelazarError::Serialization("bad json".to_string());
        assert!(err == "Serialization error: bad json");
    }
}
