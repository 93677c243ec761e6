//! End-to-end classifier: encode → kernel → train → score.
//!
//! [`QuantumClassifier`] wires the kernel engine and the SVM together
//! behind a fit/predict surface, and keeps the training vectors around
//! because scoring a new sample needs its kernel against every support
//! vector. The engine's memo cache makes repeated scoring against the
//! same training set cheap.

use crate::backend::EvaluationBackend;
use crate::encoding::EncoderConfig;
use crate::error::{EntrelazarError, Result};
use crate::kernel::{KernelConfig, KernelEngine};
use crate::metrics::BinaryMetrics;
use crate::primitives::{Matrix, Vector};
use crate::svm::{KernelSvm, TrainedModel};

/// Quantum-kernel binary classifier.
///
/// # Example
///
/// ```
/// use entrelazar::backend::StatevectorBackend;
/// use entrelazar::encoding::EncoderConfig;
/// use entrelazar::kernel::KernelConfig;
/// use entrelazar::pipeline::QuantumClassifier;
/// use entrelazar::primitives::Matrix;
///
/// let x = Matrix::from_vec(4, 2, vec![
///     0.5, 1.0,
///     0.5, 1.0,
///     4.0, 5.5,
///     4.0, 5.5,
/// ]).unwrap();
/// let y = vec![0, 0, 1, 1];
///
/// let mut clf = QuantumClassifier::new(
///     StatevectorBackend::new(),
///     EncoderConfig::new(),
///     KernelConfig::new(),
/// );
/// clf.fit(&x, &y).unwrap();
/// assert_eq!(clf.predict(&x, 0.0).unwrap(), y);
/// ```
#[derive(Debug)]
pub struct QuantumClassifier<B> {
    engine: KernelEngine<B>,
    encoder: EncoderConfig,
    svm: KernelSvm,
    x_train: Option<Matrix<f64>>,
}

impl<B: EvaluationBackend> QuantumClassifier<B> {
    /// Creates an untrained classifier.
    #[must_use]
    pub fn new(backend: B, encoder: EncoderConfig, kernel_config: KernelConfig) -> Self {
        Self {
            engine: KernelEngine::new(backend, kernel_config),
            encoder,
            svm: KernelSvm::new(),
            x_train: None,
        }
    }

    /// Replaces the default SVM (e.g. to change C).
    #[must_use]
    pub fn with_svm(mut self, svm: KernelSvm) -> Self {
        self.svm = svm;
        self
    }

    /// The encoder configuration in effect.
    #[must_use]
    pub fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    /// True if the kernel engine has switched to its classical
    /// degraded mode.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.engine.fell_back()
    }

    /// Trains on feature vectors (rows of `x`, pre-scaled into [0, π])
    /// and binary labels.
    ///
    /// # Errors
    ///
    /// Propagates every kernel-engine and trainer error; additionally
    /// returns [`EntrelazarError::DataShape`] if `x` and `y` disagree on
    /// sample count.
    pub fn fit(&mut self, x: &Matrix<f64>, y: &[usize]) -> Result<()> {
        if x.n_rows() != y.len() {
            return Err(EntrelazarError::shape_mismatch(
                "fit",
                format!("{} labels", x.n_rows()),
                format!("{}", y.len()),
            ));
        }
        let k = self.engine.train_matrix(x, &self.encoder)?;
        self.svm.fit(&k, y)?;
        self.x_train = Some(x.clone());
        Ok(())
    }

    /// Decision scores for new samples; positive means the positive class.
    ///
    /// Needs `&mut self` because the kernel engine memoizes entries as it
    /// evaluates the cross matrix.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Configuration`] if unfitted, plus any
    /// kernel-engine error.
    pub fn decision_function(&mut self, x: &Matrix<f64>) -> Result<Vector<f64>> {
        let x_train = self.x_train.as_ref().ok_or_else(|| {
            EntrelazarError::config("model", "unfitted", "call fit before scoring")
        })?;
        let cross = self.engine.cross_matrix(x, x_train, &self.encoder)?;
        self.svm.decision_function(&cross)
    }

    /// Predicts labels at a decision threshold (0.0 is the SVM's natural
    /// boundary; tune it with
    /// [`crate::metrics::best_f1_threshold`] on held-out scores).
    ///
    /// # Errors
    ///
    /// Same as [`QuantumClassifier::decision_function`].
    pub fn predict(&mut self, x: &Matrix<f64>, threshold: f64) -> Result<Vec<usize>> {
        let scores = self.decision_function(x)?;
        Ok(scores
            .iter()
            .map(|&score| usize::from(score >= threshold))
            .collect())
    }

    /// Scores a labeled set and computes the full metric summary.
    ///
    /// # Errors
    ///
    /// Same as [`QuantumClassifier::decision_function`], plus
    /// [`EntrelazarError::DataShape`] if `x` and `y` disagree on sample
    /// count.
    pub fn evaluate(
        &mut self,
        x: &Matrix<f64>,
        y: &[usize],
        threshold: f64,
    ) -> Result<BinaryMetrics> {
        if x.n_rows() != y.len() {
            return Err(EntrelazarError::shape_mismatch(
                "evaluate",
                format!("{} labels", x.n_rows()),
                format!("{}", y.len()),
            ));
        }
        let scores = self.decision_function(x)?;
        Ok(BinaryMetrics::compute(y, scores.as_slice(), threshold))
    }

    /// Exports the serializable trained model.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Configuration`] if unfitted.
    pub fn model(&self) -> Result<TrainedModel> {
        self.svm.to_model(self.encoder)
    }

    /// Restores a classifier from a saved model plus the training
    /// vectors it was fitted on (the model stores indices into them).
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::DataShape`] if `x_train` does not have
    /// the row count recorded in the model.
    pub fn from_model(
        backend: B,
        kernel_config: KernelConfig,
        model: &TrainedModel,
        x_train: Matrix<f64>,
    ) -> Result<Self> {
        if x_train.n_rows() != model.n_train {
            return Err(EntrelazarError::shape_mismatch(
                "model restore",
                format!("{} training rows", model.n_train),
                format!("{}", x_train.n_rows()),
            ));
        }
        Ok(Self {
            engine: KernelEngine::new(backend, kernel_config),
            encoder: model.encoder_config,
            svm: KernelSvm::from_model(model),
            x_train: Some(x_train),
        })
    }
}
