//! Kernel support vector machine over precomputed Gram matrices.
//!
//! The trainer never sees feature vectors: it consumes the train-train
//! kernel produced by [`crate::kernel::KernelEngine`] plus binary labels,
//! and solves the dual soft-margin problem with a deterministic SMO
//! (sequential minimal optimization) sweep. Scoring likewise consumes a
//! precomputed test-train cross matrix.

use crate::encoding::EncoderConfig;
use crate::error::{EntrelazarError, Result};
use crate::primitives::{Matrix, Vector};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Dual coefficients below this magnitude are treated as zero when
/// extracting support vectors.
const SUPPORT_EPS: f64 = 1e-12;

/// Kernel SVM classifier on precomputed kernel matrices.
///
/// # Algorithm
///
/// Maximizes the soft-margin dual:
/// ```text
/// max  Σᵢ αᵢ − ½ ΣᵢΣⱼ αᵢαⱼyᵢyⱼK(i,j)   s.t.  0 ≤ αᵢ ≤ C,  Σᵢ αᵢyᵢ = 0
/// ```
/// via simplified SMO with a deterministic partner choice (the index
/// maximizing |Eᵢ − Eⱼ|), so a given kernel and label vector always
/// produce the same model.
///
/// # Example
///
/// ```
/// use entrelazar::primitives::Matrix;
/// use entrelazar::svm::KernelSvm;
///
/// // RBF kernel over 1-D points [0.0, 0.1, 2.0, 2.1].
/// let pts = [0.0f64, 0.1, 2.0, 2.1];
/// let mut data = Vec::new();
/// for a in &pts {
///     for b in &pts {
///         data.push((-(a - b) * (a - b)).exp());
///     }
/// }
/// let k = Matrix::from_vec(4, 4, data).unwrap();
/// let y = vec![0, 0, 1, 1];
///
/// let mut svm = KernelSvm::new();
/// svm.fit(&k, &y).unwrap();
/// let scores = svm.decision_function(&k).unwrap();
/// assert!(scores[0] < 0.0 && scores[3] > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct KernelSvm {
    /// Regularization parameter (default: 1.0). Larger C fits the data
    /// more closely.
    c: f64,
    /// KKT violation tolerance (default: 1e-3).
    tol: f64,
    /// Consecutive quiet sweeps required to declare convergence
    /// (default: 10).
    max_passes: usize,
    /// Largest tolerated |K(i,j) − K(j,i)| before the matrix is rejected
    /// as ill-conditioned (default: 1e-6).
    asymmetry_tol: f64,
    fitted: Option<Fitted>,
}

#[derive(Debug, Clone)]
struct Fitted {
    support_indices: Vec<usize>,
    dual_coefs: Vec<f64>,
    bias: f64,
    n_train: usize,
}

impl KernelSvm {
    /// Creates a new kernel SVM with default parameters.
    ///
    /// # Default Parameters
    ///
    /// - C: 1.0
    /// - tol: 1e-3
    /// - `max_passes`: 10
    #[must_use]
    pub fn new() -> Self {
        Self {
            c: 1.0,
            tol: 1e-3,
            max_passes: 10,
            asymmetry_tol: 1e-6,
            fitted: None,
        }
    }

    /// Sets the regularization parameter C.
    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Sets the KKT violation tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the number of quiet sweeps required for convergence.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Trains on a precomputed train-train kernel and binary labels.
    ///
    /// If the solver fails to reach a quiet state within its sweep budget
    /// it retries once with the tolerance relaxed tenfold before giving
    /// up, so marginal problems still yield a model and hopeless ones
    /// fail loudly.
    ///
    /// # Errors
    ///
    /// - [`EntrelazarError::DataShape`] if `k` is not square or `y` has
    ///   the wrong length.
    /// - [`EntrelazarError::Configuration`] for non-binary or
    ///   single-class labels, or C ≤ 0.
    /// - [`EntrelazarError::KernelIllConditioned`] if `k` is asymmetric
    ///   beyond tolerance or contains non-finite entries.
    /// - [`EntrelazarError::Convergence`] if even the relaxed solve does
    ///   not converge.
    pub fn fit(&mut self, k: &Matrix<f64>, y: &[usize]) -> Result<()> {
        let n = k.n_rows();
        if k.n_cols() != n {
            return Err(EntrelazarError::shape_mismatch(
                "train kernel",
                "square matrix",
                format!("{}x{}", n, k.n_cols()),
            ));
        }
        if y.len() != n {
            return Err(EntrelazarError::shape_mismatch(
                "labels",
                format!("{n} labels"),
                format!("{}", y.len()),
            ));
        }
        if n == 0 {
            return Err(EntrelazarError::shape_mismatch(
                "train kernel",
                "at least 1 sample",
                "0",
            ));
        }
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(EntrelazarError::config("c", self.c, "a finite value > 0"));
        }
        if let Some(&bad) = y.iter().find(|&&label| label > 1) {
            return Err(EntrelazarError::config("labels", bad, "binary labels 0 or 1"));
        }
        let n_pos = y.iter().filter(|&&label| label == 1).count();
        if n_pos == 0 || n_pos == n {
            return Err(EntrelazarError::config(
                "labels",
                n_pos,
                "both classes present in the training set",
            ));
        }
        if k.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(EntrelazarError::KernelIllConditioned {
                max_violation: f64::INFINITY,
                tolerance: self.asymmetry_tol,
            });
        }
        let asymmetry = k.max_asymmetry();
        if asymmetry > self.asymmetry_tol {
            return Err(EntrelazarError::KernelIllConditioned {
                max_violation: asymmetry,
                tolerance: self.asymmetry_tol,
            });
        }

        let y_signed: Vec<f64> = y
            .iter()
            .map(|&label| if label == 0 { -1.0 } else { 1.0 })
            .collect();

        let (alpha, bias) = match self.smo(k, &y_signed, self.tol) {
            Some(solution) => solution,
            // Retry once with relaxed tolerance before failing.
            None => match self.smo(k, &y_signed, self.tol * 10.0) {
                Some(solution) => solution,
                None => {
                    return Err(EntrelazarError::Convergence {
                        passes: self.max_passes,
                        relaxed: true,
                    })
                }
            },
        };

        let mut support_indices = Vec::new();
        let mut dual_coefs = Vec::new();
        for (i, &a) in alpha.iter().enumerate() {
            if a > SUPPORT_EPS {
                support_indices.push(i);
                dual_coefs.push(a * y_signed[i]);
            }
        }

        self.fitted = Some(Fitted {
            support_indices,
            dual_coefs,
            bias,
            n_train: n,
        });
        Ok(())
    }

    /// Simplified SMO sweep. Returns `None` if the sweep budget runs out
    /// before `max_passes` consecutive quiet sweeps.
    fn smo(&self, k: &Matrix<f64>, y: &[f64], tol: f64) -> Option<(Vec<f64>, f64)> {
        let n = y.len();
        let mut alpha = vec![0.0f64; n];
        let mut bias = 0.0f64;
        let sweep_budget = 500 + 100 * n;

        let decision = |alpha: &[f64], bias: f64, i: usize| -> f64 {
            let mut sum = bias;
            for (j, &a) in alpha.iter().enumerate() {
                if a > 0.0 {
                    sum += a * y[j] * k.get(j, i);
                }
            }
            sum
        };

        let mut quiet_passes = 0;
        let mut sweeps = 0;
        while quiet_passes < self.max_passes {
            if sweeps >= sweep_budget {
                return None;
            }
            sweeps += 1;
            let mut changed = 0;

            for i in 0..n {
                let e_i = decision(&alpha, bias, i) - y[i];
                let violates = (y[i] * e_i < -tol && alpha[i] < self.c)
                    || (y[i] * e_i > tol && alpha[i] > 0.0);
                if !violates {
                    continue;
                }

                // Deterministic partner: the index with the largest error
                // gap (ties broken by lowest index).
                let mut j_best = usize::MAX;
                let mut gap_best = -1.0;
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    let gap = (e_i - (decision(&alpha, bias, j) - y[j])).abs();
                    if gap > gap_best {
                        gap_best = gap;
                        j_best = j;
                    }
                }
                if j_best == usize::MAX {
                    continue;
                }
                let j = j_best;
                let e_j = decision(&alpha, bias, j) - y[j];

                let (alpha_i_old, alpha_j_old) = (alpha[i], alpha[j]);
                let (lo, hi) = if (y[i] - y[j]).abs() > f64::EPSILON {
                    (
                        (alpha[j] - alpha[i]).max(0.0),
                        (self.c + alpha[j] - alpha[i]).min(self.c),
                    )
                } else {
                    (
                        (alpha[i] + alpha[j] - self.c).max(0.0),
                        (alpha[i] + alpha[j]).min(self.c),
                    )
                };
                if (hi - lo).abs() < f64::EPSILON {
                    continue;
                }

                let eta = 2.0 * k.get(i, j) - k.get(i, i) - k.get(j, j);
                if eta >= 0.0 {
                    continue;
                }

                let mut alpha_j_new = alpha_j_old - y[j] * (e_i - e_j) / eta;
                alpha_j_new = alpha_j_new.clamp(lo, hi);
                if (alpha_j_new - alpha_j_old).abs() < 1e-7 {
                    continue;
                }
                let alpha_i_new =
                    alpha_i_old + y[i] * y[j] * (alpha_j_old - alpha_j_new);

                alpha[i] = alpha_i_new;
                alpha[j] = alpha_j_new;

                let b1 = bias
                    - e_i
                    - y[i] * (alpha_i_new - alpha_i_old) * k.get(i, i)
                    - y[j] * (alpha_j_new - alpha_j_old) * k.get(i, j);
                let b2 = bias
                    - e_j
                    - y[i] * (alpha_i_new - alpha_i_old) * k.get(i, j)
                    - y[j] * (alpha_j_new - alpha_j_old) * k.get(j, j);
                bias = if alpha_i_new > 0.0 && alpha_i_new < self.c {
                    b1
                } else if alpha_j_new > 0.0 && alpha_j_new < self.c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };
                changed += 1;
            }

            if changed == 0 {
                quiet_passes += 1;
            } else {
                quiet_passes = 0;
            }
        }
        Some((alpha, bias))
    }

    /// Computes decision scores from a precomputed test-train cross
    /// kernel (`n_test` × `n_train`).
    ///
    /// Positive scores indicate the positive class. Only support-vector
    /// columns contribute.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Configuration`] if the model is
    /// unfitted, or [`EntrelazarError::DataShape`] if the cross matrix
    /// column count disagrees with the training-set size.
    pub fn decision_function(&self, cross: &Matrix<f64>) -> Result<Vector<f64>> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            EntrelazarError::config("model", "unfitted", "call fit before scoring")
        })?;
        if cross.n_cols() != fitted.n_train {
            return Err(EntrelazarError::shape_mismatch(
                "cross kernel",
                format!("{} columns", fitted.n_train),
                format!("{}", cross.n_cols()),
            ));
        }

        let mut scores = Vec::with_capacity(cross.n_rows());
        for t in 0..cross.n_rows() {
            let mut score = fitted.bias;
            for (&idx, &coef) in fitted.support_indices.iter().zip(&fitted.dual_coefs) {
                score += coef * cross.get(t, idx);
            }
            scores.push(score);
        }
        Ok(Vector::from_vec(scores))
    }

    /// Indices of the support vectors in the training set.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Configuration`] if the model is unfitted.
    pub fn support_indices(&self) -> Result<&[usize]> {
        self.fitted
            .as_ref()
            .map(|f| f.support_indices.as_slice())
            .ok_or_else(|| {
                EntrelazarError::config("model", "unfitted", "call fit before inspecting")
            })
    }

    /// Extracts a serializable model carrying the encoder configuration
    /// that scoring must reproduce.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Configuration`] if the model is unfitted.
    pub fn to_model(&self, encoder_config: EncoderConfig) -> Result<TrainedModel> {
        let fitted = self.fitted.as_ref().ok_or_else(|| {
            EntrelazarError::config("model", "unfitted", "call fit before exporting")
        })?;
        Ok(TrainedModel {
            support_indices: fitted.support_indices.clone(),
            dual_coefs: fitted.dual_coefs.clone(),
            bias: fitted.bias,
            n_train: fitted.n_train,
            encoder_config,
        })
    }

    /// Rebuilds a fitted classifier from a saved model.
    #[must_use]
    pub fn from_model(model: &TrainedModel) -> Self {
        let mut svm = Self::new();
        svm.fitted = Some(Fitted {
            support_indices: model.support_indices.clone(),
            dual_coefs: model.dual_coefs.clone(),
            bias: model.bias,
            n_train: model.n_train,
        });
        svm
    }
}

impl Default for KernelSvm {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable trained model.
///
/// Holds everything scoring needs besides the training vectors
/// themselves: support-vector indices, the signed dual coefficients
/// αᵢyᵢ, the bias, and the exact encoder configuration the kernel must
/// be rebuilt with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Indices of the support vectors in the training set.
    pub support_indices: Vec<usize>,
    /// Signed dual coefficients αᵢyᵢ, aligned with `support_indices`.
    pub dual_coefs: Vec<f64>,
    /// Decision-function bias.
    pub bias: f64,
    /// Training-set size; cross kernels must have this many columns.
    pub n_train: usize,
    /// Encoder configuration scoring must reproduce exactly.
    pub encoder_config: EncoderConfig,
}

impl TrainedModel {
    /// Saves the model as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Io`] or [`EntrelazarError::Serialization`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Loads a model saved with [`TrainedModel::save`].
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Io`] or [`EntrelazarError::Serialization`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let model = serde_json::from_reader(BufReader::new(file))?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RBF Gram matrix over 1-D points; PSD by construction.
    fn rbf_gram(pts: &[f64]) -> Matrix<f64> {
        let n = pts.len();
        let mut data = Vec::with_capacity(n * n);
        for a in pts {
            for b in pts {
                data.push((-(a - b) * (a - b)).exp());
            }
        }
        Matrix::from_vec(n, n, data).expect("gram")
    }

    fn separable() -> (Matrix<f64>, Vec<usize>) {
        (rbf_gram(&[0.0, 0.1, 0.2, 2.0, 2.1, 2.2]), vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_fit_separates_two_clusters() {
        let (k, y) = separable();
        let mut svm = KernelSvm::new();
        svm.fit(&k, &y).expect("fit");
        let scores = svm.decision_function(&k).expect("scores");
        for (score, &label) in scores.iter().zip(&y) {
            if label == 1 {
                assert!(*score > 0.0, "positive sample scored {score}");
            } else {
                assert!(*score < 0.0, "negative sample scored {score}");
            }
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (k, y) = separable();
        let mut a = KernelSvm::new();
        let mut b = KernelSvm::new();
        a.fit(&k, &y).expect("fit");
        b.fit(&k, &y).expect("fit");
        assert_eq!(
            a.decision_function(&k).expect("scores"),
            b.decision_function(&k).expect("scores")
        );
        assert_eq!(
            a.support_indices().expect("support"),
            b.support_indices().expect("support")
        );
    }

    #[test]
    fn test_non_square_kernel_rejected() {
        let k = Matrix::from_vec(2, 3, vec![1.0; 6]).expect("matrix");
        let mut svm = KernelSvm::new();
        assert!(matches!(
            svm.fit(&k, &[0, 1]),
            Err(EntrelazarError::DataShape { .. })
        ));
    }

    #[test]
    fn test_label_length_mismatch_rejected() {
        let (k, _) = separable();
        let mut svm = KernelSvm::new();
        assert!(matches!(
            svm.fit(&k, &[0, 1]),
            Err(EntrelazarError::DataShape { .. })
        ));
    }

    #[test]
    fn test_non_binary_labels_rejected() {
        let (k, _) = separable();
        let mut svm = KernelSvm::new();
        assert!(matches!(
            svm.fit(&k, &[0, 0, 0, 1, 1, 2]),
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let (k, _) = separable();
        let mut svm = KernelSvm::new();
        assert!(matches!(
            svm.fit(&k, &[0, 0, 0, 0, 0, 0]),
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_nonpositive_c_rejected() {
        let (k, y) = separable();
        let mut svm = KernelSvm::new().with_c(0.0);
        assert!(matches!(
            svm.fit(&k, &y),
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_asymmetric_kernel_rejected_with_violation() {
        let (mut k, y) = separable();
        k.set(0, 1, k.get(0, 1) + 0.5);
        let mut svm = KernelSvm::new();
        match svm.fit(&k, &y) {
            Err(EntrelazarError::KernelIllConditioned {
                max_violation,
                tolerance,
            }) => {
                assert!((max_violation - 0.5).abs() < 1e-9);
                assert!(max_violation > tolerance);
            }
            other => panic!("expected KernelIllConditioned, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_kernel_rejected() {
        let (mut k, y) = separable();
        k.set(1, 1, f64::NAN);
        let mut svm = KernelSvm::new();
        assert!(matches!(
            svm.fit(&k, &y),
            Err(EntrelazarError::KernelIllConditioned { .. })
        ));
    }

    #[test]
    fn test_decision_before_fit_rejected() {
        let svm = KernelSvm::new();
        let cross = Matrix::from_vec(1, 2, vec![0.5, 0.5]).expect("matrix");
        assert!(matches!(
            svm.decision_function(&cross),
            Err(EntrelazarError::Configuration { .. })
        ));
    }

    #[test]
    fn test_cross_column_mismatch_rejected() {
        let (k, y) = separable();
        let mut svm = KernelSvm::new();
        svm.fit(&k, &y).expect("fit");
        let cross = Matrix::from_vec(1, 2, vec![0.5, 0.5]).expect("matrix");
        assert!(matches!(
            svm.decision_function(&cross),
            Err(EntrelazarError::DataShape { .. })
        ));
    }

    #[test]
    fn test_dual_coefs_signed_and_bounded() {
        let (k, y) = separable();
        let mut svm = KernelSvm::new().with_c(2.0);
        svm.fit(&k, &y).expect("fit");
        let model = svm.to_model(EncoderConfig::new()).expect("model");
        assert_eq!(model.support_indices.len(), model.dual_coefs.len());
        for (&idx, &coef) in model.support_indices.iter().zip(&model.dual_coefs) {
            if y[idx] == 1 {
                assert!(coef > 0.0 && coef <= 2.0 + 1e-9);
            } else {
                assert!(coef < 0.0 && coef >= -2.0 - 1e-9);
            }
        }
        // Dual constraint Σ αᵢyᵢ = 0.
        let sum: f64 = model.dual_coefs.iter().sum();
        assert!(sum.abs() < 1e-6);
    }

    #[test]
    fn test_model_round_trip_through_file() {
        let (k, y) = separable();
        let mut svm = KernelSvm::new();
        svm.fit(&k, &y).expect("fit");
        let model = svm.to_model(EncoderConfig::new()).expect("model");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        model.save(&path).expect("save");
        let loaded = TrainedModel::load(&path).expect("load");
        assert_eq!(model, loaded);

        // Restored model scores identically.
        let restored = KernelSvm::from_model(&loaded);
        assert_eq!(
            svm.decision_function(&k).expect("scores"),
            restored.decision_function(&k).expect("scores")
        );
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = TrainedModel::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(EntrelazarError::Io(_))));
    }
}
