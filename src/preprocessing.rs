//! Preprocessing for angle encoding: feature selection and range scaling.
//!
//! The encoder expects each component in [0, π]; anything outside wraps
//! in phase and aliases onto other inputs. [`AngleScaler`] learns
//! per-column bounds on the training set and maps into that range, and
//! [`top_variance_indices`] picks the most informative columns when the
//! raw dimensionality exceeds the encoding-slot ceiling.

use crate::error::{EntrelazarError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Scales features column-wise into [0, π].
///
/// z = π · (x − min) / (max − min), with the min/max learned on the
/// training set. Constant columns map to 0. Values outside the fitted
/// range are clamped rather than allowed to wrap.
///
/// # Example
///
/// ```
/// use entrelazar::preprocessing::AngleScaler;
/// use entrelazar::primitives::Matrix;
/// use std::f64::consts::PI;
///
/// let train = Matrix::from_vec(3, 1, vec![0.0, 5.0, 10.0]).unwrap();
/// let mut scaler = AngleScaler::new();
/// let scaled = scaler.fit_transform(&train).unwrap();
/// assert!((scaled.get(2, 0) - PI).abs() < 1e-12);
/// assert!((scaled.get(1, 0) - PI / 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngleScaler {
    /// Per-column minimum (computed during fit).
    min: Option<Vec<f64>>,
    /// Per-column maximum (computed during fit).
    max: Option<Vec<f64>>,
}

impl AngleScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Learns per-column bounds from the training matrix.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::DataShape`] on an empty matrix.
    pub fn fit(&mut self, x: &Matrix<f64>) -> Result<()> {
        if x.n_rows() == 0 || x.n_cols() == 0 {
            return Err(EntrelazarError::shape_mismatch(
                "scaler fit",
                "a non-empty matrix",
                format!("{}x{}", x.n_rows(), x.n_cols()),
            ));
        }
        let mut min = vec![f64::INFINITY; x.n_cols()];
        let mut max = vec![f64::NEG_INFINITY; x.n_cols()];
        for i in 0..x.n_rows() {
            for (j, &v) in x.row_slice(i).iter().enumerate() {
                min[j] = min[j].min(v);
                max[j] = max[j].max(v);
            }
        }
        self.min = Some(min);
        self.max = Some(max);
        Ok(())
    }

    /// Maps a matrix into [0, π] using the fitted bounds.
    ///
    /// # Errors
    ///
    /// Returns [`EntrelazarError::Configuration`] if unfitted, or
    /// [`EntrelazarError::DataShape`] on a column-count mismatch.
    pub fn transform(&self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        let (min, max) = match (&self.min, &self.max) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(EntrelazarError::config(
                    "scaler",
                    "unfitted",
                    "call fit before transform",
                ))
            }
        };
        if x.n_cols() != min.len() {
            return Err(EntrelazarError::shape_mismatch(
                "scaler transform",
                format!("{} columns", min.len()),
                format!("{}", x.n_cols()),
            ));
        }

        let mut out = Matrix::zeros(x.n_rows(), x.n_cols());
        for i in 0..x.n_rows() {
            for j in 0..x.n_cols() {
                let span = max[j] - min[j];
                let scaled = if span == 0.0 {
                    0.0
                } else {
                    (PI * (x.get(i, j) - min[j]) / span).clamp(0.0, PI)
                };
                out.set(i, j, scaled);
            }
        }
        Ok(out)
    }

    /// Fits on the matrix, then transforms it.
    ///
    /// # Errors
    ///
    /// Same as [`AngleScaler::fit`] and [`AngleScaler::transform`].
    pub fn fit_transform(&mut self, x: &Matrix<f64>) -> Result<Matrix<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

impl Default for AngleScaler {
    fn default() -> Self {
        Self::new()
    }
}

/// Indices of the `k` highest-variance columns, in ascending column order.
///
/// Used to shrink wide inputs down to the encoding-slot ceiling while
/// keeping the columns that carry signal. Ties resolve to the lower
/// column index.
///
/// # Errors
///
/// Returns [`EntrelazarError::Configuration`] if `k` is 0 or exceeds the
/// column count, or [`EntrelazarError::DataShape`] on an empty matrix.
///
/// # Examples
///
/// ```
/// use entrelazar::preprocessing::top_variance_indices;
/// use entrelazar::primitives::Matrix;
///
/// // Column 1 is constant; columns 0 and 2 vary.
/// let x = Matrix::from_vec(3, 3, vec![
///     0.0, 5.0, 10.0,
///     4.0, 5.0, 0.0,
///     8.0, 5.0, 20.0,
/// ]).unwrap();
/// assert_eq!(top_variance_indices(&x, 2).unwrap(), vec![0, 2]);
/// ```
pub fn top_variance_indices(x: &Matrix<f64>, k: usize) -> Result<Vec<usize>> {
    if x.n_rows() == 0 || x.n_cols() == 0 {
        return Err(EntrelazarError::shape_mismatch(
            "variance selection",
            "a non-empty matrix",
            format!("{}x{}", x.n_rows(), x.n_cols()),
        ));
    }
    if k == 0 || k > x.n_cols() {
        return Err(EntrelazarError::config(
            "k",
            k,
            &format!("between 1 and {} columns", x.n_cols()),
        ));
    }

    let n = x.n_rows() as f64;
    let mut variances: Vec<(usize, f64)> = (0..x.n_cols())
        .map(|j| {
            let mean: f64 = (0..x.n_rows()).map(|i| x.get(i, j)).sum::<f64>() / n;
            let var: f64 = (0..x.n_rows())
                .map(|i| {
                    let d = x.get(i, j) - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            (j, var)
        })
        .collect();

    variances.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let mut selected: Vec<usize> = variances[..k].iter().map(|&(j, _)| j).collect();
    selected.sort_unstable();
    Ok(selected)
}
