//! Matrix type for 2D numeric data.

use super::Vector;
use serde::{Deserialize, Serialize};

/// A 2D matrix of numeric values (row-major storage).
///
/// # Examples
///
/// ```
/// use entrelazar::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("data length matches rows * cols");
/// assert_eq!(m.shape(), (2, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Matrix<T> {
    /// Creates a new matrix from a vector of data.
    ///
    /// # Errors
    ///
    /// Returns an error if data length doesn't match rows * cols.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, &'static str> {
        if data.len() != rows * cols {
            return Err("Data length must equal rows * cols");
        }
        Ok(Self { data, rows, cols })
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Sets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    /// Returns a row as a slice view into the underlying storage.
    ///
    /// # Panics
    ///
    /// Panics if `row_idx` is out of bounds.
    #[must_use]
    pub fn row_slice(&self, row_idx: usize) -> &[T] {
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns a row as a Vector.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> Vector<T> {
        Vector::from_slice(self.row_slice(row_idx))
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Builds a new matrix from a column subset, preserving row order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of bounds or the index list is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use entrelazar::primitives::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let sub = m.select_columns(&[0, 2]).unwrap();
    /// assert_eq!(sub.shape(), (2, 2));
    /// assert_eq!(sub.get(1, 1), 6.0);
    /// ```
    pub fn select_columns(&self, indices: &[usize]) -> Result<Self, &'static str> {
        if indices.is_empty() {
            return Err("Column index list must not be empty");
        }
        if indices.iter().any(|&c| c >= self.cols) {
            return Err("Column index out of bounds");
        }
        let mut data = Vec::with_capacity(self.rows * indices.len());
        for row in 0..self.rows {
            for &col in indices {
                data.push(self.get(row, col));
            }
        }
        Ok(Self {
            data,
            rows: self.rows,
            cols: indices.len(),
        })
    }
}

impl Matrix<f64> {
    /// Creates a matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Largest absolute difference between the matrix and its transpose.
    ///
    /// Returns 0.0 for non-square matrices of size 0 and panics for
    /// non-square shapes otherwise.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square.
    #[must_use]
    pub fn max_asymmetry(&self) -> f64 {
        assert_eq!(self.rows, self.cols, "max_asymmetry requires a square matrix");
        let mut max = 0.0_f64;
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                let d = (self.get(i, j) - self.get(j, i)).abs();
                if d > max {
                    max = d;
                }
            }
        }
        max
    }

    /// Replaces the matrix with (M + Mᵀ)/2.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not square.
    pub fn symmetrize(&mut self) {
        assert_eq!(self.rows, self.cols, "symmetrize requires a square matrix");
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                let mean = 0.5 * (self.get(i, j) + self.get(j, i));
                self.set(i, j, mean);
                self.set(j, i, mean);
            }
        }
    }

    /// Clips every entry into `[lo, hi]`.
    pub fn clip(&mut self, lo: f64, hi: f64) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }
}
