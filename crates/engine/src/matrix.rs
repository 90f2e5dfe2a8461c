//! # Dense Matrices
//!
//! `Matrix` is the only value type in the engine: a rectangular, row-major
//! grid of `f64` with at least one row and one column. Every operation
//! returns a new matrix; nothing is mutated in place.
//!
//! Operations here are exact. Rounding is applied on top by
//! [`Engine`](crate::engine::Engine).
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_engine::Matrix;
//!
//! let x = Matrix::from_rows(vec![vec![1.0, 1.0], vec![1.5, 2.0]]).unwrap();
//! let w = Matrix::from_rows(vec![vec![10.0], vec![2.0]]).unwrap();
//! let xw = x.matmul(&w).unwrap();
//! assert_eq!(xw.to_rows(), vec![vec![12.0], vec![19.0]]);
//! ```

use matrixlab_core::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major entries, `rows * cols` long.
    data: Vec<f64>,
}

impl Matrix {
    /// Build from nested rows.
    ///
    /// # Errors
    ///
    /// `EmptyMatrix` for zero rows or zero columns, `RaggedMatrix` if rows
    /// differ in length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> EngineResult<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || cols == 0 {
            return Err(EngineError::EmptyMatrix);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(EngineError::RaggedMatrix {
                    row: i,
                    len: row.len(),
                    expected: cols,
                });
            }
        }
        let n_rows = rows.len();
        Ok(Self {
            rows: n_rows,
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Build from row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> EngineResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(EngineError::EmptyMatrix);
        }
        if data.len() != rows * cols {
            return Err(EngineError::mismatch(
                "from_vec",
                Shape::new(rows, cols),
                Shape::row(data.len()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// A single-row matrix.
    pub fn row(values: Vec<f64>) -> EngineResult<Self> {
        let len = values.len();
        Self::from_vec(1, len, values)
    }

    /// A 1×1 matrix.
    pub fn scalar(value: f64) -> Self {
        Self {
            rows: 1,
            cols: 1,
            data: vec![value],
        }
    }

    /// A matrix of zeros. Callers guarantee non-zero dimensions.
    pub(crate) fn zeros(shape: Shape) -> Self {
        Self {
            rows: shape.rows,
            cols: shape.cols,
            data: vec![0.0; shape.numel()],
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major entries.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.data[row * self.cols + col])
    }

    /// Entries of row `row`.
    pub fn row_slice(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    /// The single entry of a 1×1 matrix.
    pub fn as_scalar(&self) -> Option<f64> {
        self.shape().is_scalar().then(|| self.data[0])
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Same shape, new row-major entries of equal length.
    pub(crate) fn with_data(&self, data: Vec<f64>) -> Matrix {
        debug_assert_eq!(data.len(), self.data.len());
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        }
    }

    /// All entries as a single row.
    pub fn flattened(&self) -> Matrix {
        Matrix {
            rows: 1,
            cols: self.data.len(),
            data: self.data.clone(),
        }
    }

    /// Apply a function to each entry.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Combine two same-shaped matrices entry by entry.
    pub fn zip_with(
        &self,
        other: &Matrix,
        op: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> EngineResult<Matrix> {
        if !self.shape().is_compatible(&other.shape()) {
            return Err(EngineError::mismatch(op, self.shape(), other.shape()));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Matrix product. Requires `self.cols == other.rows`.
    pub fn matmul(&self, other: &Matrix) -> EngineResult<Matrix> {
        let shape = self
            .shape()
            .product(&other.shape())
            .ok_or_else(|| EngineError::mismatch("multiply", self.shape(), other.shape()))?;

        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut data = vec![0.0; m * n];
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for kk in 0..k {
                    sum += self.data[i * k + kk] * other.data[kk * n + j];
                }
                data[i * n + j] = sum;
            }
        }
        Ok(Matrix {
            rows: shape.rows,
            cols: shape.cols,
            data,
        })
    }

    pub fn add(&self, other: &Matrix) -> EngineResult<Matrix> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> EngineResult<Matrix> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    /// Element-wise product.
    pub fn hadamard(&self, other: &Matrix) -> EngineResult<Matrix> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    pub fn scale(&self, k: f64) -> Matrix {
        self.map(|x| x * k)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.data.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Same shape and every entry within `tolerance`.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = EngineError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Matrix::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix({}, {:?})", self.shape(), self.to_rows())
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.data.chunks(self.cols).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let cells: Vec<String> = row.iter().map(|x| format!("{:>9.4}", x)).collect();
            write!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Build a matrix from nested array literals.
///
/// Expands to [`Matrix::from_rows`], so the result is an `EngineResult`.
///
/// ```rust
/// use matrixlab_engine::matrix;
///
/// let w = matrix![[10], [2]].unwrap();
/// assert_eq!(w.rows(), 2);
/// ```
#[macro_export]
macro_rules! matrix {
    ($([$($x:expr),* $(,)?]),+ $(,)?) => {
        $crate::Matrix::from_rows(vec![$(vec![$($x as f64),*]),+])
    };
}
