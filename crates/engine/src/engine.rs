//! # Engine - Rounding-aware Arithmetic
//!
//! The regression labs show answers to four decimals and check every
//! intermediate against the rounded value, so their arithmetic rounds
//! after each operation. The other labs compute exactly. An [`Engine`]
//! carries that choice as a [`Rounding`] policy instead of duplicating
//! helpers per module.
//!
//! Under `Decimals(n)` these results are rounded: multiply (after the sum),
//! add, subtract, scale, sigmoid, the MSE and BCE loss values and the bias
//! gradient. Transpose never rounds.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::loss;
use crate::matrix::Matrix;
use crate::ops;

/// How results are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rounding {
    #[default]
    Exact,
    /// Round half away from zero to this many decimal places.
    Decimals(u32),
}

impl Rounding {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Rounding::Exact => x,
            Rounding::Decimals(places) => {
                let factor = 10f64.powi(places as i32);
                (x * factor).round() / factor
            }
        }
    }

    pub fn apply_matrix(self, m: Matrix) -> Matrix {
        match self {
            Rounding::Exact => m,
            Rounding::Decimals(_) => m.map(|x| self.apply(x)),
        }
    }
}

/// Arithmetic under a fixed rounding policy.
///
/// # Example
///
/// ```rust
/// use matrixlab_engine::{matrix, Engine};
///
/// let engine = Engine::rounded(4);
/// let a = matrix![[1.0 / 3.0]].unwrap();
/// let b = engine.scale(&a, 3.0);
/// assert_eq!(b.as_scalar(), Some(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Engine {
    rounding: Rounding,
}

impl Engine {
    pub const fn new(rounding: Rounding) -> Self {
        Self { rounding }
    }

    pub const fn exact() -> Self {
        Self::new(Rounding::Exact)
    }

    pub const fn rounded(decimals: u32) -> Self {
        Self::new(Rounding::Decimals(decimals))
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Round a scalar under this engine's policy.
    pub fn round(&self, x: f64) -> f64 {
        self.rounding.apply(x)
    }

    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> EngineResult<Matrix> {
        Ok(self.rounding.apply_matrix(a.matmul(b)?))
    }

    pub fn add(&self, a: &Matrix, b: &Matrix) -> EngineResult<Matrix> {
        Ok(self.rounding.apply_matrix(a.add(b)?))
    }

    pub fn subtract(&self, a: &Matrix, b: &Matrix) -> EngineResult<Matrix> {
        Ok(self.rounding.apply_matrix(a.sub(b)?))
    }

    pub fn scale(&self, a: &Matrix, k: f64) -> Matrix {
        self.rounding.apply_matrix(a.scale(k))
    }

    pub fn transpose(&self, a: &Matrix) -> Matrix {
        a.transpose()
    }

    pub fn sigmoid(&self, a: &Matrix) -> Matrix {
        self.rounding.apply_matrix(ops::sigmoid(a))
    }

    /// Add a single-row bias to every row of `a`.
    ///
    /// The bias must be `1 × cols(a)`.
    pub fn add_row_bias(&self, a: &Matrix, bias: &Matrix) -> EngineResult<Matrix> {
        if bias.rows() != 1 || bias.cols() != a.cols() {
            return Err(EngineError::mismatch("add_row_bias", a.shape(), bias.shape()));
        }
        let expanded = ops::repeat_rows(bias, a.rows())?;
        self.add(a, &expanded)
    }

    /// `X·w + b` with `b` broadcast over rows.
    pub fn affine(&self, x: &Matrix, w: &Matrix, b: &Matrix) -> EngineResult<Matrix> {
        let xw = self.multiply(x, w)?;
        self.add_row_bias(&xw, b)
    }

    pub fn mse(&self, predictions: &Matrix, targets: &Matrix) -> EngineResult<f64> {
        Ok(self.round(loss::mse(predictions, targets)?))
    }

    pub fn binary_cross_entropy(&self, predictions: &Matrix, targets: &Matrix) -> EngineResult<f64> {
        Ok(self.round(loss::binary_cross_entropy(predictions, targets)?))
    }
}
