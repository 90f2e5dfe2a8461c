//! # Scaled Dot-Product Attention
//!
//! `softmax((Q·Kᵀ) / scale) · V`, keeping the intermediate scores and
//! weights so a lab can show each stage.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::matrix::Matrix;
use crate::ops::softmax;

/// Every stage of one attention evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attention {
    /// `(Q·Kᵀ) / scale`
    pub scores: Matrix,
    /// Row-wise softmax of `scores`.
    pub weights: Matrix,
    /// `weights · V`
    pub output: Matrix,
}

/// Attend from `query` over the rows of `keys` and `values`.
///
/// `keys` and `values` need the same number of rows; `query` and `keys` the
/// same number of columns.
pub fn scaled_dot_product(
    query: &Matrix,
    keys: &Matrix,
    values: &Matrix,
    scale: f64,
) -> EngineResult<Attention> {
    if keys.rows() != values.rows() {
        return Err(EngineError::mismatch("attention", keys.shape(), values.shape()));
    }
    let scores = query.matmul(&keys.transpose())?.scale(1.0 / scale);
    let weights = softmax(&scores);
    let output = weights.matmul(values)?;
    Ok(Attention {
        scores,
        weights,
        output,
    })
}
