//! # Element-wise and Row-wise Operations
//!
//! Activations and reshaping helpers shared by the modules. All of them are
//! exact; callers that want rounding go through [`Engine`](crate::Engine).
//!
//! | Op | Definition |
//! |----|------------|
//! | `relu` | `max(0, x)` |
//! | `sigmoid` | `1 / (1 + e^-x)` |
//! | `tanh` | `tanh(x)` |
//! | `tanh_derivative` | `1 - tanh(x)²`, taken on the pre-activation |
//! | `softmax` | row-wise, max-subtracted |
//! | `rope_pair_rotation` | `(x, y) -> (-y, x)` per pair |

use crate::error::{EngineError, EngineResult};
use crate::matrix::Matrix;

pub fn relu(a: &Matrix) -> Matrix {
    a.map(|x| x.max(0.0))
}

pub fn sigmoid(a: &Matrix) -> Matrix {
    a.map(|x| 1.0 / (1.0 + (-x).exp()))
}

pub fn tanh(a: &Matrix) -> Matrix {
    a.map(f64::tanh)
}

/// Derivative of `tanh` at each pre-activation value.
pub fn tanh_derivative(pre: &Matrix) -> Matrix {
    pre.map(|x| {
        let t = x.tanh();
        1.0 - t * t
    })
}

/// Row-wise softmax.
///
/// Each row has its maximum subtracted before exponentiation. A row whose
/// exponential sum is exactly zero becomes all zeros.
pub fn softmax(a: &Matrix) -> Matrix {
    let mut out = Vec::with_capacity(a.data().len());
    for row in a.data().chunks(a.cols()) {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        if sum == 0.0 {
            out.extend(std::iter::repeat(0.0).take(row.len()));
        } else {
            out.extend(exps.into_iter().map(|e| e / sum));
        }
    }
    a.with_data(out)
}

/// Simplified rotary embedding: each consecutive pair `(x, y)` in a row
/// becomes `(-y, x)`. An odd trailing entry is left as is.
pub fn rope_pair_rotation(a: &Matrix) -> Matrix {
    let mut out = Vec::with_capacity(a.data().len());
    for row in a.data().chunks(a.cols()) {
        let mut pairs = row.chunks_exact(2);
        for pair in pairs.by_ref() {
            out.push(-pair[1]);
            out.push(pair[0]);
        }
        out.extend_from_slice(pairs.remainder());
    }
    a.with_data(out)
}

/// Place `b` to the right of `a`. Row counts must match.
pub fn concat_columns(a: &Matrix, b: &Matrix) -> EngineResult<Matrix> {
    if a.rows() != b.rows() {
        return Err(EngineError::mismatch("concat_columns", a.shape(), b.shape()));
    }
    let data = a
        .data()
        .chunks(a.cols())
        .zip(b.data().chunks(b.cols()))
        .flat_map(|(left, right)| left.iter().chain(right.iter()).copied())
        .collect();
    Matrix::from_vec(a.rows(), a.cols() + b.cols(), data)
}

/// Stack a single-row matrix `n` times.
pub fn repeat_rows(row: &Matrix, n: usize) -> EngineResult<Matrix> {
    if row.rows() != 1 {
        return Err(EngineError::mismatch("repeat_rows", row.shape(), row.shape().transposed()));
    }
    let data = std::iter::repeat(row.data())
        .take(n)
        .flatten()
        .copied()
        .collect();
    Matrix::from_vec(n, row.cols(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;
    use approx::assert_relative_eq;

    #[test]
    fn test_relu() {
        let m = matrix![[-1, 0, 2.5]].unwrap();
        assert_eq!(relu(&m), matrix![[0, 0, 2.5]].unwrap());
    }

    #[test]
    fn test_sigmoid() {
        let s = sigmoid(&matrix![[0]].unwrap());
        assert_eq!(s.as_scalar(), Some(0.5));
    }

    #[test]
    fn test_tanh_derivative_at_zero() {
        let d = tanh_derivative(&matrix![[0, 100]].unwrap());
        assert_eq!(d.get(0, 0), Some(1.0));
        assert_relative_eq!(d.get(0, 1).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_softmax_rows() {
        let s = softmax(&matrix![[1, 2, 3], [0, 0, 0]].unwrap());
        let first: f64 = s.row_slice(0).unwrap().iter().sum();
        assert_relative_eq!(first, 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.get(1, 0).unwrap(), 1.0 / 3.0, epsilon = 1e-12);
        assert!(s.get(0, 2).unwrap() > s.get(0, 1).unwrap());
    }

    #[test]
    fn test_softmax_large_values_stable() {
        let s = softmax(&matrix![[1000, 1000]].unwrap());
        assert_eq!(s, matrix![[0.5, 0.5]].unwrap());
    }

    #[test]
    fn test_rope_pairs() {
        let r = rope_pair_rotation(&matrix![[1, 2, 3, 4]].unwrap());
        assert_eq!(r, matrix![[-2, 1, -4, 3]].unwrap());
    }

    #[test]
    fn test_rope_odd_tail() {
        let r = rope_pair_rotation(&matrix![[1, 2, 3]].unwrap());
        assert_eq!(r, matrix![[-2, 1, 3]].unwrap());
    }

    #[test]
    fn test_concat_columns() {
        let a = matrix![[1, 2]].unwrap();
        let b = matrix![[3]].unwrap();
        assert_eq!(concat_columns(&a, &b).unwrap(), matrix![[1, 2, 3]].unwrap());
        assert!(concat_columns(&a, &matrix![[1], [2]].unwrap()).is_err());
    }

    #[test]
    fn test_repeat_rows() {
        let r = repeat_rows(&matrix![[0.2, 0.8]].unwrap(), 2).unwrap();
        assert_eq!(r, matrix![[0.2, 0.8], [0.2, 0.8]].unwrap());
        assert!(repeat_rows(&r, 2).is_err());
        assert_eq!(repeat_rows(&matrix![[1]].unwrap(), 0), Err(EngineError::EmptyMatrix));
    }
}
