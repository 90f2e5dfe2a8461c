//! Loss functions.
//!
//! All return exact scalars; [`Engine`](crate::Engine) rounds the
//! regression losses.

use crate::error::{EngineError, EngineResult};
use crate::matrix::Matrix;

/// Added inside logarithms so `ln(0)` never happens.
pub const LOG_EPSILON: f64 = 1e-15;

fn check_same_shape(op: &'static str, a: &Matrix, b: &Matrix) -> EngineResult<()> {
    if a.shape() != b.shape() {
        return Err(EngineError::mismatch(op, a.shape(), b.shape()));
    }
    Ok(())
}

/// Mean squared error over every entry.
pub fn mse(predictions: &Matrix, targets: &Matrix) -> EngineResult<f64> {
    check_same_shape("mse", predictions, targets)?;
    let diff = predictions.sub(targets)?;
    Ok(diff.map(|d| d * d).mean())
}

/// Mean binary cross-entropy:
/// `mean(-(y·ln(p + ε) + (1 - y)·ln(1 - p + ε)))`.
pub fn binary_cross_entropy(predictions: &Matrix, targets: &Matrix) -> EngineResult<f64> {
    let terms = predictions.zip_with(targets, "binary_cross_entropy", |p, y| {
        -(y * (p + LOG_EPSILON).ln() + (1.0 - y) * (1.0 - p + LOG_EPSILON).ln())
    })?;
    Ok(terms.mean())
}

/// Cross-entropy of one prediction against a target distribution:
/// `-Σ t·ln(max(p, ε))`.
///
/// Per timestep; sequence losses sum these.
pub fn categorical_cross_entropy(predictions: &Matrix, targets: &Matrix) -> EngineResult<f64> {
    let terms = predictions.zip_with(targets, "categorical_cross_entropy", |p, t| {
        t * p.max(LOG_EPSILON).ln()
    })?;
    Ok(-terms.sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse() {
        let p = matrix![[1], [2]].unwrap();
        let y = matrix![[0], [0]].unwrap();
        assert_eq!(mse(&p, &y).unwrap(), 2.5);
    }

    #[test]
    fn test_mse_shape_mismatch() {
        let p = matrix![[1], [2]].unwrap();
        let y = matrix![[0, 0]].unwrap();
        assert!(matches!(
            mse(&p, &y),
            Err(EngineError::DimensionMismatch { op: "mse", .. })
        ));
    }

    #[test]
    fn test_bce_confident_and_correct() {
        let p = matrix![[0.999999], [0.000001]].unwrap();
        let y = matrix![[1], [0]].unwrap();
        assert!(binary_cross_entropy(&p, &y).unwrap() < 1e-5);
    }

    #[test]
    fn test_bce_half() {
        let p = matrix![[0.5]].unwrap();
        let y = matrix![[1]].unwrap();
        assert_relative_eq!(binary_cross_entropy(&p, &y).unwrap(), 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_categorical_cross_entropy() {
        let p = matrix![[0.25, 0.75]].unwrap();
        let t = matrix![[0, 1]].unwrap();
        assert_relative_eq!(
            categorical_cross_entropy(&p, &t).unwrap(),
            -(0.75f64).ln(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_categorical_cross_entropy_clamps_zero() {
        let p = matrix![[0, 1]].unwrap();
        let t = matrix![[1, 0]].unwrap();
        assert_relative_eq!(
            categorical_cross_entropy(&p, &t).unwrap(),
            -(LOG_EPSILON.ln()),
            epsilon = 1e-9
        );
    }
}
