//! # Regression Gradients
//!
//! Closed-form gradients for a linear model `pred = f(X·w + b)` under the
//! two regression losses the labs use:
//!
//! - `∂L/∂w = (c/m) · Xᵀ · (pred - y)`
//! - `∂L/∂b = (c/m) · Σ(pred - y)`
//!
//! `c` depends on the loss: 2 for mean squared error (the derivative of the
//! square), 1 for binary cross-entropy after a sigmoid. It is a property of
//! [`RegressionLoss`], never a shared constant.
//!
//! All arithmetic goes through an [`Engine`], so the regression modules get
//! their rounding at each intermediate.

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionLoss {
    MeanSquared,
    BinaryCrossEntropy,
}

impl RegressionLoss {
    /// The `c` in `(c/m)`.
    pub fn gradient_factor(self) -> f64 {
        match self {
            RegressionLoss::MeanSquared => 2.0,
            RegressionLoss::BinaryCrossEntropy => 1.0,
        }
    }

    /// Loss value under `engine`'s rounding.
    pub fn value(self, engine: &Engine, predictions: &Matrix, targets: &Matrix) -> EngineResult<f64> {
        match self {
            RegressionLoss::MeanSquared => engine.mse(predictions, targets),
            RegressionLoss::BinaryCrossEntropy => engine.binary_cross_entropy(predictions, targets),
        }
    }

    /// `(c/m) · Xᵀ · (pred - y)` where `m` is the number of samples.
    pub fn weight_gradient(
        self,
        engine: &Engine,
        features: &Matrix,
        predictions: &Matrix,
        targets: &Matrix,
    ) -> EngineResult<Matrix> {
        let m = features.rows() as f64;
        let error = engine.subtract(predictions, targets)?;
        let grad = engine.multiply(&engine.transpose(features), &error)?;
        Ok(engine.scale(&grad, self.gradient_factor() / m))
    }

    /// `(c/m) · Σ(pred - y)` as a 1×1 matrix.
    ///
    /// Predictions must be a single column.
    pub fn bias_gradient(
        self,
        engine: &Engine,
        predictions: &Matrix,
        targets: &Matrix,
    ) -> EngineResult<Matrix> {
        if predictions.cols() != 1 {
            return Err(EngineError::mismatch(
                "bias_gradient",
                predictions.shape(),
                targets.shape(),
            ));
        }
        let m = predictions.rows() as f64;
        let error = engine.subtract(predictions, targets)?;
        let value = self.gradient_factor() * error.sum() / m;
        Ok(Matrix::scalar(engine.round(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;

    fn linear_case() -> (Matrix, Matrix, Matrix) {
        let x = matrix![[1, 1], [1.5, 2], [2, 2], [2.5, 3], [3, 4]].unwrap();
        let pred = matrix![[14], [21], [26], [33], [40]].unwrap();
        let y = matrix![[15], [22.5], [27], [35], [45]].unwrap();
        (x, pred, y)
    }

    #[test]
    fn test_gradient_factor() {
        assert_eq!(RegressionLoss::MeanSquared.gradient_factor(), 2.0);
        assert_eq!(RegressionLoss::BinaryCrossEntropy.gradient_factor(), 1.0);
    }

    #[test]
    fn test_mse_weight_gradient() {
        let (x, pred, y) = linear_case();
        let engine = Engine::rounded(4);
        let grad = RegressionLoss::MeanSquared
            .weight_gradient(&engine, &x, &pred, &y)
            .unwrap();
        assert_eq!(grad, matrix![[-10.1], [-12.8]].unwrap());
    }

    #[test]
    fn test_mse_bias_gradient() {
        let (_, pred, y) = linear_case();
        let engine = Engine::rounded(4);
        let grad = RegressionLoss::MeanSquared
            .bias_gradient(&engine, &pred, &y)
            .unwrap();
        assert_eq!(grad, Matrix::scalar(-4.2));
    }

    #[test]
    fn test_bce_uses_unit_factor() {
        let engine = Engine::exact();
        let x = matrix![[1], [1]].unwrap();
        let pred = matrix![[0.75], [0.25]].unwrap();
        let y = matrix![[1], [1]].unwrap();
        let gw = RegressionLoss::BinaryCrossEntropy
            .weight_gradient(&engine, &x, &pred, &y)
            .unwrap();
        let gb = RegressionLoss::BinaryCrossEntropy
            .bias_gradient(&engine, &pred, &y)
            .unwrap();
        assert_eq!(gw, Matrix::scalar(-0.5));
        assert_eq!(gb, Matrix::scalar(-0.5));
    }

    #[test]
    fn test_bias_gradient_needs_column() {
        let engine = Engine::exact();
        let pred = matrix![[1, 2]].unwrap();
        assert!(RegressionLoss::MeanSquared
            .bias_gradient(&engine, &pred, &pred)
            .is_err());
    }
}
