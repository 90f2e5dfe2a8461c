//! # Logistic Regression Lab
//!
//! University admission from two exam scores. Same shape as the linear lab
//! with a sigmoid between the linear step and the loss, binary
//! cross-entropy in place of MSE and a gradient factor of 1:
//!
//! ```text
//! z  = X·w + b        a = σ(z)
//! L  = mean(-(y·ln a + (1-y)·ln(1-a)))
//! ∇w = (1/m)·Xᵀ·(a - y)
//! ∇b = (1/m)·Σ(a - y)
//! ```

use matrixlab_core::{StepGraph, WorkflowSpec};
use matrixlab_engine::{matrix, Engine, RegressionLoss, Sgd};

use crate::error::ModuleResult;
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "logistic-regression";

pub const LEARNING_RATE: f64 = 0.001;

pub struct LogisticRegression {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
}

impl LogisticRegression {
    pub fn new() -> ModuleResult<Self> {
        let engine = Engine::rounded(4);
        let loss = RegressionLoss::BinaryCrossEntropy;
        let sgd = Sgd::new(LEARNING_RATE);

        let features = matrix![
            [78.0, 85.0],
            [82.0, 76.0],
            [90.0, 92.0],
            [65.0, 70.0],
            [88.0, 95.0],
            [72.0, 68.0]
        ]?;
        let targets = matrix![[0], [0], [1], [0], [1], [0]]?;
        let weights = matrix![[0.01], [0.02]]?;
        let bias = matrix![[-1.5]]?;

        let linear = engine.affine(&features, &weights, &bias)?;
        let activation = engine.sigmoid(&linear);
        let grad_w = loss.weight_gradient(&engine, &features, &activation, &targets)?;
        let grad_b = loss.bias_gradient(&engine, &activation, &targets)?;

        let mut expected = ExpectedTable::new();
        expected.insert_scalar("loss", loss.value(&engine, &activation, &targets)?);
        expected.insert("update-weights", sgd.update(&engine, &weights, &grad_w)?);
        expected.insert("update-bias", sgd.update(&engine, &bias, &grad_b)?);
        expected.insert("linear", linear);
        expected.insert("sigmoid", activation);
        expected.insert("gradient-weights", grad_w);
        expected.insert("gradient-bias", grad_b);

        let graph = WorkflowSpec::new()
            .intro("intro-logistic-regression")
            .calculation("linear-calc", "linear", &["intro-logistic-regression"])
            .calculation("sigmoid-calc", "sigmoid", &["linear-calc"])
            .calculation("loss-calc", "loss", &["sigmoid-calc"])
            .calculation("grad-weights-calc", "gradient-weights", &["loss-calc"])
            .calculation("grad-bias-calc", "gradient-bias", &["loss-calc"])
            .calculation("update-weights", "update-weights", &["grad-weights-calc"])
            .calculation("update-bias", "update-bias", &["grad-bias-calc"])
            .focus("intro-logistic-regression", &["linear-calc"])
            .focus("linear-calc", &["sigmoid-calc"])
            .focus("sigmoid-calc", &["loss-calc"])
            .focus("loss-calc", &["grad-weights-calc", "grad-bias-calc"])
            .focus("grad-weights-calc", &["update-weights"])
            .focus("grad-bias-calc", &["update-bias"])
            .build()?;
        check_expectations(SLUG, &graph, &expected)?;

        let dataset = Dataset::new()
            .with("features", features)
            .with("target", targets)
            .with("weights", weights)
            .with("bias", bias)
            .with_scalar("learning_rate", LEARNING_RATE);

        Ok(Self {
            graph,
            dataset,
            expected,
        })
    }
}

impl LearningModule for LogisticRegression {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "Logistic Regression"
    }

    fn workflow(&self) -> &StepGraph {
        &self.graph
    }

    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn expected(&self) -> &ExpectedTable {
        &self.expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixlab_engine::Matrix;

    #[test]
    fn test_linear_and_sigmoid() {
        let lab = LogisticRegression::new().unwrap();
        assert_eq!(
            lab.calculate_expected("linear").unwrap(),
            &matrix![[0.98], [0.84], [1.24], [0.55], [1.28], [0.58]].unwrap()
        );
        assert_eq!(
            lab.calculate_expected("sigmoid").unwrap(),
            &matrix![[0.7271], [0.6985], [0.7756], [0.6341], [0.7824], [0.6411]].unwrap()
        );
    }

    #[test]
    fn test_loss_and_gradients() {
        let lab = LogisticRegression::new().unwrap();
        assert_eq!(lab.calculate_expected("loss").unwrap(), &Matrix::scalar(0.8379));
        assert_eq!(
            lab.calculate_expected("gradient-weights").unwrap(),
            &matrix![[27.0036], [26.9258]].unwrap()
        );
        assert_eq!(lab.calculate_expected("gradient-bias").unwrap(), &Matrix::scalar(0.3765));
        assert_eq!(
            lab.calculate_expected("update-weights").unwrap(),
            &matrix![[-0.017], [-0.0069]].unwrap()
        );
        assert_eq!(lab.calculate_expected("update-bias").unwrap(), &Matrix::scalar(-1.5004));
    }

    #[test]
    fn test_sigmoid_waits_for_linear() {
        let lab = LogisticRegression::new().unwrap();
        assert_eq!(
            lab.workflow().prerequisites("sigmoid-calc").unwrap(),
            &["linear-calc".to_string()]
        );
    }
}
