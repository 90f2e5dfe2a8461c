//! # Linear Regression Lab
//!
//! House prices (in $10,000s) from size and bedroom count:
//!
//! ```text
//! pred = X·w + b
//! L    = mean((pred - y)²)
//! ∇w   = (2/m)·Xᵀ·(pred - y)       w' = w - α∇w
//! ∇b   = (2/m)·Σ(pred - y)         b' = b - α∇b
//! ```
//!
//! Every intermediate is rounded to four decimals.

use matrixlab_core::{StepGraph, WorkflowSpec};
use matrixlab_engine::{matrix, Engine, RegressionLoss, Sgd};

use crate::error::ModuleResult;
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "linear-regression";

pub const LEARNING_RATE: f64 = 0.01;

pub struct LinearRegression {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
}

impl LinearRegression {
    pub fn new() -> ModuleResult<Self> {
        let engine = Engine::rounded(4);
        let loss = RegressionLoss::MeanSquared;
        let sgd = Sgd::new(LEARNING_RATE);

        let features = matrix![[1.0, 1.0], [1.5, 2.0], [2.0, 2.0], [2.5, 3.0], [3.0, 4.0]]?;
        let targets = matrix![[15.0], [22.5], [27.0], [35.0], [45.0]]?;
        let weights = matrix![[10.0], [2.0]]?;
        let bias = matrix![[2.0]]?;

        let prediction = engine.affine(&features, &weights, &bias)?;
        let grad_w = loss.weight_gradient(&engine, &features, &prediction, &targets)?;
        let grad_b = loss.bias_gradient(&engine, &prediction, &targets)?;

        let mut expected = ExpectedTable::new();
        expected.insert_scalar("loss", loss.value(&engine, &prediction, &targets)?);
        expected.insert("update-weights", sgd.update(&engine, &weights, &grad_w)?);
        expected.insert("update-bias", sgd.update(&engine, &bias, &grad_b)?);
        expected.insert("prediction", prediction);
        expected.insert("gradient-weights", grad_w);
        expected.insert("gradient-bias", grad_b);

        let graph = WorkflowSpec::new()
            .intro("intro-linear-regression")
            .calculation("prediction-calc", "prediction", &["intro-linear-regression"])
            .calculation("loss-calc", "loss", &["prediction-calc"])
            .calculation("grad-weights-calc", "gradient-weights", &["loss-calc"])
            .calculation("grad-bias-calc", "gradient-bias", &["loss-calc"])
            .calculation("update-weights", "update-weights", &["grad-weights-calc"])
            .calculation("update-bias", "update-bias", &["grad-bias-calc"])
            .focus("intro-linear-regression", &["prediction-calc"])
            .focus("prediction-calc", &["loss-calc"])
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

impl LearningModule for LinearRegression {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "Linear Regression"
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
