//! # Recurrent Network Lab
//!
//! A two-token sequence over the vocabulary `{A, B}`: input `A` should
//! predict `B`, then input `B` should predict `A`. The user runs both
//! timesteps forward, sums the cross-entropy, then walks back through time
//! to every weight gradient.
//!
//! Hidden size 4, vocabulary size 2, `h_0 = 0`, no rounding.

use matrixlab_core::{StepGraph, WorkflowSpec};
use matrixlab_engine::recurrent::sequence_loss;
use matrixlab_engine::{matrix, RnnParams};

use crate::error::ModuleResult;
use crate::module::{check_expectations, Dataset, ExpectedTable, LearningModule};

pub const SLUG: &str = "rnn";

pub struct Rnn {
    graph: StepGraph,
    dataset: Dataset,
    expected: ExpectedTable,
}

impl Rnn {
    pub fn new() -> ModuleResult<Self> {
        let params = RnnParams {
            w_xh: matrix![[0.5, -0.2, 0.8, 0.1], [0.3, 0.6, -0.4, 0.9]]?,
            w_hh: matrix![
                [0.2, 0.5, -0.3, 0.4],
                [-0.1, 0.7, 0.6, -0.2],
                [0.8, -0.4, 0.1, 0.9],
                [0.3, -0.1, 0.5, 0.7]
            ]?,
            w_hy: matrix![[0.6, -0.3], [-0.2, 0.8], [0.9, -0.1], [0.3, 0.7]]?,
            b_h: matrix![[0.1, 0.1, 0.1, 0.1]]?,
            b_y: matrix![[0.1, 0.1]]?,
        };
        let token_a = matrix![[1, 0]]?;
        let token_b = matrix![[0, 1]]?;
        let inputs = vec![token_a.clone(), token_b.clone()];
        let targets = vec![token_b, token_a];

        let steps = params.forward(&inputs)?;
        let (_, total_loss) = sequence_loss(&steps, &targets)?;
        let grads = params.backward(&steps, &targets)?;

        let mut expected = ExpectedTable::new();
        for (t, (step, grad)) in steps.iter().zip(&grads.steps).enumerate() {
            let n = t + 1;
            expected.insert(&format!("h{}", n), step.hidden.clone());
            expected.insert(&format!("y{}", n), step.logits.clone());
            expected.insert(&format!("pred{}", n), step.prediction.clone());
            expected.insert(&format!("d_pred{}", n), grad.d_prediction.clone());
            expected.insert(&format!("d_y{}", n), grad.d_logits.clone());
            expected.insert(&format!("d_h{}", n), grad.d_hidden.clone());
        }
        expected.insert_scalar("total_loss", total_loss);
        expected.insert("d_w_hy", grads.w_hy);
        expected.insert("d_b_y", grads.b_y);
        expected.insert("d_w_xh", grads.w_xh);
        expected.insert("d_w_hh", grads.w_hh);
        expected.insert("d_b_h", grads.b_h);

        let graph = WorkflowSpec::new()
            .intro("intro-rnn")
            // Forward
            .calculation("t1_calc_h", "h1", &["intro-rnn"])
            .calculation("t1_calc_y", "y1", &["t1_calc_h"])
            .calculation("t1_pred", "pred1", &["t1_calc_y"])
            .calculation("t2_calc_h", "h2", &["t1_pred"])
            .calculation("t2_calc_y", "y2", &["t2_calc_h"])
            .calculation("t2_pred", "pred2", &["t2_calc_y"])
            .calculation("loss_calculation", "total_loss", &["t2_pred"])
            // Backward
            .calculation("grad_pred1", "d_pred1", &["loss_calculation"])
            .calculation("grad_pred2", "d_pred2", &["loss_calculation"])
            .calculation("grad_y1", "d_y1", &["grad_pred1"])
            .calculation("grad_y2", "d_y2", &["grad_pred2"])
            .calculation("grad_h2", "d_h2", &["grad_y2"])
            .calculation("grad_h1", "d_h1", &["grad_y1", "grad_h2"])
            .calculation("grad_why", "d_w_hy", &["grad_h1"])
            .calculation("grad_by", "d_b_y", &["grad_h1"])
            .calculation("grad_wxh", "d_w_xh", &["grad_h1"])
            .calculation("grad_whh", "d_w_hh", &["grad_h1"])
            .calculation("grad_bh", "d_b_h", &["grad_h1"])
            .focus("intro-rnn", &["t1_calc_h"])
            .focus("t1_calc_h", &["t1_calc_y"])
            .focus("t1_calc_y", &["t1_pred"])
            .focus("t1_pred", &["t2_calc_h"])
            .focus("t2_calc_h", &["t2_calc_y"])
            .focus("t2_calc_y", &["t2_pred"])
            .focus("t2_pred", &["loss_calculation"])
            .focus("loss_calculation", &["grad_pred1", "grad_pred2"])
            .focus("grad_pred2", &["grad_y2"])
            .focus("grad_y1", &["grad_h1"])
            .focus("grad_h2", &["grad_h1"])
            .focus("grad_h1", &["grad_why", "grad_wxh", "grad_whh", "grad_bh"])
            .build()?;
        check_expectations(SLUG, &graph, &expected)?;

        let previous = steps
            .first()
            .map(|s| s.hidden.clone())
            .unwrap_or_else(|| params.initial_hidden());
        let dataset = Dataset::new()
            .with("t1_input", inputs[0].clone())
            .with("t1_h_prev", params.initial_hidden())
            .with("t2_input", inputs[1].clone())
            .with("t2_h_prev", previous)
            .with("target_t1", targets[0].clone())
            .with("target_t2", targets[1].clone())
            .with("w_xh", params.w_xh)
            .with("w_hh", params.w_hh)
            .with("w_hy", params.w_hy)
            .with("b_h", params.b_h)
            .with("b_y", params.b_y);

        Ok(Self {
            graph,
            dataset,
            expected,
        })
    }
}

impl LearningModule for Rnn {
    fn slug(&self) -> &'static str {
        SLUG
    }

    fn title(&self) -> &'static str {
        "Recurrent Neural Networks"
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
