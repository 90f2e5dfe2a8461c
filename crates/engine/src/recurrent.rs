//! # Recurrent Network
//!
//! A vanilla RNN with a softmax output, run forward over a sequence and
//! differentiated with backpropagation through time.
//!
//! ## Forward
//!
//! ```text
//! pre_t = x_t·W_xh + h_{t-1}·W_hh + b_h
//! h_t   = tanh(pre_t)
//! y_t   = h_t·W_hy + b_y
//! ŷ_t   = softmax(y_t)
//! ```
//!
//! with `h_0 = 0`.
//!
//! ## Backward
//!
//! With cross-entropy on a softmax, `∂L/∂y_t = ŷ_t - target_t`. Walking the
//! sequence from the end:
//!
//! ```text
//! ∂L/∂h_t = ∂L/∂y_t·W_hyᵀ + δ_{t+1}·W_hhᵀ     (second term absent at the end)
//! δ_t     = ∂L/∂h_t ⊙ (1 - tanh²(pre_t))
//! ```
//!
//! Weight gradients are summed over every timestep because the weights are
//! shared.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::loss::categorical_cross_entropy;
use crate::matrix::Matrix;
use crate::ops::{softmax, tanh, tanh_derivative};
use matrixlab_core::Shape;

/// Shared weights of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnParams {
    /// `input × hidden`
    pub w_xh: Matrix,
    /// `hidden × hidden`
    pub w_hh: Matrix,
    /// `hidden × output`
    pub w_hy: Matrix,
    /// `1 × hidden`
    pub b_h: Matrix,
    /// `1 × output`
    pub b_y: Matrix,
}

/// Everything the forward pass computed at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestep {
    pub input: Matrix,
    /// Hidden state coming in (`h_{t-1}`).
    pub previous: Matrix,
    /// Pre-activation, kept for `tanh'`.
    pub pre: Matrix,
    pub hidden: Matrix,
    pub logits: Matrix,
    pub prediction: Matrix,
}

/// Gradients at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestepGrads {
    /// `∂L/∂ŷ_t`, taken as `ŷ_t - target_t`.
    pub d_prediction: Matrix,
    /// `∂L/∂y_t`. Equal to `d_prediction` for softmax with cross-entropy.
    pub d_logits: Matrix,
    /// `∂L/∂h_t`, including the contribution from later timesteps.
    pub d_hidden: Matrix,
    /// `∂L/∂pre_t`.
    pub delta: Matrix,
}

/// Weight gradients summed over the sequence, plus the per-step terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnGradients {
    pub steps: Vec<TimestepGrads>,
    pub w_xh: Matrix,
    pub w_hh: Matrix,
    pub w_hy: Matrix,
    pub b_h: Matrix,
    pub b_y: Matrix,
}

impl RnnParams {
    pub fn hidden_size(&self) -> usize {
        self.w_hh.rows()
    }

    /// The zero initial hidden state.
    pub fn initial_hidden(&self) -> Matrix {
        Matrix::zeros(Shape::row(self.hidden_size()))
    }

    /// One timestep from input `x` and previous hidden state `h_prev`.
    pub fn step(&self, x: &Matrix, h_prev: &Matrix) -> EngineResult<Timestep> {
        let pre = x
            .matmul(&self.w_xh)?
            .add(&h_prev.matmul(&self.w_hh)?)?
            .add(&self.b_h)?;
        let hidden = tanh(&pre);
        let logits = hidden.matmul(&self.w_hy)?.add(&self.b_y)?;
        let prediction = softmax(&logits);
        Ok(Timestep {
            input: x.clone(),
            previous: h_prev.clone(),
            pre,
            hidden,
            logits,
            prediction,
        })
    }

    /// Run the whole sequence from `h_0 = 0`.
    pub fn forward(&self, inputs: &[Matrix]) -> EngineResult<Vec<Timestep>> {
        if inputs.is_empty() {
            return Err(EngineError::EmptySequence { op: "rnn_forward" });
        }
        let mut steps: Vec<Timestep> = Vec::with_capacity(inputs.len());
        let mut h = self.initial_hidden();
        for x in inputs {
            let step = self.step(x, &h)?;
            h = step.hidden.clone();
            steps.push(step);
        }
        Ok(steps)
    }

    /// Backpropagation through time over a forward trace.
    pub fn backward(&self, steps: &[Timestep], targets: &[Matrix]) -> EngineResult<RnnGradients> {
        check_lengths("rnn_backward", steps, targets)?;

        let w_hy_t = self.w_hy.transpose();
        let w_hh_t = self.w_hh.transpose();

        let mut grads = RnnGradients {
            steps: Vec::with_capacity(steps.len()),
            w_xh: Matrix::zeros(self.w_xh.shape()),
            w_hh: Matrix::zeros(self.w_hh.shape()),
            w_hy: Matrix::zeros(self.w_hy.shape()),
            b_h: Matrix::zeros(self.b_h.shape()),
            b_y: Matrix::zeros(self.b_y.shape()),
        };

        let mut next_delta: Option<Matrix> = None;
        for (step, target) in steps.iter().zip(targets).rev() {
            let d_prediction = step.prediction.sub(target)?;
            let d_logits = d_prediction.clone();

            let mut d_hidden = d_logits.matmul(&w_hy_t)?;
            if let Some(delta) = &next_delta {
                d_hidden = d_hidden.add(&delta.matmul(&w_hh_t)?)?;
            }
            let delta = d_hidden.hadamard(&tanh_derivative(&step.pre))?;

            grads.w_hy = grads.w_hy.add(&step.hidden.transpose().matmul(&d_logits)?)?;
            grads.b_y = grads.b_y.add(&d_logits)?;
            grads.w_xh = grads.w_xh.add(&step.input.transpose().matmul(&delta)?)?;
            grads.w_hh = grads.w_hh.add(&step.previous.transpose().matmul(&delta)?)?;
            grads.b_h = grads.b_h.add(&delta)?;

            next_delta = Some(delta.clone());
            grads.steps.push(TimestepGrads {
                d_prediction,
                d_logits,
                d_hidden,
                delta,
            });
        }
        grads.steps.reverse();
        Ok(grads)
    }
}

/// Per-timestep cross-entropy and their sum.
pub fn sequence_loss(steps: &[Timestep], targets: &[Matrix]) -> EngineResult<(Vec<f64>, f64)> {
    check_lengths("sequence_loss", steps, targets)?;
    let per_step = steps
        .iter()
        .zip(targets)
        .map(|(step, target)| categorical_cross_entropy(&step.prediction, target))
        .collect::<EngineResult<Vec<f64>>>()?;
    let total = per_step.iter().sum();
    Ok((per_step, total))
}

fn check_lengths(op: &'static str, steps: &[Timestep], targets: &[Matrix]) -> EngineResult<()> {
    if steps.is_empty() {
        return Err(EngineError::EmptySequence { op });
    }
    if steps.len() != targets.len() {
        return Err(EngineError::SequenceLength {
            op,
            expected: steps.len(),
            got: targets.len(),
        });
    }
    Ok(())
}
