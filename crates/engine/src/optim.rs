//! # Gradient Descent Update
//!
//! The labs show one update step, `param - lr · grad`, as a snapshot. There
//! is no training loop: every call returns a new parameter matrix and leaves
//! the old one untouched.

use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::EngineResult;
use crate::matrix::Matrix;

/// Plain stochastic gradient descent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    /// `param - lr · grad`, rounded per `engine`.
    pub fn update(&self, engine: &Engine, param: &Matrix, grad: &Matrix) -> EngineResult<Matrix> {
        let step = engine.scale(grad, self.learning_rate);
        engine.subtract(param, &step)
    }
}
