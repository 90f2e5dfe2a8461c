//! # MatrixLab Engine - Numeric Routines for the Labs
//!
//! Pure functions over small dense `f64` matrices. Nothing here knows about
//! steps, users or gating; the modules crate composes these routines into
//! the expected answers of each lab.
//!
//! ## Modules
//!
//! - [`matrix`]: the `Matrix` value type and exact arithmetic
//! - [`engine`]: arithmetic under a [`Rounding`] policy
//! - [`ops`]: activations, softmax, RoPE rotation, reshaping
//! - [`conv`]: convolution, max-pooling, flatten, dense
//! - [`loss`]: MSE, binary and categorical cross-entropy
//! - [`backward`]: regression gradients
//! - [`optim`]: the single SGD update step
//! - [`recurrent`]: RNN forward pass and BPTT
//! - [`attention`]: scaled dot-product attention
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_engine::{matrix, Engine, RegressionLoss};
//!
//! let engine = Engine::rounded(4);
//! let x = matrix![[1, 1], [1.5, 2], [2, 2], [2.5, 3], [3, 4]].unwrap();
//! let w = matrix![[10], [2]].unwrap();
//! let b = matrix![[2]].unwrap();
//! let y = matrix![[15], [22.5], [27], [35], [45]].unwrap();
//!
//! let pred = engine.affine(&x, &w, &b).unwrap();
//! let loss = RegressionLoss::MeanSquared.value(&engine, &pred, &y).unwrap();
//! assert_eq!(loss, 6.65);
//! ```

pub mod attention;
pub mod backward;
pub mod conv;
pub mod engine;
pub mod error;
pub mod loss;
pub mod matrix;
pub mod ops;
pub mod optim;
pub mod recurrent;

pub use attention::{scaled_dot_product, Attention};
pub use backward::RegressionLoss;
pub use engine::{Engine, Rounding};
pub use error::{EngineError, EngineResult};
pub use matrix::Matrix;
pub use optim::Sgd;
pub use recurrent::{RnnGradients, RnnParams, Timestep, TimestepGrads};
