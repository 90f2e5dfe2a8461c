//! # MatrixLab Modules - The Labs
//!
//! Each lab fixes a toy dataset, runs the [`matrixlab_engine`] once to
//! produce every expected answer, and declares the step graph the
//! [`matrixlab_core`] gate walks the user through.
//!
//! ## Labs
//!
//! | slug | module |
//! |------|--------|
//! | `rnn` | [`rnn`] |
//! | `linear-regression` | [`linear_regression`] |
//! | `logistic-regression` | [`logistic_regression`] |
//! | `cnn` | [`cnn`] |
//! | `multi-head-latent-attention` | [`mla`] |
//! | `mla-query-compression` | [`mla_query_compression`] |
//! | `mla-rope` | [`mla_rope`] |
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_modules::catalog;
//!
//! let cnn = catalog::load("cnn").unwrap();
//! let pooled = cnn.calculate_expected("pooling").unwrap();
//! assert_eq!(pooled.to_rows(), vec![vec![30.0, 30.0], vec![20.0, 20.0]]);
//! ```

pub mod catalog;
pub mod cnn;
pub mod error;
pub mod linear_regression;
pub mod logistic_regression;
pub mod mla;
pub mod mla_query_compression;
pub mod mla_rope;
pub mod module;
pub mod rnn;
pub mod session;

pub use catalog::{catalog, load};
pub use error::{ModuleError, ModuleResult};
pub use module::{Dataset, ExpectedTable, LearningModule};
pub use session::{LabSession, SessionSnapshot, StepSnapshot};
