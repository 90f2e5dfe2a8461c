//! Errors raised by numeric routines.
//!
//! A dimension mismatch is never coerced: the computation that hit it is
//! abandoned and the error names the operation and both operand shapes.

use matrixlab_core::Shape;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Operand shapes are incompatible for `op`.
    #[error("Dimension mismatch in {op}: {left} vs {right}")]
    DimensionMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    /// A matrix needs at least one row and one column.
    #[error("Matrix must have at least one row and one column")]
    EmptyMatrix,

    /// Row `row` has a different length from row 0.
    #[error("Ragged matrix: row {row} has {len} entries, expected {expected}")]
    RaggedMatrix {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// Pooling window or stride that cannot be applied to the input.
    #[error("Invalid window: pool {pool}, stride {stride} over {input}")]
    InvalidWindow {
        pool: usize,
        stride: usize,
        input: Shape,
    },

    /// Two sequences that must pair up have different lengths.
    #[error("Sequence length mismatch in {op}: {expected} vs {got}")]
    SequenceLength {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    /// A routine that needs a non-empty sequence got none.
    #[error("Empty sequence passed to {op}")]
    EmptySequence { op: &'static str },
}

impl EngineError {
    pub(crate) fn mismatch(op: &'static str, left: Shape, right: Shape) -> Self {
        EngineError::DimensionMismatch { op, left, right }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
