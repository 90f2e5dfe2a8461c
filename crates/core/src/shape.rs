//! # Shapes - Matrix Dimensions
//!
//! Every value in a lab module is a small dense matrix. A shape is the
//! `rows × cols` pair that operations check before they combine two
//! matrices, and that errors carry when they refuse to.
//!
//! Shapes never describe empty matrices: both dimensions are at least 1
//! for anything produced by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The dimensions of a 2-D matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// A 1×1 shape.
    pub fn scalar() -> Self {
        Self::new(1, 1)
    }

    /// A single row of `len` entries.
    pub fn row(len: usize) -> Self {
        Self::new(1, len)
    }

    /// Total number of entries.
    pub fn numel(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// Shape after swapping rows and columns.
    pub fn transposed(&self) -> Self {
        Self::new(self.cols, self.rows)
    }

    /// Whether `self · other` is defined (inner dimensions agree).
    pub fn can_multiply(&self, other: &Shape) -> bool {
        self.cols == other.rows
    }

    /// Shape of `self · other`, if defined.
    pub fn product(&self, other: &Shape) -> Option<Shape> {
        self.can_multiply(other)
            .then(|| Shape::new(self.rows, other.cols))
    }

    /// Element-wise operations need identical shapes.
    pub fn is_compatible(&self, other: &Shape) -> bool {
        self == other
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
