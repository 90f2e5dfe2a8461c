//! # Cell Validation
//!
//! Users fill in an output matrix one cell at a time, in raster order.
//! Only the active cell accepts input; a correct answer moves on to the
//! next cell and the step is complete once the bottom-right cell is
//! answered correctly.
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_core::validation::{CellGrid, Verdict};
//!
//! let mut grid = CellGrid::new(vec![vec![30.0, 30.0], vec![20.0, 20.0]], 0.01).unwrap();
//! assert_eq!(grid.verify("30").unwrap(), Verdict::Advanced { row: 0, col: 1 });
//! assert_eq!(grid.verify("29").unwrap(), Verdict::Incorrect);
//! assert!(grid.verify("thirty").is_err());
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LabError;

/// Equality tolerance used when no configuration overrides it.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Validation outcome of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    #[default]
    Unvalidated,
    Correct,
    Incorrect,
}

/// Result of checking the active cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    /// Correct; the next cell is now active.
    Advanced { row: usize, col: usize },
    /// Correct, and it was the last cell.
    Completed,
    /// Parsed but outside tolerance. The same cell stays active.
    Incorrect,
}

/// The input window an output cell reads, for highlighting.
///
/// Output cell `(r, c)` reads rows `r*stride .. r*stride+height` and
/// columns `c*stride .. c*stride+width` of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub height: usize,
    pub width: usize,
    pub stride: usize,
}

/// Parse a user answer. Surrounding whitespace is ignored; anything that is
/// not a finite number is rejected.
pub fn parse_answer(input: &str) -> Result<f64, LabError> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LabError::InvalidUserInput {
            input: input.to_string(),
        }),
    }
}

/// Raster-order answer grid for one calculation step.
#[derive(Debug, Clone)]
pub struct CellGrid {
    rows: usize,
    cols: usize,
    expected: Vec<f64>,
    drafts: Vec<String>,
    statuses: Vec<CellStatus>,
    /// Row-major index of the active cell; `expected.len()` once complete.
    cursor: usize,
    tolerance: f64,
    window: Option<Window>,
}

impl CellGrid {
    /// Build a grid over a rectangular expected matrix.
    ///
    /// # Errors
    ///
    /// `InvalidGrid` if the matrix is empty or ragged, or the tolerance is
    /// not a positive finite number.
    pub fn new(expected: Vec<Vec<f64>>, tolerance: f64) -> Result<Self, LabError> {
        let rows = expected.len();
        let cols = expected.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(LabError::InvalidGrid {
                reason: "expected matrix is empty".to_string(),
            });
        }
        if expected.iter().any(|row| row.len() != cols) {
            return Err(LabError::InvalidGrid {
                reason: "expected matrix is ragged".to_string(),
            });
        }
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(LabError::InvalidGrid {
                reason: format!("tolerance {} must be positive", tolerance),
            });
        }

        let expected: Vec<f64> = expected.into_iter().flatten().collect();
        let len = expected.len();
        Ok(Self {
            rows,
            cols,
            expected,
            drafts: vec![String::new(); len],
            statuses: vec![CellStatus::Unvalidated; len],
            cursor: 0,
            tolerance,
            window: None,
        })
    }

    /// Attach the input window each output cell reads.
    pub fn with_window(mut self, height: usize, width: usize, stride: usize) -> Self {
        self.window = Some(Window {
            height,
            width,
            stride,
        });
        self
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// `(row, col)` of the cell accepting input, `None` once complete.
    pub fn active_cell(&self) -> Option<(usize, usize)> {
        (self.cursor < self.expected.len()).then(|| (self.cursor / self.cols, self.cursor % self.cols))
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.expected.len()
    }

    pub fn status(&self, row: usize, col: usize) -> Option<CellStatus> {
        self.offset(row, col).map(|i| self.statuses[i])
    }

    /// Statuses as rows.
    pub fn statuses(&self) -> Vec<Vec<CellStatus>> {
        self.statuses.chunks(self.cols).map(<[_]>::to_vec).collect()
    }

    /// Drafts as rows.
    pub fn drafts(&self) -> Vec<Vec<String>> {
        self.drafts.chunks(self.cols).map(<[_]>::to_vec).collect()
    }

    /// Number of cells answered correctly.
    pub fn correct_count(&self) -> usize {
        self.cursor.min(self.expected.len())
    }

    /// Replace the active cell's draft. Editing resets its status.
    ///
    /// Edits to any other cell are ignored and reported as `false`.
    pub fn edit(&mut self, row: usize, col: usize, draft: &str) -> bool {
        if self.active_cell() != Some((row, col)) {
            return false;
        }
        let i = self.cursor;
        self.drafts[i] = draft.to_string();
        self.statuses[i] = CellStatus::Unvalidated;
        true
    }

    /// Check the current draft of the active cell.
    pub fn verify_draft(&mut self) -> Result<Verdict, LabError> {
        let draft = self
            .drafts
            .get(self.cursor)
            .cloned()
            .unwrap_or_default();
        self.verify(&draft)
    }

    /// Check `input` against the active cell.
    ///
    /// A grid that is already complete reports `Completed` again.
    ///
    /// # Errors
    ///
    /// `InvalidUserInput` if `input` is not a number. The cell is marked
    /// incorrect and stays active.
    pub fn verify(&mut self, input: &str) -> Result<Verdict, LabError> {
        let Some((row, col)) = self.active_cell() else {
            return Ok(Verdict::Completed);
        };
        let i = self.cursor;
        self.drafts[i] = input.to_string();

        let value = match parse_answer(input) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "matrixlab-core", "cell ({}, {}): {}", row, col, err);
                self.statuses[i] = CellStatus::Incorrect;
                return Err(err);
            }
        };

        let expected = self.expected[i];
        if (value - expected).abs() < self.tolerance {
            self.statuses[i] = CellStatus::Correct;
            self.cursor += 1;
            debug!(target: "matrixlab-core", "cell ({}, {}) correct", row, col);
            Ok(match self.active_cell() {
                Some((row, col)) => Verdict::Advanced { row, col },
                None => Verdict::Completed,
            })
        } else {
            self.statuses[i] = CellStatus::Incorrect;
            debug!(target: "matrixlab-core", "cell ({}, {}) incorrect: {} vs {}", row, col, value, expected);
            Ok(Verdict::Incorrect)
        }
    }

    /// Input cells read by the active cell, row-major. Empty when the grid
    /// has no window or is complete.
    pub fn highlight(&self) -> Vec<(usize, usize)> {
        let (Some(window), Some((row, col))) = (self.window, self.active_cell()) else {
            return Vec::new();
        };
        let top = row * window.stride;
        let left = col * window.stride;
        (top..top + window.height)
            .flat_map(|r| (left..left + window.width).map(move |c| (r, c)))
            .collect()
    }

    /// Back to the first cell with every status unvalidated.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.drafts.iter_mut().for_each(String::clear);
        self.statuses.fill(CellStatus::Unvalidated);
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pooled() -> CellGrid {
        CellGrid::new(vec![vec![30.0, 30.0], vec![20.0, 20.0]], DEFAULT_TOLERANCE).unwrap()
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer(" 2.5 ").unwrap(), 2.5);
        assert_eq!(parse_answer("-1e-3").unwrap(), -0.001);
        assert!(parse_answer("").is_err());
        assert!(parse_answer("abc").is_err());
        assert!(parse_answer("NaN").is_err());
        assert!(parse_answer("inf").is_err());
    }

    #[test]
    fn test_raster_order() {
        let mut grid = pooled();
        assert_eq!(grid.active_cell(), Some((0, 0)));
        assert_eq!(grid.verify("30").unwrap(), Verdict::Advanced { row: 0, col: 1 });
        assert_eq!(grid.verify("30.004").unwrap(), Verdict::Advanced { row: 1, col: 0 });
        assert_eq!(grid.verify("20").unwrap(), Verdict::Advanced { row: 1, col: 1 });
        assert!(!grid.is_complete());
        assert_eq!(grid.verify("20").unwrap(), Verdict::Completed);
        assert!(grid.is_complete());
        assert_eq!(grid.active_cell(), None);
        assert_eq!(grid.correct_count(), 4);
    }

    #[test]
    fn test_tolerance_is_strict() {
        let mut grid = pooled();
        assert_eq!(grid.verify("30.01").unwrap(), Verdict::Incorrect);
        assert_eq!(grid.status(0, 0), Some(CellStatus::Incorrect));
        assert_eq!(grid.active_cell(), Some((0, 0)));
    }

    #[test]
    fn test_invalid_input_marks_incorrect() {
        let mut grid = pooled();
        let err = grid.verify("x").unwrap_err();
        assert_eq!(err, LabError::InvalidUserInput { input: "x".into() });
        assert_eq!(grid.status(0, 0), Some(CellStatus::Incorrect));
        // Retry is allowed.
        assert!(matches!(grid.verify("30").unwrap(), Verdict::Advanced { .. }));
    }

    #[test]
    fn test_edit_resets_status() {
        let mut grid = pooled();
        grid.verify("1").unwrap();
        assert!(grid.edit(0, 0, "3"));
        assert_eq!(grid.status(0, 0), Some(CellStatus::Unvalidated));
        assert!(!grid.edit(1, 1, "20"));
        assert!(grid.edit(0, 0, "30"));
        assert!(matches!(grid.verify_draft().unwrap(), Verdict::Advanced { .. }));
    }

    #[test]
    fn test_highlight_window() {
        let mut grid = pooled().with_window(2, 2, 1);
        assert_eq!(grid.highlight(), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        grid.verify("30").unwrap();
        assert_eq!(grid.highlight(), vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_reset() {
        let mut grid = pooled();
        grid.verify("30").unwrap();
        grid.reset();
        assert_eq!(grid.active_cell(), Some((0, 0)));
        assert!(grid
            .statuses()
            .iter()
            .flatten()
            .all(|s| *s == CellStatus::Unvalidated));
    }

    #[test]
    fn test_invalid_grid() {
        assert!(CellGrid::new(vec![], 0.01).is_err());
        assert!(CellGrid::new(vec![vec![1.0], vec![1.0, 2.0]], 0.01).is_err());
        assert!(CellGrid::new(vec![vec![1.0]], 0.0).is_err());
    }
}
