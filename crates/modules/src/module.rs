//! # Learning Modules
//!
//! A learning module is a fixed toy dataset, the step graph a user walks
//! through, and the table of answers every calculation step is checked
//! against. The table is computed once, when the module is constructed, so
//! every upstream value exists before any step is shown.
//!
//! ```text
//!   Dataset ──▶ Engine ──▶ ExpectedTable ◀── StepGraph (expects keys)
//! ```

use std::collections::BTreeMap;

use matrixlab_core::validation::Window;
use matrixlab_core::StepGraph;
use matrixlab_engine::Matrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModuleError, ModuleResult};

/// Common surface of every lab.
///
/// Modules are immutable after construction and safe to share between
/// threads.
pub trait LearningModule: Send + Sync {
    /// URL slug used by the catalog.
    fn slug(&self) -> &'static str;

    /// Human-readable title.
    fn title(&self) -> &'static str;

    /// The steps and their prerequisites.
    fn workflow(&self) -> &StepGraph;

    /// Named input matrices shown to the user.
    fn dataset(&self) -> &Dataset;

    /// Every expected answer, keyed by step name.
    fn expected(&self) -> &ExpectedTable;

    /// The input window an output cell of `step` reads, if the step has one.
    fn window(&self, _step: &str) -> Option<Window> {
        None
    }

    /// Look up the expected answer for `step`.
    ///
    /// # Errors
    ///
    /// `UnknownStep` naming this module if `step` is not in the table.
    fn calculate_expected(&self, step: &str) -> ModuleResult<&Matrix> {
        self.expected()
            .get(step)
            .ok_or_else(|| ModuleError::UnknownStep {
                module: self.slug(),
                step: step.to_string(),
            })
    }

    /// The expected table as pretty JSON.
    fn expected_json(&self) -> ModuleResult<String> {
        self.expected().to_json()
    }
}

/// Step name to expected matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedTable {
    entries: BTreeMap<String, Matrix>,
}

impl ExpectedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, step: &str, value: Matrix) {
        debug!(target: "matrixlab-modules", "expected {} = {}", step, value);
        self.entries.insert(step.to_string(), value);
    }

    /// Insert a scalar as a 1×1 matrix.
    pub fn insert_scalar(&mut self, step: &str, value: f64) {
        self.insert(step, Matrix::scalar(value));
    }

    pub fn get(&self, step: &str) -> Option<&Matrix> {
        self.entries.get(step)
    }

    pub fn contains(&self, step: &str) -> bool {
        self.entries.contains_key(step)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> ModuleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Named input matrices in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    entries: Vec<(String, Matrix)>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: Matrix) -> Self {
        self.entries.push((name.to_string(), value));
        self
    }

    /// Add a scalar hyperparameter as a 1×1 matrix.
    pub fn with_scalar(self, name: &str, value: f64) -> Self {
        self.with(name, Matrix::scalar(value))
    }

    pub fn get(&self, name: &str) -> Option<&Matrix> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Check that every calculation step of `graph` validates against a key
/// present in `table`.
pub(crate) fn check_expectations(
    module: &'static str,
    graph: &StepGraph,
    table: &ExpectedTable,
) -> ModuleResult<()> {
    for step in graph.steps() {
        if let Some(key) = &step.expects {
            if !table.contains(key) {
                return Err(ModuleError::UnknownStep {
                    module,
                    step: key.clone(),
                });
            }
        }
    }
    Ok(())
}
