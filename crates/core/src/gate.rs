//! # Workflow Gate
//!
//! Decides which steps of a [`StepGraph`] are open, given the set of steps
//! the user has completed so far. The gate owns the completion state; the
//! graph itself never changes.
//!
//! Transitions are monotonic within a session:
//! `Locked -> Unlocked -> Completed`. Only [`WorkflowGate::reset`] goes back.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::LabError;
use crate::graph::StepGraph;

/// Display state of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Some prerequisite is not completed, or the workflow is inactive.
    Locked,
    /// Ready for the user.
    Unlocked,
    Completed,
}

/// Gating state machine over a fixed step graph.
///
/// # Example
///
/// ```rust
/// use matrixlab_core::graph::WorkflowSpec;
/// use matrixlab_core::gate::{StepState, WorkflowGate};
///
/// let graph = WorkflowSpec::new()
///     .intro("intro")
///     .calculation("prediction", "prediction", &["intro"])
///     .build()
///     .unwrap();
/// let mut gate = WorkflowGate::new(graph);
///
/// assert_eq!(gate.state("prediction"), StepState::Locked);
/// gate.mark_complete("intro").unwrap();
/// assert!(gate.is_enabled("prediction"));
/// // Intro steps lock once acknowledged.
/// assert!(!gate.is_enabled("intro"));
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowGate {
    graph: StepGraph,
    /// Completed ids in completion order.
    completed: Vec<String>,
    completed_set: HashSet<String>,
    active: bool,
}

impl WorkflowGate {
    pub fn new(graph: StepGraph) -> Self {
        Self {
            graph,
            completed: Vec::new(),
            completed_set: HashSet::new(),
            active: true,
        }
    }

    pub fn graph(&self) -> &StepGraph {
        &self.graph
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// An inactive workflow keeps its progress but locks every step.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!(target: "matrixlab-core", "workflow active: {}", active);
        }
        self.active = active;
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed_set.contains(id)
    }

    /// Prerequisites of `id` that are not completed yet.
    pub fn waiting_on(&self, id: &str) -> Result<Vec<String>, LabError> {
        Ok(self
            .graph
            .prerequisites(id)?
            .iter()
            .filter(|p| !self.is_completed(p))
            .cloned()
            .collect())
    }

    /// Whether the user may interact with `id`.
    ///
    /// True iff the workflow is active, every prerequisite is completed and
    /// `id` is not an already acknowledged intro step. Unknown ids are
    /// never enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        let Some(step) = self.graph.step(id) else {
            return false;
        };
        if !self.active {
            return false;
        }
        if step.is_intro() && self.is_completed(id) {
            return false;
        }
        step.prerequisites.iter().all(|p| self.is_completed(p))
    }

    /// Display state of `id`. Unknown ids report `Locked`.
    pub fn state(&self, id: &str) -> StepState {
        if self.is_completed(id) {
            StepState::Completed
        } else if self.is_enabled(id) {
            StepState::Unlocked
        } else {
            StepState::Locked
        }
    }

    /// Record `id` as completed.
    ///
    /// Returns `Ok(true)` if the completed set changed and `Ok(false)` if the
    /// step was already completed.
    ///
    /// # Errors
    ///
    /// - `UnknownStep` if the graph does not declare `id`
    /// - `WorkflowInactive` while the workflow is inactive
    /// - `StepLocked` if some prerequisite is not completed
    pub fn mark_complete(&mut self, id: &str) -> Result<bool, LabError> {
        self.graph.require(id)?;
        if self.is_completed(id) {
            return Ok(false);
        }
        if !self.active {
            warn!(target: "matrixlab-core", "refused to complete {} while inactive", id);
            return Err(LabError::WorkflowInactive);
        }
        let waiting_on = self.waiting_on(id)?;
        if !waiting_on.is_empty() {
            warn!(target: "matrixlab-core", "refused to complete locked step {} (waiting on {:?})", id, waiting_on);
            return Err(LabError::StepLocked {
                step: id.to_string(),
                waiting_on,
            });
        }

        self.completed_set.insert(id.to_string());
        self.completed.push(id.to_string());
        info!(
            target: "matrixlab-core",
            "step {} completed ({}/{})",
            id,
            self.completed.len(),
            self.graph.len()
        );
        Ok(true)
    }

    /// Forget all progress. The entry step is unlocked again.
    pub fn reset(&mut self) {
        self.completed.clear();
        self.completed_set.clear();
        info!(target: "matrixlab-core", "workflow reset, focus on {}", self.graph.entry());
    }

    /// Completed ids in the order they were completed.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Fraction of calculation steps completed, in `[0, 1]`.
    ///
    /// Intro steps count toward neither side.
    pub fn progress(&self) -> f64 {
        let total = self.graph.calculation_count();
        if total == 0 {
            return 1.0;
        }
        let done = self
            .graph
            .steps()
            .filter(|s| !s.is_intro() && self.is_completed(&s.id))
            .count();
        done as f64 / total as f64
    }

    /// Every declared step is completed.
    pub fn is_finished(&self) -> bool {
        self.completed.len() == self.graph.len()
    }

    /// Static focus lookup for a just-completed step.
    pub fn next_focus_targets(&self, id: &str) -> &[String] {
        self.graph.focus_targets(id)
    }

    /// Where focus belongs now: the entry step before anything is completed,
    /// otherwise the targets declared for the last completed step.
    pub fn focus(&self) -> Vec<String> {
        match self.completed.last() {
            None => vec![self.graph.entry().to_string()],
            Some(last) => self.graph.focus_targets(last).to_vec(),
        }
    }

    /// Ids currently unlocked, in declaration order.
    pub fn unlocked(&self) -> Vec<&str> {
        self.graph
            .steps()
            .filter(|s| self.state(&s.id) == StepState::Unlocked)
            .map(|s| s.id.as_str())
            .collect()
    }
}
