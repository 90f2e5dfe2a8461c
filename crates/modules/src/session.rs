//! # Lab Session
//!
//! One user's pass through one module. The session owns the workflow gate
//! and one [`CellGrid`] per calculation step; the UI only calls into it and
//! renders [`SessionSnapshot`]s.
//!
//! ```text
//!   submit(step, "30") ──▶ CellGrid::verify ──▶ Verdict
//!                                  │
//!                        Completed ▼
//!                       WorkflowGate::mark_complete(step)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_core::Verdict;
//! use matrixlab_modules::{catalog, LabSession};
//!
//! let module = catalog::load("linear-regression").unwrap();
//! let mut session = LabSession::with_defaults(module).unwrap();
//!
//! session.begin().unwrap();
//! assert_eq!(session.focus(), vec!["prediction-calc".to_string()]);
//! assert_eq!(
//!     session.submit("prediction-calc", "14").unwrap(),
//!     Verdict::Advanced { row: 1, col: 0 }
//! );
//! ```

use std::collections::HashMap;

use matrixlab_core::{
    CellGrid, CellStatus, LabConfig, LabError, StepKind, StepState, Verdict, WorkflowGate,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ModuleResult;
use crate::module::LearningModule;

pub struct LabSession {
    module: Box<dyn LearningModule>,
    gate: WorkflowGate,
    grids: HashMap<String, CellGrid>,
}

impl LabSession {
    /// Open a session with tolerance and initial activity from `config`.
    pub fn new(module: Box<dyn LearningModule>, config: &LabConfig) -> ModuleResult<Self> {
        let mut grids = HashMap::new();
        for step in module.workflow().steps() {
            let Some(key) = &step.expects else {
                continue;
            };
            let expected = module.calculate_expected(key)?;
            let mut grid = CellGrid::new(expected.to_rows(), config.validation.tolerance)?;
            if let Some(w) = module.window(&step.id) {
                grid = grid.with_window(w.height, w.width, w.stride);
            }
            grids.insert(step.id.clone(), grid);
        }

        let mut gate = WorkflowGate::new(module.workflow().clone());
        gate.set_active(config.workflow.start_active);

        Ok(Self {
            module,
            gate,
            grids,
        })
    }

    pub fn with_defaults(module: Box<dyn LearningModule>) -> ModuleResult<Self> {
        Self::new(module, &LabConfig::default())
    }

    pub fn module(&self) -> &dyn LearningModule {
        self.module.as_ref()
    }

    pub fn gate(&self) -> &WorkflowGate {
        &self.gate
    }

    /// Acknowledge every intro step that is open. Returns the new focus.
    pub fn begin(&mut self) -> ModuleResult<Vec<String>> {
        let intros: Vec<String> = self
            .gate
            .graph()
            .steps()
            .filter(|s| s.kind == StepKind::Intro && self.gate.is_enabled(&s.id))
            .map(|s| s.id.clone())
            .collect();
        for id in intros {
            self.gate.mark_complete(&id)?;
        }
        Ok(self.focus())
    }

    /// The answer grid of a calculation step.
    pub fn grid(&self, step: &str) -> ModuleResult<&CellGrid> {
        Ok(self
            .grids
            .get(step)
            .ok_or_else(|| LabError::unknown_step(step))?)
    }

    /// Replace the draft of `step`'s active cell.
    ///
    /// Returns `false` when the grid is already complete.
    pub fn edit(&mut self, step: &str, draft: &str) -> ModuleResult<bool> {
        self.ensure_enabled(step)?;
        let grid = self.grid_mut(step)?;
        Ok(match grid.active_cell() {
            Some((row, col)) => grid.edit(row, col, draft),
            None => false,
        })
    }

    /// Check `input` against the active cell of `step`.
    ///
    /// When the last cell is answered correctly the step is marked complete
    /// in the gate.
    ///
    /// # Errors
    ///
    /// - `UnknownStep` if `step` has no grid
    /// - `WorkflowInactive` or `StepLocked` if the step is not open
    /// - `InvalidUserInput` if `input` is not a number; the cell is marked
    ///   incorrect and the user may retry
    pub fn submit(&mut self, step: &str, input: &str) -> ModuleResult<Verdict> {
        self.ensure_enabled(step)?;
        let verdict = self.grid_mut(step)?.verify(input)?;
        self.settle(step, verdict)
    }

    /// Check the draft left in the active cell by [`edit`](Self::edit).
    pub fn submit_draft(&mut self, step: &str) -> ModuleResult<Verdict> {
        self.ensure_enabled(step)?;
        let verdict = self.grid_mut(step)?.verify_draft()?;
        self.settle(step, verdict)
    }

    /// Input cells read by the active cell of `step`.
    pub fn highlight(&self, step: &str) -> ModuleResult<Vec<(usize, usize)>> {
        Ok(self.grid(step)?.highlight())
    }

    /// Clear all progress. The step graph is unchanged.
    pub fn reset(&mut self) {
        self.gate.reset();
        self.grids.values_mut().for_each(CellGrid::reset);
        info!(target: "matrixlab-modules", "{}: session reset", self.module.slug());
    }

    pub fn set_active(&mut self, active: bool) {
        self.gate.set_active(active);
    }

    /// Steps that should receive focus now.
    pub fn focus(&self) -> Vec<String> {
        self.gate.focus()
    }

    pub fn progress(&self) -> f64 {
        self.gate.progress()
    }

    pub fn is_finished(&self) -> bool {
        self.gate.is_finished()
    }

    /// Serializable view of the whole session, steps in declaration order.
    pub fn snapshot(&self) -> SessionSnapshot {
        let steps = self
            .gate
            .graph()
            .steps()
            .map(|spec| {
                let grid = self.grids.get(&spec.id);
                StepSnapshot {
                    id: spec.id.clone(),
                    kind: spec.kind,
                    state: self.gate.state(&spec.id),
                    active_cell: grid.and_then(CellGrid::active_cell),
                    cells: grid.map(CellGrid::statuses).unwrap_or_default(),
                    drafts: grid.map(CellGrid::drafts).unwrap_or_default(),
                    highlight: grid.map(CellGrid::highlight).unwrap_or_default(),
                }
            })
            .collect();

        SessionSnapshot {
            module: self.module.slug().to_string(),
            title: self.module.title().to_string(),
            active: self.gate.is_active(),
            completed: self.gate.completed().to_vec(),
            progress: self.gate.progress(),
            focus: self.focus(),
            steps,
        }
    }

    fn grid_mut(&mut self, step: &str) -> ModuleResult<&mut CellGrid> {
        Ok(self
            .grids
            .get_mut(step)
            .ok_or_else(|| LabError::unknown_step(step))?)
    }

    fn ensure_enabled(&self, step: &str) -> ModuleResult<()> {
        if self.gate.is_enabled(step) {
            return Ok(());
        }
        let err = if !self.gate.graph().contains(step) {
            LabError::unknown_step(step)
        } else if !self.gate.is_active() {
            LabError::WorkflowInactive
        } else {
            LabError::StepLocked {
                step: step.to_string(),
                waiting_on: self.gate.waiting_on(step)?,
            }
        };
        warn!(target: "matrixlab-modules", "{}: {}", self.module.slug(), err);
        Err(err.into())
    }

    fn settle(&mut self, step: &str, verdict: Verdict) -> ModuleResult<Verdict> {
        if verdict == Verdict::Completed && self.gate.mark_complete(step)? {
            info!(
                target: "matrixlab-modules",
                "{}: {} answered ({}/{})",
                self.module.slug(),
                step,
                self.gate.completed_count(),
                self.gate.graph().len()
            );
        }
        Ok(verdict)
    }
}

/// One step as the UI renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub id: String,
    pub kind: StepKind,
    pub state: StepState,
    pub active_cell: Option<(usize, usize)>,
    /// Per-cell validation outcome. Empty for intro steps.
    pub cells: Vec<Vec<CellStatus>>,
    pub drafts: Vec<Vec<String>>,
    pub highlight: Vec<(usize, usize)>,
}

/// Everything the UI needs to redraw a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub module: String,
    pub title: String,
    pub active: bool,
    pub completed: Vec<String>,
    pub progress: f64,
    pub focus: Vec<String>,
    pub steps: Vec<StepSnapshot>,
}

impl SessionSnapshot {
    pub fn step(&self, id: &str) -> Option<&StepSnapshot> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn to_json(&self) -> ModuleResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
