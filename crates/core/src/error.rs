//! # Error Types
//!
//! Errors raised while building step graphs, gating steps and checking
//! user answers. A bad step id in a module's graph is a configuration
//! bug and surfaces at construction; a bad answer from a user is
//! recoverable and only marks the cell incorrect.

use thiserror::Error;

/// Errors of the workflow gate and answer validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LabError {
    /// A step id that the workflow does not declare.
    #[error("Unknown step: {step}")]
    UnknownStep { step: String },

    /// The same step id was declared twice.
    #[error("Duplicate step: {step}")]
    DuplicateStep { step: String },

    /// A step's prerequisites are not all completed yet.
    #[error("Step {step} is locked (waiting on {waiting_on:?})")]
    StepLocked {
        step: String,
        waiting_on: Vec<String>,
    },

    /// The workflow is inactive, so every step is locked.
    #[error("Workflow is inactive")]
    WorkflowInactive,

    /// The prerequisite relation contains a cycle through `step`.
    #[error("Workflow contains a cycle through step {step}")]
    CyclicWorkflow { step: String },

    /// A workflow needs at least one step.
    #[error("Workflow has no steps")]
    EmptyWorkflow,

    /// User text that does not parse as a number.
    #[error("Invalid input: {input:?} is not a number")]
    InvalidUserInput { input: String },

    /// A cell grid needs a non-empty rectangular expected grid.
    #[error("Invalid cell grid: {reason}")]
    InvalidGrid { reason: String },
}

impl LabError {
    pub fn unknown_step(step: impl Into<String>) -> Self {
        LabError::UnknownStep { step: step.into() }
    }
}
