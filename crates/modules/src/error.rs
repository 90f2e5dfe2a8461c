//! Error types for learning modules and lab sessions.

use matrixlab_core::LabError;
use matrixlab_engine::EngineError;
use thiserror::Error;

/// Errors raised by modules, the catalog and lab sessions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleError {
    /// A numeric routine failed while building an expected table.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Gating or validation refused the request.
    #[error(transparent)]
    Workflow(#[from] LabError),

    /// No expected matrix is registered under `step`.
    #[error("Unknown {module} step: {step}")]
    UnknownStep { module: &'static str, step: String },

    /// No module is registered under `slug`.
    #[error("Unknown module: {slug}")]
    UnknownModule { slug: String },

    /// JSON export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<serde_json::Error> for ModuleError {
    fn from(err: serde_json::Error) -> Self {
        ModuleError::Export(err.to_string())
    }
}

pub type ModuleResult<T> = Result<T, ModuleError>;
