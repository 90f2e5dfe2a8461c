//! # MatrixLab Core - Workflow Gating
//!
//! The parts of a lab that do not care about numbers:
//!
//! - **Shapes**: `rows × cols` pairs used in dimension errors
//! - **Step graphs**: declarative DAGs of named steps
//! - **Workflow gate**: which steps are open given what is completed
//! - **Cell validation**: raster-order checking of user answers
//! - **Config / logging**: shared settings and console output
//!
//! ## Design Philosophy
//!
//! A module's workflow is a value. Instead of hand-written enable rules per
//! step, each module declares its prerequisites once and the gate derives
//! every enabled/locked decision from that declaration.

pub mod config;
pub mod error;
pub mod gate;
pub mod graph;
pub mod logging;
pub mod shape;
pub mod validation;

pub use config::{load_config, ConfigError, LabConfig};
pub use error::LabError;
pub use gate::{StepState, WorkflowGate};
pub use graph::{StepGraph, StepKind, StepSpec, WorkflowSpec};
pub use shape::Shape;
pub use validation::{CellGrid, CellStatus, Verdict};
