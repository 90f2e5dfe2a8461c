//! # Step Graphs - Declarative Workflow Topology
//!
//! A lab module is a fixed DAG of named steps. Each step lists the steps
//! that must be completed before it opens (AND semantics). The graph is
//! data: modules declare it once through [`WorkflowSpec`] and hand the
//! validated [`StepGraph`] to a [`WorkflowGate`](crate::gate::WorkflowGate).
//!
//! ## Key Concepts
//!
//! - **Intro step**: a one-shot acknowledgement that locks once completed
//! - **Calculation step**: a step validated against an expected matrix
//! - **Focus map**: where the UI should look after a step completes
//!
//! ## Example
//!
//! ```rust
//! use matrixlab_core::graph::WorkflowSpec;
//!
//! let graph = WorkflowSpec::new()
//!     .intro("intro")
//!     .calculation("forward", "prediction", &["intro"])
//!     .calculation("loss", "loss", &["forward"])
//!     .focus("intro", &["forward"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(graph.entry(), "intro");
//! assert_eq!(graph.topological_order(), vec!["intro", "forward", "loss"]);
//! ```

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LabError;

/// What a step asks of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Acknowledge an explanation. Locks after completion.
    Intro,
    /// Fill in a matrix checked against an expected value.
    Calculation,
}

/// One declared step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub id: String,
    pub kind: StepKind,
    /// Steps that must all be completed before this one opens.
    pub prerequisites: Vec<String>,
    /// Key into the module's expected table. `None` for intro steps.
    pub expects: Option<String>,
}

impl StepSpec {
    pub fn is_intro(&self) -> bool {
        self.kind == StepKind::Intro
    }
}

/// Builder for a [`StepGraph`].
///
/// Steps keep their declaration order, which is also the tie-break order
/// for roots and topological ordering.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSpec {
    steps: Vec<StepSpec>,
    focus: Vec<(String, Vec<String>)>,
}

impl WorkflowSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an intro step with no prerequisites.
    pub fn intro(mut self, id: &str) -> Self {
        self.steps.push(StepSpec {
            id: id.to_string(),
            kind: StepKind::Intro,
            prerequisites: Vec::new(),
            expects: None,
        });
        self
    }

    /// Declare a calculation step validated against `expects`.
    pub fn calculation(mut self, id: &str, expects: &str, prerequisites: &[&str]) -> Self {
        self.steps.push(StepSpec {
            id: id.to_string(),
            kind: StepKind::Calculation,
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            expects: Some(expects.to_string()),
        });
        self
    }

    /// Declare where focus goes after `from` completes.
    pub fn focus(mut self, from: &str, to: &[&str]) -> Self {
        self.focus
            .push((from.to_string(), to.iter().map(|t| t.to_string()).collect()));
        self
    }

    /// Validate and freeze the declaration.
    ///
    /// # Errors
    ///
    /// - `EmptyWorkflow` if no step was declared
    /// - `DuplicateStep` if two steps share an id
    /// - `UnknownStep` if a prerequisite or focus entry names no declared step
    /// - `CyclicWorkflow` if the prerequisites are not a DAG
    pub fn build(self) -> Result<StepGraph, LabError> {
        if self.steps.is_empty() {
            return Err(LabError::EmptyWorkflow);
        }

        let mut graph: DiGraph<StepSpec, ()> = DiGraph::new();
        let mut index = HashMap::new();
        let mut order = Vec::with_capacity(self.steps.len());

        for spec in self.steps {
            if index.contains_key(&spec.id) {
                return Err(LabError::DuplicateStep { step: spec.id });
            }
            let id = spec.id.clone();
            let node = graph.add_node(spec);
            index.insert(id, node);
            order.push(node);
        }

        // Edges run prerequisite -> dependent.
        for &node in &order {
            let prerequisites = graph[node].prerequisites.clone();
            for prerequisite in prerequisites {
                let from = *index
                    .get(&prerequisite)
                    .ok_or_else(|| LabError::unknown_step(prerequisite.as_str()))?;
                graph.add_edge(from, node, ());
            }
        }

        toposort(&graph, None).map_err(|cycle| LabError::CyclicWorkflow {
            step: graph[cycle.node_id()].id.clone(),
        })?;

        let mut focus = HashMap::new();
        for (from, targets) in self.focus {
            for id in std::iter::once(&from).chain(targets.iter()) {
                if !index.contains_key(id) {
                    return Err(LabError::unknown_step(id.as_str()));
                }
            }
            focus.insert(from, targets);
        }

        Ok(StepGraph {
            graph,
            index,
            order,
            focus,
        })
    }
}

/// A validated, immutable workflow DAG.
#[derive(Debug, Clone)]
pub struct StepGraph {
    graph: DiGraph<StepSpec, ()>,
    index: HashMap<String, NodeIndex>,
    order: Vec<NodeIndex>,
    focus: HashMap<String, Vec<String>>,
}

impl StepGraph {
    /// Number of declared steps.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn step(&self, id: &str) -> Option<&StepSpec> {
        self.index.get(id).map(|&node| &self.graph[node])
    }

    /// Look up a step, failing with `UnknownStep`.
    pub fn require(&self, id: &str) -> Result<&StepSpec, LabError> {
        self.step(id).ok_or_else(|| LabError::unknown_step(id))
    }

    /// All steps in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &StepSpec> + '_ {
        self.order.iter().map(|&node| &self.graph[node])
    }

    pub fn prerequisites(&self, id: &str) -> Result<&[String], LabError> {
        Ok(&self.require(id)?.prerequisites)
    }

    /// Steps that list `id` as a prerequisite, in declaration order.
    pub fn dependents(&self, id: &str) -> Result<Vec<&str>, LabError> {
        let node = *self.index.get(id).ok_or_else(|| LabError::unknown_step(id))?;
        let mut dependents: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        dependents.sort();
        dependents.dedup();
        Ok(dependents
            .into_iter()
            .map(|n| self.graph[n].id.as_str())
            .collect())
    }

    /// Steps with no prerequisites, in declaration order.
    pub fn roots(&self) -> Vec<&str> {
        self.steps()
            .filter(|s| s.prerequisites.is_empty())
            .map(|s| s.id.as_str())
            .collect()
    }

    /// The first declared root. Focus returns here after a reset.
    pub fn entry(&self) -> &str {
        // A non-empty DAG always has a root.
        self.roots().first().copied().unwrap_or_default()
    }

    /// Steps ordered so every prerequisite precedes its dependents.
    ///
    /// Ties are broken by declaration order.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut remaining: HashMap<NodeIndex, usize> = self
            .order
            .iter()
            .map(|&n| {
                (
                    n,
                    self.graph.neighbors_directed(n, Direction::Incoming).count(),
                )
            })
            .collect();
        let mut sorted = Vec::with_capacity(self.order.len());

        while sorted.len() < self.order.len() {
            let Some(&next) = self
                .order
                .iter()
                .find(|n| remaining.get(n) == Some(&0))
            else {
                break;
            };
            remaining.remove(&next);
            for dependent in self.graph.neighbors_directed(next, Direction::Outgoing) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                }
            }
            sorted.push(self.graph[next].id.as_str());
        }
        sorted
    }

    /// Declared focus targets after `id` completes (empty if none).
    pub fn focus_targets(&self, id: &str) -> &[String] {
        self.focus.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of calculation (non-intro) steps.
    pub fn calculation_count(&self) -> usize {
        self.steps().filter(|s| !s.is_intro()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> StepGraph {
        WorkflowSpec::new()
            .intro("intro")
            .calculation("a", "a", &["intro"])
            .calculation("b", "b", &["a"])
            .calculation("c", "c", &["a"])
            .calculation("d", "d", &["b", "c"])
            .focus("a", &["b", "c"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_graph() {
        let graph = diamond();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.entry(), "intro");
        assert_eq!(graph.calculation_count(), 4);
        assert!(graph.step("intro").unwrap().is_intro());
    }

    #[test]
    fn test_dependents_and_prerequisites() {
        let graph = diamond();
        assert_eq!(graph.dependents("a").unwrap(), vec!["b", "c"]);
        assert_eq!(graph.prerequisites("d").unwrap(), &["b", "c"]);
        assert!(graph.dependents("missing").is_err());
    }

    #[test]
    fn test_topological_order() {
        let graph = diamond();
        assert_eq!(graph.topological_order(), vec!["intro", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_focus_targets() {
        let graph = diamond();
        assert_eq!(graph.focus_targets("a"), &["b", "c"]);
        assert!(graph.focus_targets("d").is_empty());
    }

    #[test]
    fn test_multiple_roots() {
        let graph = WorkflowSpec::new()
            .calculation("q", "q", &[])
            .calculation("kv", "kv", &[])
            .calculation("out", "out", &["q", "kv"])
            .build()
            .unwrap();
        assert_eq!(graph.roots(), vec!["q", "kv"]);
        assert_eq!(graph.entry(), "q");
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = WorkflowSpec::new().intro("x").intro("x").build().unwrap_err();
        assert_eq!(err, LabError::DuplicateStep { step: "x".into() });
    }

    #[test]
    fn test_unknown_prerequisite_rejected() {
        let err = WorkflowSpec::new()
            .calculation("a", "a", &["ghost"])
            .build()
            .unwrap_err();
        assert_eq!(err, LabError::unknown_step("ghost"));
    }

    #[test]
    fn test_unknown_focus_rejected() {
        let err = WorkflowSpec::new()
            .intro("a")
            .focus("a", &["ghost"])
            .build()
            .unwrap_err();
        assert_eq!(err, LabError::unknown_step("ghost"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = WorkflowSpec::new()
            .calculation("a", "a", &["b"])
            .calculation("b", "b", &["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, LabError::CyclicWorkflow { .. }));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            WorkflowSpec::new().build().unwrap_err(),
            LabError::EmptyWorkflow
        );
    }
}
