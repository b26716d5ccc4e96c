//! Structural validation for flow graphs.
//!
//! Validation is pure and non-fatal: [`FlowGraph::validate`] returns *every*
//! violation as a value, so the editor can render the error list alongside
//! the invalid graph instead of refusing to render. Structural errors block
//! persistence (see [`crate::store`]) but are never propagated to the
//! transport.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;

use super::model::FlowGraph;
use crate::types::{EdgeId, NodeId};

/// A graph-integrity violation.
///
/// `UnknownNode`/`UnknownEdge` are also returned eagerly by the mutation
/// methods that can produce them; the remaining variants only ever come out
/// of [`FlowGraph::validate`].
#[derive(Clone, Debug, PartialEq, Error, Diagnostic)]
pub enum StructuralError {
    /// An edge's `source` references a node that is not in the graph.
    #[error("edge `{edge}` has dangling source `{node}`")]
    #[diagnostic(
        code(floweave::flow::dangling_source),
        help("Remove the edge or re-create the missing node.")
    )]
    DanglingSource { edge: EdgeId, node: NodeId },

    /// An edge's `target` references a node that is not in the graph.
    #[error("edge `{edge}` has dangling target `{node}`")]
    #[diagnostic(
        code(floweave::flow::dangling_target),
        help("Remove the edge or re-create the missing node.")
    )]
    DanglingTarget { edge: EdgeId, node: NodeId },

    /// The graph has no entry node designated.
    #[error("graph has no entry node")]
    #[diagnostic(
        code(floweave::flow::missing_entry),
        help("Designate an entry node before running the flow.")
    )]
    MissingEntryNode,

    /// The designated entry node does not exist in the graph.
    #[error("entry node `{node}` does not exist in the graph")]
    #[diagnostic(code(floweave::flow::invalid_entry))]
    InvalidEntryNode { node: NodeId },

    /// Two nodes share the same id.
    #[error("duplicate node id `{node}`")]
    #[diagnostic(code(floweave::flow::duplicate_node))]
    DuplicateNodeId { node: NodeId },

    /// Two edges share the same id.
    #[error("duplicate edge id `{edge}`")]
    #[diagnostic(code(floweave::flow::duplicate_edge))]
    DuplicateEdgeId { edge: EdgeId },

    /// A mutation referenced a node that is not in the graph.
    #[error("node `{node}` does not exist in the graph")]
    #[diagnostic(code(floweave::flow::unknown_node))]
    UnknownNode { node: NodeId },

    /// A mutation referenced an edge that is not in the graph.
    #[error("edge `{edge}` does not exist in the graph")]
    #[diagnostic(code(floweave::flow::unknown_edge))]
    UnknownEdge { edge: EdgeId },
}

impl FlowGraph {
    /// Report every structural violation in the graph.
    ///
    /// Pure and callable repeatedly without side effects. An empty result
    /// means every edge endpoint resolves, the entry node exists, and node
    /// and edge ids are unique.
    #[must_use]
    pub fn validate(&self) -> Vec<StructuralError> {
        let mut errors = Vec::new();

        let mut node_ids: FxHashSet<&NodeId> = FxHashSet::default();
        for node in self.nodes() {
            if !node_ids.insert(&node.id) {
                errors.push(StructuralError::DuplicateNodeId {
                    node: node.id.clone(),
                });
            }
        }

        let mut edge_ids: FxHashSet<&EdgeId> = FxHashSet::default();
        for edge in self.edges() {
            if !edge_ids.insert(&edge.id) {
                errors.push(StructuralError::DuplicateEdgeId {
                    edge: edge.id.clone(),
                });
            }
            if !node_ids.contains(&edge.source) {
                errors.push(StructuralError::DanglingSource {
                    edge: edge.id.clone(),
                    node: edge.source.clone(),
                });
            }
            if !node_ids.contains(&edge.target) {
                errors.push(StructuralError::DanglingTarget {
                    edge: edge.id.clone(),
                    node: edge.target.clone(),
                });
            }
        }

        match self.entry_node_id() {
            None => errors.push(StructuralError::MissingEntryNode),
            Some(entry) if !node_ids.contains(entry) => {
                errors.push(StructuralError::InvalidEntryNode {
                    node: entry.clone(),
                });
            }
            Some(_) => {}
        }

        errors
    }
}
