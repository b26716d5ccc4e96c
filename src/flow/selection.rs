//! Outgoing-edge selection: the traversal tie-break rule.
//!
//! The remote runner owns execution, but the tie-break is part of the model's
//! contract: among a node's outgoing edges, evaluated in declaration order,
//! the *first* edge whose condition is absent or evaluates true wins.

use miette::Diagnostic;
use thiserror::Error;

use super::model::{FlowEdge, FlowGraph};
use crate::condition::{EvalContext, evaluate};
use crate::types::NodeId;

/// No valid transition exists out of a node.
#[derive(Clone, Debug, PartialEq, Error, Diagnostic)]
pub enum TransitionError {
    /// The node has outgoing edges, but none of their conditions matched.
    ///
    /// This is an explicit runtime error, not a silent no-op: the runner must
    /// report it so the operator sees the conversation stall.
    #[error("no outgoing edge of node `{node}` matched ({candidates} candidate(s))")]
    #[diagnostic(
        code(floweave::flow::no_matching_edge),
        help("Add an unconditional fallback edge or widen a condition.")
    )]
    NoMatchingEdge { node: NodeId, candidates: usize },

    /// The node is not part of the graph.
    #[error("node `{node}` does not exist in the graph")]
    #[diagnostic(code(floweave::flow::unknown_node))]
    UnknownNode { node: NodeId },
}

/// Select the edge to traverse out of `node` under `ctx`.
///
/// Edges are evaluated in declaration order; the first whose condition is
/// `None` or evaluates true is returned. A node with no outgoing edges is
/// terminal (`Ok(None)`); a node whose outgoing edges all fail is an error.
pub fn select_edge<'g>(
    graph: &'g FlowGraph,
    node: &NodeId,
    ctx: &EvalContext,
) -> Result<Option<&'g FlowEdge>, TransitionError> {
    if !graph.contains_node(node) {
        return Err(TransitionError::UnknownNode { node: node.clone() });
    }

    let mut candidates = 0;
    for edge in graph.outgoing_edges(node) {
        candidates += 1;
        let traversable = match &edge.condition {
            None => true,
            Some(predicate) => evaluate(predicate, ctx),
        };
        if traversable {
            return Ok(Some(edge));
        }
    }

    if candidates == 0 {
        Ok(None)
    } else {
        Err(TransitionError::NoMatchingEdge {
            node: node.clone(),
            candidates,
        })
    }
}
