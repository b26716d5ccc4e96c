//! Core identifier and node types for the Floweave flow-graph model.
//!
//! This module defines the fundamental types used throughout the crate for
//! identifying nodes, edges, and runs. These are the core domain concepts
//! that define what a flow graph *is*; the graph structure itself lives in
//! [`crate::flow`] and runtime execution state in [`crate::run_state`].
//!
//! # Key Types
//!
//! - [`NodeId`] / [`EdgeId`]: opaque, unique identifiers within one graph
//! - [`RunId`]: identifies one execution of a graph by the remote engine
//! - [`NodeKind`]: the closed set of node types the editor can place
//! - [`Position`]: canvas coordinates carried for the editor, never
//!   interpreted by this crate
//!
//! # Examples
//!
//! ```rust
//! use floweave::types::{NodeId, NodeKind};
//!
//! let id = NodeId::fresh();
//! let kind = NodeKind::Llm;
//! assert!(!kind.is_start());
//! println!("{id} is an {kind} node");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a node within a flow graph.
///
/// Ids are opaque strings; [`NodeId::fresh`] mints a new uuid-backed id the
/// way the editor does on node creation. Uniqueness within a graph is a
/// structural invariant checked by [`FlowGraph::validate`](crate::flow::FlowGraph::validate),
/// not by this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Mint a fresh unique node id.
    #[must_use]
    pub fn fresh() -> Self {
        NodeId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Unique identifier of an edge within a flow graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Mint a fresh unique edge id.
    #[must_use]
    pub fn fresh() -> Self {
        EdgeId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        EdgeId(s)
    }
}

/// Identifies one execution of a flow graph by the remote engine.
///
/// Assigned by the engine and announced in `run_started`; the client never
/// mints run ids itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        RunId(s.to_string())
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        RunId(s)
    }
}

/// The closed set of node types an editor can place on the canvas.
///
/// The kind selects which configuration panel the editor shows and which
/// behavior the remote engine executes; this crate treats the per-kind
/// `config` payload as opaque JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point of a conversation flow.
    Start,
    /// External trigger (webhook, schedule) that starts a flow.
    Trigger,
    /// Outbound HTTP request node.
    Http,
    /// LLM completion node.
    Llm,
    /// Data transformation node.
    Transform,
    /// Branching node whose outgoing edges carry predicates.
    Conditional,
    /// Fan-out node executing several branches concurrently.
    Parallel,
    /// Pause node waiting for external input or a timer.
    Wait,
    /// Node delegating to another flow graph.
    Subflow,
}

impl NodeKind {
    /// Returns `true` if this is a [`Start`](Self::Start) node.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Trigger => "trigger",
            Self::Http => "http",
            Self::Llm => "llm",
            Self::Transform => "transform",
            Self::Conditional => "conditional",
            Self::Parallel => "parallel",
            Self::Wait => "wait",
            Self::Subflow => "subflow",
        };
        write!(f, "{name}")
    }
}

/// Canvas coordinates of a node.
///
/// Carried for the editor and persisted with the graph; never interpreted by
/// validation or evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
