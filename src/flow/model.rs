//! The flow-graph arena: nodes, edges, and editor mutations.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation::StructuralError;
use crate::condition::Predicate;
use crate::types::{EdgeId, NodeId, NodeKind, Position};

/// A typed unit of conversation state in a flow graph.
///
/// The per-kind `config` payload (prompt text, HTTP settings, credential
/// references) is opaque to this crate; the node-type configuration panels
/// that read and write it live elsewhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub config: Value,
}

/// A directed, conditionally-traversed connection between two nodes.
///
/// `condition: None` means "always traversable". Edges are significant in
/// declaration order: traversal picks the first matching edge (see
/// [`select_edge`](super::select_edge)).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Predicate>,
}

/// A conversation flow graph: nodes and ordered edges keyed by explicit ids.
///
/// Nodes and edges live in declaration-order arenas with an id-to-index map
/// for lookup, so cycles are representable and iteration order is stable.
/// All editor mutations go through the methods here; the structure is never
/// exposed mutably, which keeps the id index consistent.
///
/// Serialization round-trips the persisted shape
/// `{id, name, nodes, edges, entry_node_id}`; loading a structurally invalid
/// graph succeeds, and [`validate`](Self::validate) reports the violations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "FlowGraphWire", into = "FlowGraphWire")]
pub struct FlowGraph {
    pub id: String,
    pub name: String,
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    entry_node_id: Option<NodeId>,
    node_index: FxHashMap<NodeId, usize>,
}

impl FlowGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            entry_node_id: None,
            node_index: FxHashMap::default(),
        }
    }

    /// Add a node of the given kind at a canvas position.
    ///
    /// Assigns a fresh unique id and has no side effects on edges. The first
    /// node added to an empty graph becomes the entry node; use
    /// [`set_entry`](Self::set_entry) to change it afterwards.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> &FlowNode {
        let node = FlowNode {
            id: NodeId::fresh(),
            kind,
            position,
            config: Value::Null,
        };
        if self.entry_node_id.is_none() {
            self.entry_node_id = Some(node.id.clone());
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.nodes.last().expect("just pushed")
    }

    /// Remove a node, cascading removal of every edge that touches it.
    ///
    /// If the removed node was the entry node, the entry is reassigned to the
    /// graph's first remaining node, or cleared when the graph is empty, so a
    /// dangling entry reference is never left behind.
    ///
    /// Returns `false` when no node with that id exists.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let Some(position) = self.nodes.iter().position(|n| &n.id == id) else {
            return false;
        };
        self.nodes.remove(position);
        self.edges.retain(|e| &e.source != id && &e.target != id);
        if self.entry_node_id.as_ref() == Some(id) {
            self.entry_node_id = self.nodes.first().map(|n| n.id.clone());
        }
        self.rebuild_index();
        true
    }

    /// Add a directed edge, optionally guarded by a condition.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::UnknownNode`] when either endpoint does not
    /// exist in the graph.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        condition: Option<Predicate>,
    ) -> Result<&FlowEdge, StructuralError> {
        for endpoint in [source, target] {
            if !self.contains_node(endpoint) {
                return Err(StructuralError::UnknownNode {
                    node: endpoint.clone(),
                });
            }
        }
        self.edges.push(FlowEdge {
            id: EdgeId::fresh(),
            source: source.clone(),
            target: target.clone(),
            condition,
        });
        Ok(self.edges.last().expect("just pushed"))
    }

    /// Remove an edge. Returns `false` when no edge with that id exists.
    pub fn remove_edge(&mut self, id: &EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| &e.id != id);
        self.edges.len() != before
    }

    /// Replace an edge's condition tree wholesale (no partial patching).
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::UnknownEdge`] when no edge with that id
    /// exists.
    pub fn update_edge_condition(
        &mut self,
        id: &EdgeId,
        condition: Option<Predicate>,
    ) -> Result<(), StructuralError> {
        let edge = self
            .edges
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StructuralError::UnknownEdge { edge: id.clone() })?;
        edge.condition = condition;
        Ok(())
    }

    /// Designate an existing node as the entry node.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::UnknownNode`] when the node does not exist.
    pub fn set_entry(&mut self, id: &NodeId) -> Result<(), StructuralError> {
        if !self.contains_node(id) {
            return Err(StructuralError::UnknownNode { node: id.clone() });
        }
        self.entry_node_id = Some(id.clone());
        Ok(())
    }

    pub fn entry_node_id(&self) -> Option<&NodeId> {
        self.entry_node_id.as_ref()
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&FlowNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Mutable access for config-panel edits (position, per-kind config).
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut FlowNode> {
        self.node_index.get(id).map(|&i| &mut self.nodes[i])
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&FlowEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    /// Edges in declaration order. This order is the traversal tie-break.
    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    /// Outgoing edges of a node, in declaration order.
    pub fn outgoing_edges<'g, 'a>(
        &'g self,
        id: &'a NodeId,
    ) -> impl Iterator<Item = &'g FlowEdge> + use<'g, 'a> {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(super) fn rebuild_index(&mut self) {
        self.node_index.clear();
        // First occurrence wins so duplicate ids (reported by validate) still
        // resolve deterministically.
        for (i, node) in self.nodes.iter().enumerate() {
            self.node_index.entry(node.id.clone()).or_insert(i);
        }
    }
}

/// Persisted shape of a flow graph.
#[derive(Serialize, Deserialize)]
struct FlowGraphWire {
    id: String,
    name: String,
    #[serde(default)]
    nodes: Vec<FlowNode>,
    #[serde(default)]
    edges: Vec<FlowEdge>,
    #[serde(default)]
    entry_node_id: Option<NodeId>,
}

impl From<FlowGraphWire> for FlowGraph {
    fn from(wire: FlowGraphWire) -> Self {
        let mut graph = FlowGraph {
            id: wire.id,
            name: wire.name,
            nodes: wire.nodes,
            edges: wire.edges,
            entry_node_id: wire.entry_node_id,
            node_index: FxHashMap::default(),
        };
        graph.rebuild_index();
        graph
    }
}

impl From<FlowGraph> for FlowGraphWire {
    fn from(graph: FlowGraph) -> Self {
        FlowGraphWire {
            id: graph.id,
            name: graph.name,
            nodes: graph.nodes,
            edges: graph.edges,
            entry_node_id: graph.entry_node_id,
        }
    }
}
