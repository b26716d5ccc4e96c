//! Flow persistence.
//!
//! [`FlowStore`] is the seam between the editor and wherever flows live —
//! a database behind an API, files on disk, or the in-memory store used in
//! tests. Persistence is gated on structural validity: a graph that fails
//! [`FlowGraph::validate`] is refused with the violations attached, so a
//! dangling edge can never reach the execution engine.

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flow::{FlowGraph, StructuralError};

/// A callable function the editor can attach to nodes, as advertised by the
/// backend catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the function's parameters, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Persistence failed.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("no flow stored for assistant `{assistant_id}`")]
    #[diagnostic(code(floweave::store::not_found))]
    NotFound { assistant_id: String },

    #[error("flow has {} structural violation(s); not persisting", violations.len())]
    #[diagnostic(
        code(floweave::store::invalid_flow),
        help("Fix the listed violations and save again.")
    )]
    InvalidFlow {
        #[related]
        violations: Vec<StructuralError>,
    },

    #[error("flow backend error: {message}")]
    #[diagnostic(code(floweave::store::backend))]
    Backend { message: String },
}

/// Where flows are loaded from and saved to, keyed by assistant.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Load the flow deployed for an assistant.
    async fn load_flow(&self, assistant_id: &str) -> Result<FlowGraph, StoreError>;

    /// Persist a flow. Implementations must refuse structurally invalid
    /// graphs with [`StoreError::InvalidFlow`].
    async fn save_flow(&self, assistant_id: &str, graph: &FlowGraph) -> Result<(), StoreError>;

    /// The catalog of functions nodes may reference.
    async fn list_available_functions(&self) -> Result<Vec<FunctionDescriptor>, StoreError>;
}

/// An in-process store, useful for tests and demos.
#[derive(Default)]
pub struct InMemoryFlowStore {
    flows: RwLock<FxHashMap<String, FlowGraph>>,
    functions: Vec<FunctionDescriptor>,
}

impl InMemoryFlowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_functions(functions: Vec<FunctionDescriptor>) -> Self {
        Self {
            flows: RwLock::default(),
            functions,
        }
    }
}

#[async_trait]
impl FlowStore for InMemoryFlowStore {
    async fn load_flow(&self, assistant_id: &str) -> Result<FlowGraph, StoreError> {
        self.flows
            .read()
            .get(assistant_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                assistant_id: assistant_id.to_string(),
            })
    }

    async fn save_flow(&self, assistant_id: &str, graph: &FlowGraph) -> Result<(), StoreError> {
        let violations = graph.validate();
        if !violations.is_empty() {
            tracing::warn!(
                assistant = assistant_id,
                count = violations.len(),
                "refusing to persist invalid flow"
            );
            return Err(StoreError::InvalidFlow { violations });
        }
        self.flows
            .write()
            .insert(assistant_id.to_string(), graph.clone());
        Ok(())
    }

    async fn list_available_functions(&self) -> Result<Vec<FunctionDescriptor>, StoreError> {
        Ok(self.functions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeKind, Position};
    use serde_json::json;

    fn valid_graph() -> FlowGraph {
        let mut graph = FlowGraph::new("f1", "Pizza flow");
        let start = graph.add_node(NodeKind::Start, Position::default()).id.clone();
        let llm = graph
            .add_node(NodeKind::Llm, Position { x: 200.0, y: 0.0 })
            .id
            .clone();
        graph.add_edge(&start, &llm, None).expect("known endpoints");
        graph
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryFlowStore::new();
        let graph = valid_graph();

        store.save_flow("a1", &graph).await.unwrap();
        let loaded = store.load_flow("a1").await.unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.entry_node_id(), graph.entry_node_id());
    }

    #[tokio::test]
    async fn load_of_unknown_assistant_is_not_found() {
        let store = InMemoryFlowStore::new();
        let err = store.load_flow("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    /// A graph with structural violations is refused, and the prior stored
    /// version survives untouched.
    #[tokio::test]
    async fn invalid_flow_is_refused() {
        let store = InMemoryFlowStore::new();
        store.save_flow("a1", &valid_graph()).await.unwrap();

        let invalid = FlowGraph::new("f1", "Broken"); // no nodes, no entry
        let err = store.save_flow("a1", &invalid).await.unwrap_err();
        let StoreError::InvalidFlow { violations } = err else {
            panic!("expected InvalidFlow");
        };
        assert!(!violations.is_empty());

        let kept = store.load_flow("a1").await.unwrap();
        assert_eq!(kept.node_count(), 2);
    }

    #[tokio::test]
    async fn function_catalog_is_served() {
        let store = InMemoryFlowStore::with_functions(vec![FunctionDescriptor {
            name: "check_weather".into(),
            description: Some("Current weather for a city".into()),
            parameters: Some(json!({"type": "object"})),
        }]);
        let functions = store.list_available_functions().await.unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "check_weather");
    }
}
