//! Flow-graph definition, structural validation, and edge selection.
//!
//! This module provides the editor-facing data model: a [`FlowGraph`] of
//! typed [`FlowNode`]s connected by directed, conditionally-traversed
//! [`FlowEdge`]s. Nodes and edges live in declaration-order arenas keyed by
//! explicit ids, so cyclic graphs (loop-back edges) are representable without
//! recursive ownership.
//!
//! # Core Concepts
//!
//! - **Nodes**: typed units of conversation state, opaque per-kind config
//! - **Edges**: ordered, directed connections; declaration order is the
//!   first-match tie-break during traversal
//! - **Validation**: [`FlowGraph::validate`] reports every structural
//!   violation non-fatally, so the editor can always render the graph
//!   alongside its error list
//! - **Selection**: [`select_edge`] picks the first outgoing edge whose
//!   condition is absent or evaluates true
//!
//! # Quick Start
//!
//! ```rust
//! use floweave::condition::{EvalContext, Predicate};
//! use floweave::flow::{FlowGraph, select_edge};
//! use floweave::types::{NodeKind, Position};
//!
//! let mut graph = FlowGraph::new("demo", "Pizza flow");
//! let start = graph.add_node(NodeKind::Start, Position::default()).id.clone();
//! let order = graph.add_node(NodeKind::Llm, Position::new(200.0, 0.0)).id.clone();
//! graph
//!     .add_edge(&start, &order, Some(Predicate::user_contains("pizza")))
//!     .unwrap();
//!
//! assert!(graph.validate().is_empty());
//!
//! let ctx = EvalContext::new().with_utterance("one pizza please");
//! let chosen = select_edge(&graph, &start, &ctx).unwrap().unwrap();
//! assert_eq!(chosen.target, order);
//! ```

mod model;
mod selection;
mod validation;

pub use model::{FlowEdge, FlowGraph, FlowNode};
pub use selection::{TransitionError, select_edge};
pub use validation::StructuralError;
