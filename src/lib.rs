//! # Floweave: Visual Conversation-Flow Editing and Run Observation
//!
//! Floweave is the headless core of a visual flow editor: a graph model for
//! conversation flows, a condition language for edge traversal, a streaming
//! client that watches a remote execution engine run those flows, and a
//! reducer that folds the engine's event stream into per-node run state.
//!
//! ## Core Concepts
//!
//! - **Flow graph**: Typed nodes joined by ordered, conditionally-traversed
//!   edges; cycles welcome, structure validated before persistence
//! - **Conditions**: A small predicate tree (`any`/`all`/`not` over checks on
//!   the user utterance, intent, tool results, and parameters) evaluated
//!   without side effects
//! - **Stream client**: One logical WebSocket connection per editing session,
//!   with linear bounded reconnect backoff
//! - **Run state**: A pure fold of execution events into per-node status,
//!   streamed partial output, and final payloads
//!
//! ## Quick Start
//!
//! ### Building a flow
//!
//! ```
//! use floweave::condition::Predicate;
//! use floweave::flow::FlowGraph;
//! use floweave::types::{NodeKind, Position};
//!
//! let mut flow = FlowGraph::new("f1", "Pizza bot");
//! let start = flow.add_node(NodeKind::Start, Position::default()).id.clone();
//! let order = flow
//!     .add_node(NodeKind::Llm, Position { x: 240.0, y: 0.0 })
//!     .id
//!     .clone();
//!
//! flow.add_edge(&start, &order, Some(Predicate::user_contains("pizza")))
//!     .unwrap();
//!
//! assert!(flow.validate().is_empty());
//! ```
//!
//! ### Watching a run
//!
//! ```rust,no_run
//! use floweave::session::FlowEditorSession;
//! use floweave::stream::{StreamClientConfig, StreamUpdateKind};
//!
//! # async fn demo() {
//! let config = StreamClientConfig::new("ws://localhost:9090/run", "assistant-1");
//! let mut session = FlowEditorSession::new(config);
//! session.connect();
//!
//! while let Some(update) = session.next_update().await {
//!     if let StreamUpdateKind::Frame(frame) = &update.kind {
//!         println!("event: {frame:?}  run: {:?}", session.run());
//!     }
//! }
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`flow`] - The graph arena, editor mutations, validation, and traversal
//! - [`condition`] - The predicate tree and its evaluator
//! - [`protocol`] - Wire frames exchanged with the execution engine
//! - [`stream`] - The WebSocket client and its reconnect machinery
//! - [`run_state`] - The event reducer and per-node run state
//! - [`session`] - The editor session tying the pieces together
//! - [`store`] - Flow persistence behind a trait seam
//! - [`telemetry`] - Tracing subscriber setup

pub mod condition;
pub mod flow;
pub mod protocol;
pub mod run_state;
pub mod session;
pub mod store;
pub mod stream;
pub mod telemetry;
pub mod types;
