//! Run state and the event reducer.
//!
//! [`RunStateReducer`] is a pure fold over the inbound event sequence: it
//! owns at most one [`RunState`] and mutates it exclusively from
//! [`apply`](RunStateReducer::apply), which the session calls from its single
//! dispatch path. Applying a batch of events equals applying them one at a
//! time, and naturally idempotent events (a repeated `node_output` with the
//! same payload) leave the state intact.
//!
//! Events that arrive with no active run — after an abandoned run was
//! discarded, or before the first `run_started` — are ignored with a debug
//! log rather than resurrecting stale state.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::ServerFrame;
use crate::types::{NodeId, RunId};

/// Overall status of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Complete,
    Error,
}

/// Execution status of one node within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeExecStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

/// Per-node execution state: status, final output, the partial-output buffer
/// accumulated from streamed chunks, and the error message if any.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeExecState {
    pub status: NodeExecStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default)]
    pub partial_buffer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The reconciled timeline of one run: per-node status and buffers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    pub status: RunStatus,
    pub nodes: FxHashMap<NodeId, NodeExecState>,
}

impl RunState {
    fn fresh(run_id: RunId, status: RunStatus) -> Self {
        Self {
            run_id,
            status,
            nodes: FxHashMap::default(),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeExecState> {
        self.nodes.get(id)
    }
}

/// Folds inbound execution events into a [`RunState`].
///
/// Chunk events may omit their node id on the wire; the reducer scopes them
/// to the most recently started node, which matches the engine's implicit
/// contract.
#[derive(Debug, Default)]
pub struct RunStateReducer {
    run: Option<RunState>,
    last_started: Option<NodeId>,
}

impl RunStateReducer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current run, if one is active.
    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    /// Abandon the current run. Later events for it are ignored.
    pub fn reset(&mut self) {
        self.run = None;
        self.last_started = None;
    }

    /// Apply one inbound event in arrival order.
    pub fn apply(&mut self, frame: &ServerFrame) {
        match frame {
            ServerFrame::SessionStarted { run_id } => {
                self.run = Some(RunState::fresh(run_id.clone(), RunStatus::Pending));
                self.last_started = None;
            }
            ServerFrame::RunStarted { run_id, .. } => {
                self.run = Some(RunState::fresh(run_id.clone(), RunStatus::Running));
                self.last_started = None;
            }
            ServerFrame::NodeStarted { node_id } => {
                let Some(run) = self.run.as_mut() else {
                    tracing::debug!(node = %node_id, "node_started with no active run; ignoring");
                    return;
                };
                run.nodes.entry(node_id.clone()).or_default().status = NodeExecStatus::Running;
                self.last_started = Some(node_id.clone());
            }
            ServerFrame::NodeOutputPartial { node_id, chunk } => {
                let Some(target) = node_id.clone().or_else(|| self.last_started.clone()) else {
                    tracing::debug!("partial chunk with no addressable node; ignoring");
                    return;
                };
                let Some(run) = self.run.as_mut() else {
                    tracing::debug!(node = %target, "partial chunk with no active run; ignoring");
                    return;
                };
                run.nodes
                    .entry(target)
                    .or_default()
                    .partial_buffer
                    .push_str(chunk);
            }
            ServerFrame::NodeOutput { node_id, output } => {
                let Some(run) = self.run.as_mut() else {
                    tracing::debug!(node = %node_id, "node_output with no active run; ignoring");
                    return;
                };
                run.nodes.insert(
                    node_id.clone(),
                    NodeExecState {
                        status: NodeExecStatus::Success,
                        output: Some(output.clone()),
                        partial_buffer: String::new(),
                        error: None,
                    },
                );
            }
            ServerFrame::NodeError { node_id, error } => {
                self.mark_node_failed(node_id.as_ref(), error);
            }
            ServerFrame::Error { node_id, message } => {
                self.mark_node_failed(node_id.as_ref(), message);
            }
            ServerFrame::SessionEnd => {
                if let Some(run) = self.run.as_mut() {
                    run.status = RunStatus::Complete;
                }
            }
            // Connection bookkeeping and chat-surface frames never touch the
            // run timeline; heartbeats are filtered out before dispatch but
            // stay inert here as well.
            ServerFrame::Connection { .. }
            | ServerFrame::FlowStatus { .. }
            | ServerFrame::StreamChunk { .. }
            | ServerFrame::StreamComplete { .. }
            | ServerFrame::Heartbeat => {}
        }
    }

    /// Apply a batch of events; equivalent to applying each in order.
    pub fn apply_batch<'f>(&mut self, frames: impl IntoIterator<Item = &'f ServerFrame>) {
        for frame in frames {
            self.apply(frame);
        }
    }

    /// Node failures mark the node, never the overall run status: later nodes
    /// may still report, and the engine signals run completion separately.
    fn mark_node_failed(&mut self, node_id: Option<&NodeId>, message: &str) {
        let Some(target) = node_id.cloned().or_else(|| self.last_started.clone()) else {
            tracing::debug!(error = %message, "error event with no addressable node; ignoring");
            return;
        };
        let Some(run) = self.run.as_mut() else {
            tracing::debug!(node = %target, "error event with no active run; ignoring");
            return;
        };
        let node = run.nodes.entry(target).or_default();
        node.status = NodeExecStatus::Error;
        node.error = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event_list() -> Vec<ServerFrame> {
        vec![
            ServerFrame::RunStarted {
                run_id: "r1".into(),
                status: Some("running".into()),
            },
            ServerFrame::NodeStarted {
                node_id: "n1".into(),
            },
            ServerFrame::NodeOutputPartial {
                node_id: Some("n1".into()),
                chunk: "ab".into(),
            },
            ServerFrame::NodeOutputPartial {
                node_id: Some("n1".into()),
                chunk: "cd".into(),
            },
            ServerFrame::NodeOutput {
                node_id: "n1".into(),
                output: json!("abcd"),
            },
        ]
    }

    /// The canonical partial-then-final sequence: chunks accumulate in
    /// arrival order and the final output clears the buffer.
    #[test]
    fn sequential_application_reconciles_node_output() {
        let mut reducer = RunStateReducer::new();
        for frame in &sample_event_list() {
            reducer.apply(frame);
        }

        let run = reducer.run().unwrap();
        assert_eq!(run.status, RunStatus::Running);
        let node = run.node(&"n1".into()).unwrap();
        assert_eq!(node.status, NodeExecStatus::Success);
        assert_eq!(node.output, Some(json!("abcd")));
        assert_eq!(node.partial_buffer, "");
    }

    /// Batch application yields a state identical to one-at-a-time.
    #[test]
    fn batch_equals_sequential() {
        let frames = sample_event_list();

        let mut sequential = RunStateReducer::new();
        for frame in &frames {
            sequential.apply(frame);
        }

        let mut batched = RunStateReducer::new();
        batched.apply_batch(&frames);

        assert_eq!(sequential.run(), batched.run());
    }

    /// A repeated `node_output` with an identical payload does not corrupt
    /// state.
    #[test]
    fn repeated_node_output_is_idempotent() {
        let mut reducer = RunStateReducer::new();
        reducer.apply(&ServerFrame::RunStarted {
            run_id: "r1".into(),
            status: None,
        });
        let output = ServerFrame::NodeOutput {
            node_id: "n1".into(),
            output: json!({"answer": 42}),
        };
        reducer.apply(&output);
        let once = reducer.run().cloned();
        reducer.apply(&output);
        assert_eq!(reducer.run(), once.as_ref());
    }

    /// `run_started` discards any prior run wholesale.
    #[test]
    fn run_started_discards_prior_run() {
        let mut reducer = RunStateReducer::new();
        reducer.apply_batch(&sample_event_list());
        reducer.apply(&ServerFrame::RunStarted {
            run_id: "r2".into(),
            status: None,
        });

        let run = reducer.run().unwrap();
        assert_eq!(run.run_id, "r2".into());
        assert!(run.nodes.is_empty());
    }

    /// Chunks without an explicit node id scope to the most recently started
    /// node.
    #[test]
    fn anonymous_chunks_scope_to_last_started_node() {
        let mut reducer = RunStateReducer::new();
        reducer.apply(&ServerFrame::RunStarted {
            run_id: "r1".into(),
            status: None,
        });
        reducer.apply(&ServerFrame::NodeStarted {
            node_id: "n1".into(),
        });
        reducer.apply(&ServerFrame::NodeOutputPartial {
            node_id: None,
            chunk: "hello".into(),
        });

        let run = reducer.run().unwrap();
        assert_eq!(run.node(&"n1".into()).unwrap().partial_buffer, "hello");
    }

    /// A node error marks the node, not the run: the overall status is the
    /// engine's to close out.
    #[test]
    fn node_error_does_not_fail_the_run() {
        let mut reducer = RunStateReducer::new();
        reducer.apply(&ServerFrame::RunStarted {
            run_id: "r1".into(),
            status: None,
        });
        reducer.apply(&ServerFrame::NodeStarted {
            node_id: "n1".into(),
        });
        reducer.apply(&ServerFrame::NodeError {
            node_id: Some("n1".into()),
            error: "boom".into(),
        });

        let run = reducer.run().unwrap();
        assert_eq!(run.status, RunStatus::Running);
        let node = run.node(&"n1".into()).unwrap();
        assert_eq!(node.status, NodeExecStatus::Error);
        assert_eq!(node.error.as_deref(), Some("boom"));
    }

    #[test]
    fn session_end_completes_the_run() {
        let mut reducer = RunStateReducer::new();
        reducer.apply(&ServerFrame::RunStarted {
            run_id: "r1".into(),
            status: None,
        });
        reducer.apply(&ServerFrame::SessionEnd);
        assert_eq!(reducer.run().unwrap().status, RunStatus::Complete);
    }

    /// Events arriving before any run, or after the run was abandoned, are
    /// ignored instead of resurrecting stale state.
    #[test]
    fn stale_events_are_ignored() {
        let mut reducer = RunStateReducer::new();
        reducer.apply(&ServerFrame::NodeStarted {
            node_id: "n1".into(),
        });
        assert!(reducer.run().is_none());

        reducer.apply_batch(&sample_event_list());
        reducer.reset();
        reducer.apply(&ServerFrame::NodeOutput {
            node_id: "n1".into(),
            output: json!("late"),
        });
        assert!(reducer.run().is_none());
    }

    /// Liveness and chat-surface frames never appear in the run timeline.
    #[test]
    fn heartbeats_and_chat_frames_are_inert() {
        let mut reducer = RunStateReducer::new();
        reducer.apply_batch(&sample_event_list());
        let before = reducer.run().cloned();

        reducer.apply(&ServerFrame::Heartbeat);
        reducer.apply(&ServerFrame::StreamChunk {
            content: "chat".into(),
        });
        reducer.apply(&ServerFrame::FlowStatus {
            has_flow: true,
            node_count: 3,
        });

        assert_eq!(reducer.run(), before.as_ref());
    }
}
