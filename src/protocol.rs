//! Wire protocol: JSON envelopes exchanged with the remote execution engine.
//!
//! Every frame is a JSON object discriminated by its `type` field. Frames are
//! modeled as exhaustive tagged unions so that adding an event kind is a
//! compile-time-checked match arm, not a runtime lookup-table entry. Unknown
//! inbound types and non-JSON payloads are classified by [`decode_frame`]
//! rather than dropped, so the client can log the former and surface the
//! latter as raw text.
//!
//! # Examples
//!
//! ```rust
//! use floweave::protocol::{Inbound, ServerFrame, decode_frame};
//!
//! let frame = decode_frame(r#"{"type": "node_started", "node_id": "n1"}"#).unwrap();
//! assert!(matches!(
//!     frame,
//!     Inbound::Frame(ServerFrame::NodeStarted { .. })
//! ));
//! ```

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{NodeId, RunId};

/// Frames the client sends to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Session handshake, sent immediately on every (re)connect.
    StartSession { assistant_id: String },
    /// A user utterance for the engine to run the flow against.
    UserMessage {
        text: String,
        assistant_id: String,
        /// Surface-specific extras (channel hints, metadata) passed through
        /// verbatim.
        #[serde(flatten)]
        extra: serde_json::Map<String, Value>,
    },
}

/// Frames the engine sends to the client.
///
/// `heartbeat` (also spelled `hb` on the wire) is liveness only: it is
/// recognized here so dispatch stays exhaustive, and intentionally produces
/// no observable side effect downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Transport-level acknowledgement of the session.
    Connection {
        status: String,
        #[serde(default)]
        session_id: Option<String>,
    },
    /// Whether the assistant currently has a flow, and how large it is.
    FlowStatus {
        has_flow: bool,
        #[serde(default)]
        node_count: u64,
    },
    /// The engine accepted the session and assigned a run id.
    SessionStarted { run_id: RunId },
    /// A run of the flow graph began.
    RunStarted {
        run_id: RunId,
        #[serde(default)]
        status: Option<String>,
    },
    /// A node began executing.
    NodeStarted { node_id: NodeId },
    /// An incremental fragment of a node's output.
    ///
    /// The engine scopes chunks to the most recently started node when
    /// `node_id` is omitted; carrying it explicitly is preferred.
    NodeOutputPartial {
        #[serde(default)]
        node_id: Option<NodeId>,
        chunk: String,
    },
    /// A node finished with its final output.
    NodeOutput { node_id: NodeId, output: Value },
    /// A node failed.
    NodeError {
        #[serde(default)]
        node_id: Option<NodeId>,
        error: String,
    },
    /// A run-level error, optionally attributed to a node.
    Error {
        #[serde(default)]
        node_id: Option<NodeId>,
        message: String,
    },
    /// The engine closed the run.
    SessionEnd,
    /// Chat-surface streaming chunk (same dispatch table, not run state).
    StreamChunk { content: String },
    /// Chat-surface streaming completion.
    StreamComplete { content: String },
    /// Liveness ping.
    #[serde(alias = "hb")]
    Heartbeat,
}

impl ServerFrame {
    /// Returns `true` for liveness frames that must never reach the run
    /// timeline.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, ServerFrame::Heartbeat)
    }
}

/// Discriminators [`decode_frame`] recognizes, used to tell a malformed known
/// frame from a genuinely unknown type.
const KNOWN_TYPES: &[&str] = &[
    "connection",
    "flow_status",
    "session_started",
    "run_started",
    "node_started",
    "node_output_partial",
    "node_output",
    "node_error",
    "error",
    "session_end",
    "stream_chunk",
    "stream_complete",
    "heartbeat",
    "hb",
];

/// Outcome of decoding one inbound text frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// A recognized, well-formed frame.
    Frame(ServerFrame),
    /// A JSON object with an unrecognized `type`; informational, never fatal.
    Unknown { kind: String, raw: String },
}

/// An inbound frame that could not be decoded.
#[derive(Debug, Error, Diagnostic)]
pub enum ProtocolError {
    /// The payload is not JSON at all. The raw text is surfaced so the
    /// operator sees what the engine actually sent.
    #[error("inbound frame is not JSON")]
    #[diagnostic(code(floweave::protocol::not_json))]
    NotJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// The payload is JSON but carries no `type` discriminator.
    #[error("inbound frame has no `type` field")]
    #[diagnostic(code(floweave::protocol::missing_type))]
    MissingType { raw: String },

    /// The `type` is known but the frame body does not match its schema.
    #[error("malformed `{kind}` frame")]
    #[diagnostic(code(floweave::protocol::malformed))]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// The raw payload, for surfacing as an informational log line.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ProtocolError::NotJson { raw, .. } | ProtocolError::MissingType { raw } => Some(raw),
            ProtocolError::Malformed { .. } => None,
        }
    }
}

/// Decode one inbound text frame.
///
/// Unknown `type` values are not errors: they decode to [`Inbound::Unknown`]
/// so the dispatcher can log them and move on. Only undecodable payloads
/// produce a [`ProtocolError`].
pub fn decode_frame(text: &str) -> Result<Inbound, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(|source| ProtocolError::NotJson {
        raw: text.to_string(),
        source,
    })?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::MissingType {
            raw: text.to_string(),
        })?
        .to_string();

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Ok(Inbound::Unknown {
            kind,
            raw: text.to_string(),
        });
    }

    let frame = serde_json::from_value::<ServerFrame>(value)
        .map_err(|source| ProtocolError::Malformed { kind, source })?;
    Ok(Inbound::Frame(frame))
}

/// Serialize an outbound frame to its JSON envelope.
pub fn encode_frame(frame: &ClientFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}
