//! Updates the streaming client delivers to its consumer.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::protocol::ServerFrame;

/// Lifecycle state of the one logical connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        };
        write!(f, "{name}")
    }
}

/// One entry in the client's update stream, timestamped for the append-only
/// inspector log.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamUpdate {
    pub at: DateTime<Utc>,
    pub kind: StreamUpdateKind,
}

impl StreamUpdate {
    pub(crate) fn now(kind: StreamUpdateKind) -> Self {
        Self {
            at: Utc::now(),
            kind,
        }
    }
}

/// What happened on the stream.
///
/// Heartbeats never appear here: they are consumed inside the client so the
/// run timeline stays liveness-free.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamUpdateKind {
    /// The connection changed state.
    Connection(ConnectionState),
    /// A well-formed execution event arrived.
    Frame(ServerFrame),
    /// A JSON frame with an unrecognized `type`; informational only.
    UnknownFrame { kind: String },
    /// A non-JSON payload, surfaced verbatim instead of dropped.
    RawText { raw: String },
    /// Automatic reconnection gave up; an explicit `connect()` is required.
    ReconnectExhausted { attempts: u32 },
}
