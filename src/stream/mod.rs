//! The execution-event streaming client.
//!
//! One [`ExecutionStreamClient`] owns one logical connection to the remote
//! execution engine for the lifetime of an editing session. It hides the
//! connect/reconnect lifecycle behind a small surface:
//!
//! - [`ExecutionStreamClient::connect`] / [`close`](ExecutionStreamClient::close)
//!   drive the state machine `Disconnected → Connecting → Open → Disconnected`
//! - [`ExecutionStreamClient::send`] returns `false` instead of erroring when
//!   the connection is not open
//! - inbound frames, connection transitions, and protocol anomalies arrive as
//!   [`StreamUpdate`]s on a single channel receiver, consumed sequentially —
//!   the one dispatch path that makes run-state mutation lock-free
//!
//! Reconnection uses a linear backoff (`base_delay * attempt`) capped at
//! [`ReconnectPolicy::max_attempts`]; once exhausted the client parks until
//! an explicit `connect()`. Connection-establishment failures and abnormal
//! closes route through the same backoff path, differing only in the logged
//! reason.

mod backoff;
mod client;
mod update;

pub use backoff::ReconnectPolicy;
pub use client::ExecutionStreamClient;
pub use update::{ConnectionState, StreamUpdate, StreamUpdateKind};

use miette::Diagnostic;
use thiserror::Error;

/// Configuration for one streaming client.
#[derive(Clone, Debug)]
pub struct StreamClientConfig {
    /// WebSocket URL of the execution engine, e.g. `ws://localhost:9090/run`.
    pub url: String,
    /// Identity sent in the `start_session` handshake on every (re)connect.
    pub assistant_id: String,
    /// Reconnect backoff schedule.
    pub reconnect: ReconnectPolicy,
}

impl StreamClientConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            assistant_id: assistant_id.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Resolve the configuration from the environment (reading a `.env` file
    /// when present): `FLOWEAVE_RUNNER_URL` and `FLOWEAVE_ASSISTANT_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let url = std::env::var("FLOWEAVE_RUNNER_URL").map_err(|_| ConfigError::MissingVar {
            name: "FLOWEAVE_RUNNER_URL",
        })?;
        let assistant_id =
            std::env::var("FLOWEAVE_ASSISTANT_ID").map_err(|_| ConfigError::MissingVar {
                name: "FLOWEAVE_ASSISTANT_ID",
            })?;
        Ok(Self::new(url, assistant_id))
    }
}

/// The streaming client could not be configured.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing environment variable `{name}`")]
    #[diagnostic(
        code(floweave::stream::missing_var),
        help("Set the variable in the environment or a .env file.")
    )]
    MissingVar { name: &'static str },
}
