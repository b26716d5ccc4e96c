//! The WebSocket client and its supervisor task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::update::{ConnectionState, StreamUpdate, StreamUpdateKind};
use super::StreamClientConfig;
use crate::protocol::{ClientFrame, Inbound, ServerFrame, decode_frame, encode_frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands the client hands to its supervisor task.
enum Command {
    Connect,
    Send(ClientFrame),
    Close,
}

/// State shared between the caller-facing handle and the supervisor task.
struct Shared {
    state: Mutex<ConnectionState>,
    reconnect_attempts: AtomicU32,
}

impl Shared {
    fn set_state(&self, next: ConnectionState, updates: &flume::Sender<StreamUpdate>) {
        let changed = {
            let mut state = self.state.lock();
            let changed = *state != next;
            *state = next;
            changed
        };
        if changed {
            tracing::debug!(state = %next, "connection state changed");
            let _ = updates.send(StreamUpdate::now(StreamUpdateKind::Connection(next)));
        }
    }

    fn set_state_if_open_or_connecting(&self, next: ConnectionState) {
        let mut state = self.state.lock();
        if matches!(*state, ConnectionState::Open | ConnectionState::Connecting) {
            *state = next;
        }
    }
}

/// Owns the one logical connection of an editing session.
///
/// All transport failures are absorbed here and exposed only through the
/// update channel and logs; [`send`](Self::send) and
/// [`connect`](Self::connect) never return an error to the caller.
///
/// # Examples
///
/// ```rust,no_run
/// use floweave::protocol::ClientFrame;
/// use floweave::stream::{ExecutionStreamClient, StreamClientConfig};
///
/// # async fn demo() {
/// let config = StreamClientConfig::new("ws://localhost:9090/run", "assistant-1");
/// let (client, updates) = ExecutionStreamClient::new(config);
/// client.connect();
///
/// while let Ok(update) = updates.recv_async().await {
///     println!("{:?}", update.kind);
/// }
/// # }
/// ```
pub struct ExecutionStreamClient {
    shared: Arc<Shared>,
    cmd_tx: flume::Sender<Command>,
    task: tokio::task::JoinHandle<()>,
}

impl ExecutionStreamClient {
    /// Create the client and spawn its supervisor task.
    ///
    /// The returned receiver is the single dispatch path: consume it
    /// sequentially and feed frames to the run-state reducer from one place.
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(config: StreamClientConfig) -> (Self, flume::Receiver<StreamUpdate>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(ConnectionState::Disconnected),
            reconnect_attempts: AtomicU32::new(0),
        });
        let (cmd_tx, cmd_rx) = flume::unbounded();
        let (updates_tx, updates_rx) = flume::unbounded();

        let task = tokio::spawn(supervise(config, Arc::clone(&shared), cmd_rx, updates_tx));

        (
            Self {
                shared,
                cmd_tx,
                task,
            },
            updates_rx,
        )
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Reconnect attempts consumed since the connection was last open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.reconnect_attempts.load(Ordering::Relaxed)
    }

    /// Open the connection. No-op while already connecting or open; after
    /// `ReconnectExhausted` this is the explicit retry the operator triggers.
    pub fn connect(&self) {
        match self.state() {
            ConnectionState::Connecting | ConnectionState::Open => {}
            ConnectionState::Disconnected | ConnectionState::Closing => {
                let _ = self.cmd_tx.send(Command::Connect);
            }
        }
    }

    /// Transmit a frame if the connection is open.
    ///
    /// Returns `false` — never an error — when the connection is not open;
    /// the caller surfaces that to the user.
    #[must_use]
    pub fn send(&self, frame: ClientFrame) -> bool {
        if self.state() != ConnectionState::Open {
            return false;
        }
        self.cmd_tx.send(Command::Send(frame)).is_ok()
    }

    /// Close the session: cancels any pending reconnect timer and closes the
    /// transport with a clean status.
    pub fn close(&self) {
        self.shared
            .set_state_if_open_or_connecting(ConnectionState::Closing);
        let _ = self.cmd_tx.send(Command::Close);
    }
}

impl Drop for ExecutionStreamClient {
    fn drop(&mut self) {
        // Best-effort clean close; the abort guarantees no stray reconnect
        // timer fires into a disposed client.
        let _ = self.cmd_tx.send(Command::Close);
        self.task.abort();
    }
}

/// Why an open connection ended.
enum CloseReason {
    /// The caller asked for teardown.
    Clean,
    /// The caller's handle is gone; shut down.
    ClientGone,
    /// Transport error or server-side close; retried via backoff.
    Abnormal(String),
}

async fn supervise(
    config: StreamClientConfig,
    shared: Arc<Shared>,
    cmd_rx: flume::Receiver<Command>,
    updates: flume::Sender<StreamUpdate>,
) {
    'idle: loop {
        // Parked: only an explicit connect() wakes the machine.
        loop {
            match cmd_rx.recv_async().await {
                Ok(Command::Connect) => break,
                Ok(Command::Close) => {
                    shared.set_state(ConnectionState::Disconnected, &updates);
                }
                Ok(Command::Send(_)) => {
                    // send() refuses while not open; a stray command here is
                    // a race loser and is dropped.
                }
                Err(_) => return,
            }
        }

        shared.reconnect_attempts.store(0, Ordering::Relaxed);

        loop {
            shared.set_state(ConnectionState::Connecting, &updates);

            let failure = match connect_async(&config.url).await {
                Ok((ws, _response)) => {
                    shared.reconnect_attempts.store(0, Ordering::Relaxed);
                    shared.set_state(ConnectionState::Open, &updates);
                    match run_open(ws, &config, &cmd_rx, &updates).await {
                        CloseReason::Clean => {
                            shared.set_state(ConnectionState::Disconnected, &updates);
                            continue 'idle;
                        }
                        CloseReason::ClientGone => return,
                        CloseReason::Abnormal(reason) => {
                            tracing::warn!(reason = %reason, "connection closed abnormally");
                            reason
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, url = %config.url, "failed to open connection");
                    err.to_string()
                }
            };

            shared.set_state(ConnectionState::Disconnected, &updates);

            let attempt = shared.reconnect_attempts.fetch_add(1, Ordering::Relaxed) + 1;
            let Some(delay) = config.reconnect.delay_for(attempt) else {
                tracing::error!(
                    attempts = attempt - 1,
                    last_failure = %failure,
                    "reconnect attempts exhausted; waiting for explicit connect"
                );
                let _ = updates.send(StreamUpdate::now(StreamUpdateKind::ReconnectExhausted {
                    attempts: attempt - 1,
                }));
                continue 'idle;
            };

            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    cmd = cmd_rx.recv_async() => match cmd {
                        // Teardown cancels the pending timer.
                        Ok(Command::Close) => {
                            shared.set_state(ConnectionState::Disconnected, &updates);
                            continue 'idle;
                        }
                        Ok(Command::Connect) => break,
                        Ok(Command::Send(_)) => {}
                        Err(_) => return,
                    }
                }
            }
        }
    }
}

/// Drive one open connection until it ends.
async fn run_open(
    ws: WsStream,
    config: &StreamClientConfig,
    cmd_rx: &flume::Receiver<Command>,
    updates: &flume::Sender<StreamUpdate>,
) -> CloseReason {
    let (mut ws_tx, mut ws_rx) = ws.split();

    // Handshake first: the engine scopes everything that follows to this
    // assistant identity.
    let handshake = ClientFrame::StartSession {
        assistant_id: config.assistant_id.clone(),
    };
    match encode_frame(&handshake) {
        Ok(text) => {
            if let Err(err) = ws_tx.send(Message::Text(text.into())).await {
                return CloseReason::Abnormal(format!("handshake failed: {err}"));
            }
        }
        Err(err) => return CloseReason::Abnormal(format!("handshake encode failed: {err}")),
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv_async() => match cmd {
                Ok(Command::Send(frame)) => {
                    let text = match encode_frame(&frame) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::warn!(error = %err, "dropping unserializable outbound frame");
                            continue;
                        }
                    };
                    if let Err(err) = ws_tx.send(Message::Text(text.into())).await {
                        return CloseReason::Abnormal(format!("send failed: {err}"));
                    }
                }
                Ok(Command::Close) => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return CloseReason::Clean;
                }
                Ok(Command::Connect) => {} // already open
                Err(_) => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return CloseReason::ClientGone;
                }
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => dispatch_inbound(text.as_str(), updates),
                Some(Ok(Message::Ping(payload))) => {
                    let _ = ws_tx.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    return CloseReason::Abnormal(match frame {
                        Some(frame) => format!("server closed: {}", frame.reason),
                        None => "server closed".to_string(),
                    });
                }
                Some(Ok(_)) => {} // binary and pong frames carry nothing for us
                Some(Err(err)) => return CloseReason::Abnormal(err.to_string()),
                None => return CloseReason::Abnormal("transport stream ended".to_string()),
            }
        }
    }
}

/// Decode and dispatch one inbound text frame.
fn dispatch_inbound(text: &str, updates: &flume::Sender<StreamUpdate>) {
    match decode_frame(text) {
        // Liveness only; must not reach the run timeline.
        Ok(Inbound::Frame(ServerFrame::Heartbeat)) => {
            tracing::trace!("heartbeat");
        }
        Ok(Inbound::Frame(frame)) => {
            let _ = updates.send(StreamUpdate::now(StreamUpdateKind::Frame(frame)));
        }
        Ok(Inbound::Unknown { kind, raw }) => {
            tracing::info!(kind = %kind, raw = %raw, "unknown frame type");
            let _ = updates.send(StreamUpdate::now(StreamUpdateKind::UnknownFrame { kind }));
        }
        Err(err) => {
            tracing::info!(error = %err, "undecodable frame; surfacing raw text");
            let raw = err.raw().unwrap_or(text).to_string();
            let _ = updates.send(StreamUpdate::now(StreamUpdateKind::RawText { raw }));
        }
    }
}
