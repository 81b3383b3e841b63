//! WebSocket client — connection lifecycle and background read loop.
//!
//! DESIGN
//! ======
//! `Client` owns the write half of the socket. `connect` splits the stream
//! and moves the read half into a dedicated task. The task forwards inbound
//! payloads over an unbounded channel and reports its exit through a oneshot,
//! so nothing mutable is shared between the task and the caller.
//!
//! LIFECYCLE
//! =========
//! 1. `Client::new` → `Disconnected`
//! 2. `connect` → `Connected`, read loop spawned
//! 3. read loop exits on the first read failure → `Termination` fires once
//! 4. `close` → close frame, bounded wait for the read loop, `Closed`
//!    (terminal; the connection is never replaced)

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};
use url::Url;

use crate::error::{ClientError, ReadError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

// =============================================================================
// HANDLES
// =============================================================================

/// Receiving side of a connection, handed out by `Client::connect`.
pub struct Inbound {
    /// Payloads in transport order. Closes when the read loop exits.
    pub messages: mpsc::UnboundedReceiver<String>,
    pub termination: Termination,
}

/// One-shot notification that the read loop has exited.
pub struct Termination {
    rx: Option<oneshot::Receiver<ReadError>>,
}

impl Termination {
    /// Wait for the read loop to exit.
    ///
    /// Returns the terminal cause the first time it resolves. Returns `None`
    /// if the loop was aborted without observing a failure (the client was
    /// dropped), and on every call after the first completed one.
    pub async fn wait(&mut self) -> Option<ReadError> {
        let rx = self.rx.as_mut()?;
        let outcome = rx.await.ok();
        self.rx = None;
        outcome
    }

    /// Non-blocking check. `None` while the loop is still running, and
    /// also when it was aborted; use `is_finished` to tell the two apart.
    pub fn try_take(&mut self) -> Option<ReadError> {
        match self.rx.as_mut()?.try_recv() {
            Ok(cause) => {
                self.rx = None;
                Some(cause)
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                None
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
        }
    }

    /// `true` once the exit has been observed through `wait` or `try_take`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}

// =============================================================================
// CLIENT
// =============================================================================

struct Connection {
    sink: WsSink,
    reader: JoinHandle<()>,
}

enum ConnectionState {
    Disconnected,
    Connected(Connection),
    Closed,
}

/// How long `close` waits for the peer to acknowledge before dropping the socket.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct Client {
    endpoint: String,
    close_timeout: Duration,
    state: ConnectionState,
}

impl Client {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), close_timeout: DEFAULT_CLOSE_TIMEOUT, state: ConnectionState::Disconnected }
    }

    #[must_use]
    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Dial the endpoint and start the read loop.
    ///
    /// Returns once the loop is spawned; it does not wait for a first message.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for a malformed endpoint, `Connect` when the dial or
    /// handshake fails, `AlreadyConnected` if this client was connected before.
    pub async fn connect(&mut self) -> Result<Inbound, ClientError> {
        if !matches!(self.state, ConnectionState::Disconnected) {
            return Err(ClientError::AlreadyConnected);
        }

        let url = parse_endpoint(&self.endpoint)?;
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|error| ClientError::Connect(Box::new(error)))?;
        info!(endpoint = %url, "connected");

        let (sink, source) = stream.split();
        let (messages_tx, messages_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let reader = tokio::spawn(read_loop(source, messages_tx, done_tx));

        self.state = ConnectionState::Connected(Connection { sink, reader });
        Ok(Inbound { messages: messages_rx, termination: Termination { rx: Some(done_rx) } })
    }

    /// Write `text` as a single text frame.
    ///
    /// # Errors
    ///
    /// `NotConnected` before `connect` succeeds or after `close`; `Send` when
    /// the transport rejects the write.
    pub async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        let ConnectionState::Connected(connection) = &mut self.state else {
            return Err(ClientError::NotConnected);
        };

        connection
            .sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|error| ClientError::Send(Box::new(error)))?;
        info!(payload = %text, "sent");
        Ok(())
    }

    /// Send a close frame and tear the connection down.
    ///
    /// No-op when never connected or already closed. Waits up to the close
    /// timeout for the read loop to see the peer's acknowledgement; past
    /// that the loop is aborted, which drops the read half and the socket.
    /// Either way the connection is gone when this returns.
    ///
    /// # Errors
    ///
    /// `Close` when the transport fails to send the close frame for a reason
    /// other than the connection already being closed.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        let (mut sink, mut reader) = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
            ConnectionState::Connected(Connection { sink, reader }) => (sink, reader),
            other => {
                self.state = other;
                return Ok(());
            }
        };

        let result = sink.close().await;
        drop(sink);
        if timeout(self.close_timeout, &mut reader).await.is_err() {
            warn!(endpoint = %self.endpoint, "peer did not acknowledge close; dropping connection");
            reader.abort();
        }

        match result {
            Ok(()) => {
                info!(endpoint = %self.endpoint, "closed");
                Ok(())
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(error) => Err(ClientError::Close(Box::new(error))),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let ConnectionState::Connected(connection) = &self.state {
            connection.reader.abort();
        }
    }
}

/// Parse and validate a WebSocket endpoint.
///
/// # Errors
///
/// Returns `InvalidAddress` when the string is not a URL, the scheme is not
/// `ws`/`wss`, or the host is missing.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidAddress { endpoint: endpoint.to_owned(), reason };

    let url = Url::parse(endpoint).map_err(|error| invalid(error.to_string()))?;
    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(url)
}

// =============================================================================
// READ LOOP
// =============================================================================

async fn read_loop(
    mut source: WsSource,
    messages: mpsc::UnboundedSender<String>,
    done: oneshot::Sender<ReadError>,
) {
    let cause = loop {
        let Some(message) = source.next().await else {
            break ReadError::PeerClosed { code: None, reason: String::new() };
        };
        match message {
            Ok(Message::Text(text)) => forward(&messages, text.to_string()),
            Ok(Message::Binary(bytes)) => forward(&messages, String::from_utf8_lossy(&bytes).into_owned()),
            Ok(Message::Close(frame)) => break peer_closed(frame),
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed) => {
                break ReadError::PeerClosed { code: None, reason: String::new() };
            }
            Err(error) => break ReadError::Transport(Box::new(error)),
        }
    };

    warn!(error = %cause, "read error");
    // The receiver may already be gone; the loop exits either way.
    let _ = done.send(cause);
}

fn forward(messages: &mpsc::UnboundedSender<String>, payload: String) {
    info!(payload = %payload, "received");
    let _ = messages.send(payload);
}

fn peer_closed(frame: Option<CloseFrame>) -> ReadError {
    match frame {
        Some(frame) => ReadError::PeerClosed { code: Some(u16::from(frame.code)), reason: frame.reason.to_string() },
        None => ReadError::PeerClosed { code: None, reason: String::new() },
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
