//! Error taxonomy for the client lifecycle.
//!
//! `ClientError` covers everything a caller can get back from `Client`
//! operations. `ReadError` is never returned from a call: it is the terminal
//! cause reported by the read loop through `Termination`.

use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The endpoint is not a parseable `ws://` or `wss://` URL.
    #[error("invalid address `{endpoint}`: {reason}")]
    InvalidAddress { endpoint: String, reason: String },
    /// DNS, TCP, TLS, or handshake failure while dialing.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tungstenite::Error>),
    /// `connect` was called on a client that already holds (or held) a connection.
    #[error("client already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("websocket send failed: {0}")]
    Send(Box<tungstenite::Error>),
    #[error("websocket close failed: {0}")]
    Close(Box<tungstenite::Error>),
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The peer sent a close frame or ended the stream.
    #[error("connection closed by peer (code={code:?}, reason={reason:?})")]
    PeerClosed { code: Option<u16>, reason: String },
    /// Network or protocol failure on the read half.
    #[error("websocket read failed: {0}")]
    Transport(Box<tungstenite::Error>),
}

impl ReadError {
    #[must_use]
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, Self::PeerClosed { .. })
    }
}
