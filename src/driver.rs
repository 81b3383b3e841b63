//! Process driver — connect, send one message, wait for the end.
//!
//! DESIGN
//! ======
//! `run` is the whole end-to-end behaviour of the binary, minus signal
//! wiring and exit codes. Every await that can block on the network is
//! raced against the `Shutdown` token, and the client is closed on every
//! path that got past `connect`.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::Client;
use crate::error::{ClientError, ReadError};
use crate::shutdown::Shutdown;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080";
pub const DEFAULT_MESSAGE: &str = "Hello from Rust!";
pub const DEFAULT_SEND_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub endpoint: String,
    /// Sent once, after `send_delay`.
    pub message: String,
    pub send_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            message: DEFAULT_MESSAGE.to_owned(),
            send_delay: Duration::from_millis(DEFAULT_SEND_DELAY_MS),
        }
    }
}

/// Which path ended the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The read loop terminated (peer close or transport failure).
    ConnectionClosed,
    /// The shutdown token fired first.
    Interrupted,
}

#[derive(Debug)]
pub struct RunSummary {
    pub exit: ExitReason,
    /// Payloads received before the run ended, in arrival order.
    pub received: Vec<String>,
    /// Terminal read cause; only set when `exit` is `ConnectionClosed`.
    pub read_error: Option<ReadError>,
}

impl RunSummary {
    fn interrupted(received: Vec<String>) -> Self {
        Self { exit: ExitReason::Interrupted, received, read_error: None }
    }
}

/// Run the client once against `config.endpoint`.
///
/// # Errors
///
/// Returns the connect error if the initial connection fails. Send and
/// close failures are logged and do not fail the run.
pub async fn run(config: &DriverConfig, shutdown: &Shutdown) -> Result<RunSummary, ClientError> {
    let mut client = Client::new(config.endpoint.clone());

    let mut inbound = tokio::select! {
        biased;
        () = shutdown.triggered() => {
            info!("shutdown requested before connect");
            return Ok(RunSummary::interrupted(Vec::new()));
        }
        result = client.connect() => result?,
    };

    let interrupted_early = tokio::select! {
        biased;
        () = shutdown.triggered() => true,
        () = tokio::time::sleep(config.send_delay) => false,
    };
    if interrupted_early {
        close_client(&mut client).await;
        return Ok(RunSummary::interrupted(Vec::new()));
    }

    if let Err(error) = client.send(&config.message).await {
        warn!(error = %error, "send failed");
    }

    let mut received = Vec::new();
    let (exit, read_error) = loop {
        tokio::select! {
            biased;
            () = shutdown.triggered() => break (ExitReason::Interrupted, None),
            Some(payload) = inbound.messages.recv() => received.push(payload),
            cause = inbound.termination.wait() => break (ExitReason::ConnectionClosed, cause),
        }
    };

    close_client(&mut client).await;
    info!(endpoint = client.endpoint(), exit = ?exit, received = received.len(), "connection closed");
    Ok(RunSummary { exit, received, read_error })
}

async fn close_client(client: &mut Client) {
    if let Err(error) = client.close().await {
        warn!(error = %error, "close failed");
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
