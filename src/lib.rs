//! Minimal WebSocket client.
//!
//! A `Client` dials a `ws://`/`wss://` endpoint, runs one background read
//! loop, and exposes `send` and `close`. The `driver` module wires it into
//! the connect → send → wait → close flow used by the binary.

pub mod client;
pub mod driver;
pub mod error;
pub mod shutdown;

#[cfg(test)]
mod test_support;

pub use client::{Client, Inbound, Termination};
pub use error::{ClientError, ReadError};
pub use shutdown::Shutdown;
