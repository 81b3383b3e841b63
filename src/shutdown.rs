//! Cancellation token for the driver.
//!
//! The driver never touches process signals itself; it is handed a
//! `Shutdown` and races its work against `Shutdown::triggered`. Only the
//! binary wires the token to Ctrl+C via `spawn_interrupt_listener`.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Cloneable one-way cancellation flag. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Trigger cancellation. Returns `true` only for the call that flipped the flag.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|triggered| {
            if *triggered {
                return false;
            }
            *triggered = true;
            true
        })
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `trigger` has been called on any clone.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as `self`, so this only returns on trigger.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

/// Trigger `shutdown` on the first Ctrl+C.
pub fn spawn_interrupt_listener(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received");
                shutdown.trigger();
            }
            Err(error) => warn!(error = %error, "failed to listen for interrupt"),
        }
    })
}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
