//! Unix signal handling for the server.
//!
//! SIGTERM and SIGINT request a graceful shutdown. The serving loop runs on
//! a blocking thread, so the signal is forwarded to it through a
//! [`ShutdownHandle`].

use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::socket::ShutdownHandle;

/// Signal handler that manages Unix signal processing.
pub struct SignalHandler {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    /// Creates a new signal handler.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Installs the signal handlers and spawns the listener task.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn spawn_listener(&self) -> io::Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
                _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
            }
            let _ = shutdown_tx.send(true);
            debug!("Signal listener stopped");
        });
        Ok(())
    }

    /// Non-Unix implementation: Ctrl+C only.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) -> io::Result<()> {
        let shutdown_tx = self.shutdown_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received Ctrl+C, initiating shutdown");
                let _ = shutdown_tx.send(true);
            }
        });
        Ok(())
    }

    /// Returns a future that completes when a shutdown signal is received.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.shutdown_rx.clone(),
        }
    }

    /// Returns true if shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Spawns a task that stops the server once shutdown is signaled.
    pub fn forward_to(&self, server: ShutdownHandle) -> JoinHandle<()> {
        let signal = self.shutdown();
        tokio::spawn(async move {
            signal.wait().await;
            debug!("Forwarding shutdown to command server");
            server.trigger();
        })
    }
}

/// A signal that completes when shutdown is signaled.
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for the shutdown signal.
    pub async fn wait(mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
