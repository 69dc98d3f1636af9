//! # Interrupt notification sources.
//!
//! The shutdown handler consumes notifications from a [`SignalSource`]. Production
//! uses [`OsSignals`]; tests and embedders with their own signal plumbing can feed
//! synthetic notifications through a `tokio::sync::mpsc::Receiver<()>`.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Listeners are created once and kept for the life of the source, so every repeated
//! signal is observed (the escalation policy depends on counting them).

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Stream of interrupt notifications.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Waits for the next notification; `None` once the source is exhausted.
    async fn recv(&mut self) -> Option<()>;
}

#[async_trait]
impl SignalSource for mpsc::Receiver<()> {
    async fn recv(&mut self) -> Option<()> {
        mpsc::Receiver::recv(self).await
    }
}

/// Process signal listeners.
#[cfg(unix)]
pub struct OsSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Installs the listeners. Fails if signal registration fails.
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(unix)]
#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<()> {
        tokio::select! {
            v = self.sigint.recv()  => v,
            v = self.sigterm.recv() => v,
        }
    }
}

/// Process signal listeners.
#[cfg(not(unix))]
pub struct OsSignals {
    _priv: (),
}

#[cfg(not(unix))]
impl OsSignals {
    /// Installs the listeners.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { _priv: () })
    }
}

#[cfg(not(unix))]
#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<()> {
        tokio::signal::ctrl_c().await.ok()
    }
}
