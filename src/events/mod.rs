//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ServiceRegistry` (register/start/stop), `Node` (storage,
//!   start, stop), the shutdown signal handler (request, escalation, forced exit).
//! - **Consumers**: the node's subscriber listener (fans out to `SubscriberSet`,
//!   which drives `LogWriter`) and receivers obtained via `Node::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
