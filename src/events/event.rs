//! # Lifecycle events emitted by the node, the registry and the signal handler.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Registry events**: service registration, start and stop outcomes
//! - **Storage events**: database opened/closed
//! - **Node events**: node start and stop
//! - **Shutdown events**: signal-driven shutdown and its escalation
//!
//! The [`Event`] struct carries additional metadata such as timestamps, service
//! name, reasons and the remaining notification tolerance.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use shardvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ServiceStartFailed)
//!     .with_service("rpcclient")
//!     .with_reason("invalid endpoint");
//!
//! assert_eq!(ev.kind, EventKind::ServiceStartFailed);
//! assert_eq!(ev.service.as_deref(), Some("rpcclient"));
//! assert_eq!(ev.reason.as_deref(), Some("invalid endpoint"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// Service added to the registry.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceRegistered,

    /// `start` is about to be called on a service.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceStarting,

    /// `start` returned successfully.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceStarted,

    /// `start` returned an error; the remaining services are still started.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `reason`: error message
    ServiceStartFailed,

    /// `stop` returned successfully.
    ///
    /// Sets:
    /// - `service`: service name
    ServiceStopped,

    /// `stop` returned an error or timed out; the remaining services are still stopped.
    ///
    /// Sets:
    /// - `service`: service name
    /// - `reason`: error message
    /// - `timeout_ms`: configured stop timeout (only when it was exceeded)
    ServiceStopFailed,

    // === Storage events ===
    /// Database opened.
    ///
    /// Sets:
    /// - `reason`: database location
    StorageOpened,

    /// Database flushed and closed.
    StorageClosed,

    /// Database close failed.
    ///
    /// Sets:
    /// - `reason`: error message
    StorageCloseFailed,

    // === Node events ===
    /// Node is starting its services.
    NodeStarting,

    /// All services were asked to start.
    NodeStarted,

    /// Node finished its close sequence; `start` is released.
    NodeStopped,

    // === Shutdown events ===
    /// First interrupt notification observed; graceful close begins.
    ///
    /// Sets:
    /// - `remaining`: notifications left before forced exit
    ShutdownRequested,

    /// Further interrupt notification while shutting down.
    ///
    /// Sets:
    /// - `remaining`: notifications left before forced exit
    ShutdownEscalated,

    /// Notification tolerance exhausted; the process is terminated abnormally.
    ForcedTermination,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the service, if applicable.
    pub service: Option<Arc<str>>,
    /// Human-readable reason (errors, locations).
    pub reason: Option<Arc<str>>,
    /// Stop timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Interrupt notifications left before forced exit.
    pub remaining: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            reason: None,
            timeout_ms: None,
            remaining: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches the remaining notification tolerance.
    #[inline]
    pub fn with_remaining(mut self, n: u32) -> Self {
        self.remaining = Some(n);
        self
    }
}
