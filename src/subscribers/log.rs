//! # LogWriter: lifecycle events as `tracing` records
//!
//! The default subscriber installed by [`Node::new`](crate::Node::new). Failures are
//! logged at `warn`, shutdown escalation at `warn`, forced termination at `error`,
//! everything else at `info`/`debug`.
//!
//! ## Example output
//! ```text
//! INFO  service registered service="p2p"
//! INFO  starting sharding node
//! WARN  service failed to start service="rpcclient" err="start failed: ..."
//! INFO  got interrupt, shutting down
//! WARN  already shutting down, interrupt more to force-exit remaining=8
//! INFO  stopping sharding node
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ServiceRegistered => info!(service, "service registered"),
            EventKind::ServiceStarting => debug!(service, "starting service"),
            EventKind::ServiceStarted => debug!(service, "service started"),
            EventKind::ServiceStartFailed => {
                warn!(service, err = reason, "service failed to start")
            }
            EventKind::ServiceStopped => debug!(service, "service stopped"),
            EventKind::ServiceStopFailed => match e.timeout_ms {
                Some(timeout_ms) => warn!(service, timeout_ms, "service stop timed out"),
                None => warn!(service, err = reason, "service failed to stop"),
            },
            EventKind::StorageOpened => info!(path = reason, "database opened"),
            EventKind::StorageClosed => debug!("database closed"),
            EventKind::StorageCloseFailed => warn!(err = reason, "database failed to close"),
            EventKind::NodeStarting => info!("starting sharding node"),
            EventKind::NodeStarted => debug!("all services started"),
            EventKind::NodeStopped => info!("stopping sharding node"),
            EventKind::ShutdownRequested => info!("got interrupt, shutting down"),
            EventKind::ShutdownEscalated => warn!(
                remaining = e.remaining.unwrap_or(0),
                "already shutting down, interrupt more to force-exit"
            ),
            EventKind::ForcedTermination => error!("forcing exit of the sharding node"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
