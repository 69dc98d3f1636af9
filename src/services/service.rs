//! # Service abstraction.
//!
//! A [`Service`] is a long-running subsystem with a non-blocking [`start`](Service::start)
//! and an async [`stop`](Service::stop). The common handle type is [`ServiceRef`].
//!
//! No cancellation token is handed to `start`: each service owns the cancellation of
//! its background work and must interrupt it in `stop`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;

/// # Lifecycle contract of a registered subsystem.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use shardvisor::{Service, ServiceError};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Service for Noop {
///     fn name(&self) -> &str { "noop" }
///
///     fn start(&self) -> Result<(), ServiceError> {
///         Ok(())
///     }
///
///     async fn stop(&self) -> Result<(), ServiceError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Returns a stable, human-readable service name.
    fn name(&self) -> &str;

    /// Begins background work and returns without waiting for it.
    fn start(&self) -> Result<(), ServiceError>;

    /// Interrupts background work and resolves once resources are released.
    async fn stop(&self) -> Result<(), ServiceError>;
}

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;
