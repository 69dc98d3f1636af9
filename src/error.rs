//! Error types used by the node supervisor, the service registry and services.
//!
//! This module defines four error enums:
//!
//! - [`RegistryError`] - contract violations of the service registry (build phase).
//! - [`ServiceError`] - failures of individual services (construction, start, stop).
//! - [`StorageError`] - failures of the persistent storage handle.
//! - [`NodeError`] - everything that can abort node construction.
//!
//! All types provide an `as_label` helper returning a short stable label for logs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the service registry.
///
/// Both variants are programming errors in the build phase and abort node
/// construction immediately.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A service of the same capability type is already registered.
    #[error("service already registered: {service}")]
    DuplicateService {
        /// Type name of the capability.
        service: &'static str,
    },

    /// No service of the requested capability type was registered.
    #[error("unregistered service: {service}")]
    UnregisteredService {
        /// Type name of the capability.
        service: &'static str,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use shardvisor::RegistryError;
    ///
    /// let err = RegistryError::UnregisteredService { service: "beacon" };
    /// assert_eq!(err.as_label(), "registry_unregistered_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateService { .. } => "registry_duplicate_service",
            RegistryError::UnregisteredService { .. } => "registry_unregistered_service",
        }
    }
}

/// # Errors produced by services.
///
/// `Construction` aborts node construction. Every other variant is a best-effort
/// runtime fault: it is logged and the remaining services are still started/stopped.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service could not be created.
    #[error("could not create {service} service: {error}")]
    Construction {
        /// Service name.
        service: &'static str,
        /// The underlying error message.
        error: String,
    },

    /// The service failed to begin its background work.
    #[error("start failed: {error}")]
    Start {
        /// The underlying error message.
        error: String,
    },

    /// The service failed to release its resources cleanly.
    #[error("stop failed: {error}")]
    Stop {
        /// The underlying error message.
        error: String,
    },

    /// The service did not finish stopping within the configured timeout.
    #[error("stop timed out after {timeout:?}")]
    StopTimeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// `start` was called on a service whose background work is already running.
    #[error("already started")]
    AlreadyStarted,

    /// `start` was called outside of a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Construction { .. } => "service_construction",
            ServiceError::Start { .. } => "service_start_failed",
            ServiceError::Stop { .. } => "service_stop_failed",
            ServiceError::StopTimeout { .. } => "service_stop_timeout",
            ServiceError::AlreadyStarted => "service_already_started",
            ServiceError::NoRuntime => "service_no_runtime",
        }
    }

    /// Shorthand for [`ServiceError::Start`].
    pub fn start(error: impl Into<String>) -> Self {
        ServiceError::Start {
            error: error.into(),
        }
    }

    /// Shorthand for [`ServiceError::Stop`].
    pub fn stop(error: impl Into<String>) -> Self {
        ServiceError::Stop {
            error: error.into(),
        }
    }
}

/// # Errors produced by the persistent storage handle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database could not be opened at the given location.
    #[error("could not open database at {path:?}: {source}")]
    Open {
        /// Location of the database.
        path: PathBuf,
        /// Engine error.
        #[source]
        source: sled::Error,
    },

    /// The database could not be flushed on close.
    #[error("could not close database: {source}")]
    Close {
        /// Engine error.
        #[source]
        source: sled::Error,
    },
}

impl StorageError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Open { .. } => "storage_open_failed",
            StorageError::Close { .. } => "storage_close_failed",
        }
    }
}

/// # Errors that abort node construction.
///
/// No partially built node is ever returned alongside one of these.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum NodeError {
    /// Persistent storage could not be opened.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The build phase violated the registry contract.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A service could not be created.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl NodeError {
    /// Returns the label of the wrapped error.
    ///
    /// # Example
    /// ```
    /// use shardvisor::{NodeError, RegistryError};
    ///
    /// let err = NodeError::from(RegistryError::DuplicateService { service: "p2p" });
    /// assert_eq!(err.as_label(), "registry_duplicate_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            NodeError::Storage(e) => e.as_label(),
            NodeError::Registry(e) => e.as_label(),
            NodeError::Service(e) => e.as_label(),
        }
    }
}
