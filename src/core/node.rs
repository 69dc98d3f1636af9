//! # Node: owns the services, the storage handle and their joint lifetime.
//!
//! The [`Node`] owns the [`ServiceRegistry`], the [`Database`] handle, the lifecycle
//! lock and the one-shot stop signal. It is built by [`NodeBuilder`], which registers
//! services in dependency order.
//!
//! ## Lifecycle
//! ```text
//! start():
//!   lock ─► publish NodeStarting ─► registry.start_all() ─► unlock
//!        ─► spawn signal handler ─► wait for stop signal
//!
//! close():
//!   lock ─► (already closed? return)
//!        ─► db.close() ─► registry.stop_all(stop_timeout)
//!        ─► publish NodeStopped ─► fire stop signal ─► unlock
//!
//! signal handler (see escalation):
//!   1st notification ─► tokio::spawn(close())
//!   ...                ─► warn
//!   Nth notification   ─► exit hook
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use shardvisor::{ActorRole, Config, Node};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.actor = ActorRole::Attester;
//!
//!     let node = Node::new(cfg)?;
//!     node.start().await; // returns after SIGINT/SIGTERM and a completed close
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::builder::NodeBuilder;
use crate::core::escalation::{Escalation, ExitHook, handle_signals};
use crate::core::registry::ServiceRegistry;
use crate::core::shutdown::{OsSignals, SignalSource};
use crate::error::{NodeError, RegistryError};
use crate::events::{Bus, Event, EventKind};
use crate::services::Service;
use crate::storage::Database;

/// State guarded by the lifecycle lock.
pub(crate) struct Lifecycle {
    pub(crate) registry: ServiceRegistry,
    pub(crate) db: Option<Database>,
    started: bool,
    closed: bool,
}

impl Lifecycle {
    pub(crate) fn new(registry: ServiceRegistry, db: Database) -> Self {
        Self {
            registry,
            db: Some(db),
            started: false,
            closed: false,
        }
    }
}

/// Supervisor of the node's services.
pub struct Node {
    cfg: Config,
    bus: Bus,
    lifecycle: Mutex<Lifecycle>,
    stopped: CancellationToken,
    exit: ExitHook,
}

impl Node {
    /// Builds a node with the default subscribers (`LogWriter`).
    ///
    /// Must be called from within a tokio runtime. Fails without returning a node if
    /// storage cannot be opened or any service cannot be created or registered.
    pub fn new(cfg: Config) -> Result<Arc<Self>, NodeError> {
        NodeBuilder::new(cfg).build()
    }

    /// Returns a builder to customize subscribers and the exit hook.
    pub fn builder(cfg: Config) -> NodeBuilder {
        NodeBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        lifecycle: Lifecycle,
        exit: ExitHook,
    ) -> Self {
        Self {
            cfg,
            bus,
            lifecycle: Mutex::new(lifecycle),
            stopped: CancellationToken::new(),
            exit,
        }
    }

    /// Configuration the node was built from.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Receives every lifecycle event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Starts all services, installs the OS signal handler and waits until the node
    /// is closed.
    ///
    /// Only the first call starts services and installs the handler; later calls
    /// just wait.
    pub async fn start(self: &Arc<Self>) {
        if self.start_services().await {
            match OsSignals::new() {
                Ok(signals) => self.spawn_signal_handler(signals),
                Err(e) => tracing::warn!(error = %e, "could not install signal handler"),
            }
        }
        self.wait().await;
    }

    /// Same as [`Node::start`] with interrupt notifications taken from `source`.
    ///
    /// `source` is dropped unused if the node was already started or closed.
    pub async fn start_with<S: SignalSource>(self: &Arc<Self>, source: S) {
        if self.start_services().await {
            self.spawn_signal_handler(source);
        } else {
            drop(source);
        }
        self.wait().await;
    }

    /// Closes storage, stops every service and releases [`Node::start`].
    ///
    /// Only the first call does anything; later calls return once the lock is free.
    pub async fn close(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.closed {
            return;
        }
        lifecycle.closed = true;

        if let Some(db) = lifecycle.db.take() {
            match db.close() {
                Ok(()) => self.bus.publish(Event::new(EventKind::StorageClosed)),
                Err(e) => self.bus.publish(
                    Event::new(EventKind::StorageCloseFailed).with_reason(e.to_string()),
                ),
            }
        }

        let faults = lifecycle.registry.stop_all(self.cfg.stop_timeout()).await;
        if !faults.is_empty() {
            tracing::warn!(failed = faults.len(), "some services did not stop cleanly");
        }

        self.bus.publish(Event::new(EventKind::NodeStopped));
        self.stopped.cancel();
    }

    /// Waits until [`Node::close`] has completed.
    pub async fn wait(&self) {
        self.stopped.cancelled().await;
    }

    /// True once [`Node::close`] has completed.
    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Names of the registered services, in registration order.
    pub async fn service_names(&self) -> Vec<Arc<str>> {
        self.lifecycle.lock().await.registry.names()
    }

    /// Registered service of type `S`.
    pub async fn service<S: Service>(&self) -> Result<Arc<S>, RegistryError> {
        self.lifecycle.lock().await.registry.fetch::<S>()
    }

    /// Runs `start_all` once; false if this call did not start the node.
    async fn start_services(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.started || lifecycle.closed {
            tracing::warn!(
                closed = lifecycle.closed,
                "node already started, not starting services again"
            );
            return false;
        }
        lifecycle.started = true;

        self.bus.publish(Event::new(EventKind::NodeStarting));
        let faults = lifecycle.registry.start_all();
        if !faults.is_empty() {
            tracing::warn!(failed = faults.len(), "node running degraded");
        }
        self.bus.publish(Event::new(EventKind::NodeStarted));
        true
    }

    fn spawn_signal_handler<S: SignalSource>(self: &Arc<Self>, source: S) {
        let node = Arc::clone(self);
        let begin_close = move || {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.close().await });
        };

        tokio::spawn(handle_signals(
            source,
            Escalation::new(self.cfg.force_exit_after_clamped()),
            self.bus.clone(),
            begin_close,
            Arc::clone(&self.exit),
        ));
    }
}
