//! # NodeBuilder: the build phase.
//!
//! Opens storage and registers services strictly in dependency order; each step can
//! [`fetch`](ServiceRegistry::fetch) what earlier steps registered:
//!
//! ```text
//! 1. storage   Database::open(data_dir/shardchaindata)           fatal on error
//! 2. p2p       Server::new(listen_addr)                          fatal on error
//! 3. txpool    TxPool::new(fetch::<Server>)          proposer only
//! 4. rpc       RpcClient::new(beacon_endpoint)
//! 5. beacon    Beacon::new(fetch::<RpcClient>)
//! 6. actor     Attester | Proposer ::new(fetch::<Beacon>)         none: skipped
//! ```
//!
//! Any error aborts the build; no node is returned and the opened database is dropped.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use super::escalation::{ExitHook, force_exit};
use super::node::{Lifecycle, Node};
use super::registry::ServiceRegistry;
use crate::config::{ActorRole, Config, SHARD_CHAIN_DB_NAME};
use crate::error::NodeError;
use crate::events::{Bus, Event, EventKind};
use crate::services::actors::{Attester, Proposer};
use crate::services::beacon::{Beacon, BeaconConfig};
use crate::services::p2p::Server;
use crate::services::rpcclient::{RpcClient, RpcConfig};
use crate::services::txpool::TxPool;
use crate::storage::{Database, DbConfig};
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

/// Builder for constructing a [`Node`].
pub struct NodeBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    exit: ExitHook,
}

impl NodeBuilder {
    /// Creates a builder with the [`LogWriter`] subscriber and the process-exit hook.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: vec![Arc::new(LogWriter::new())],
            exit: force_exit(),
        }
    }

    /// Replaces the event subscribers (include [`LogWriter`] to keep logging).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the hook run on forced termination.
    pub fn with_exit_hook(mut self, exit: ExitHook) -> Self {
        self.exit = exit;
        self
    }

    /// Runs the build phase and returns the node.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Arc<Node>, NodeError> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        subscriber_listener(&bus, self.subscribers);

        let db = Database::open(&DbConfig {
            data_dir: self.cfg.data_dir.clone(),
            name: SHARD_CHAIN_DB_NAME.to_string(),
            in_memory: self.cfg.in_memory,
        })?;
        let location = db
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        bus.publish(Event::new(EventKind::StorageOpened).with_reason(location));

        let mut registry = ServiceRegistry::new(bus.clone());
        register_p2p(&self.cfg, &mut registry)?;
        register_txpool(&self.cfg, &mut registry)?;
        register_rpc_client(&self.cfg, &mut registry)?;
        register_beacon(&self.cfg, &mut registry)?;
        register_actor(&self.cfg, &mut registry)?;

        Ok(Arc::new(Node::new_internal(
            self.cfg,
            bus,
            Lifecycle::new(registry, db),
            self.exit,
        )))
    }
}

/// Forwards bus events to the subscribers until every bus sender is dropped.
fn subscriber_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) {
    if subscribers.is_empty() {
        return;
    }
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers);

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}

fn register_p2p(cfg: &Config, registry: &mut ServiceRegistry) -> Result<(), NodeError> {
    let server = Server::new(&cfg.p2p_listen_addr)?;
    registry.register(Arc::new(server))?;
    Ok(())
}

/// Relays transactions for the proposer; a no-op for other roles.
fn register_txpool(cfg: &Config, registry: &mut ServiceRegistry) -> Result<(), NodeError> {
    if cfg.actor != ActorRole::Proposer {
        return Ok(());
    }
    let p2p = registry.fetch::<Server>()?;
    let pool = TxPool::new(p2p, cfg.tx_interval)?;
    registry.register(Arc::new(pool))?;
    Ok(())
}

fn register_rpc_client(cfg: &Config, registry: &mut ServiceRegistry) -> Result<(), NodeError> {
    let client = RpcClient::new(RpcConfig {
        endpoint: cfg.beacon_endpoint.clone(),
    });
    registry.register(Arc::new(client))?;
    Ok(())
}

fn register_beacon(cfg: &Config, registry: &mut ServiceRegistry) -> Result<(), NodeError> {
    let rpc = registry.fetch::<RpcClient>()?;
    let beacon = Beacon::new(
        BeaconConfig {
            slot_duration: cfg.slot_duration,
        },
        rpc,
    )?;
    registry.register(Arc::new(beacon))?;
    Ok(())
}

fn register_actor(cfg: &Config, registry: &mut ServiceRegistry) -> Result<(), NodeError> {
    match cfg.actor {
        ActorRole::None => {}
        ActorRole::Attester => {
            let beacon = registry.fetch::<Beacon>()?;
            registry.register(Arc::new(Attester::new(beacon)))?;
        }
        ActorRole::Proposer => {
            let beacon = registry.fetch::<Beacon>()?;
            registry.register(Arc::new(Proposer::new(beacon)))?;
        }
    }
    Ok(())
}
