//! # shardvisor
//!
//! **Shardvisor** is the service lifecycle supervisor of a sharding client node.
//!
//! It owns a set of long-running subsystems (peer-to-peer networking, a transaction
//! relay, an RPC client, a beacon follower and a role-specific actor) together with a
//! persistent key-value store, and coordinates their joint lifetime: ordered
//! construction with dependency lookup, best-effort start, guarded one-shot shutdown
//! and escalation from graceful close to forced termination on repeated interrupts.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!      Config ──► NodeBuilder::build()
//!                    │
//!                    ├─► Database::open(data_dir/shardchaindata)
//!                    └─► ServiceRegistry::register(...)   (dependency order)
//!                              │
//! ┌────────────────────────────▼──────────────────────────────────────┐
//! │  Node (lifecycle owner)                                           │
//! │  - ServiceRegistry (TypeId ─► service, registration order)        │
//! │  - Database handle                                                │
//! │  - lifecycle lock + stop signal                                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐      ┌──────────┐      ┌────────────┐
//!   │   p2p    │ ...  │  beacon  │ ...  │  attester  │   Service::start / stop
//!   └──────────┘      └──────────┘      └────────────┘
//!        │ Publishes        │                  │
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     Bus (broadcast channel)                       │
//! │                  (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter    sub2  ...   subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! build:  storage ─► p2p ─► [txpool] ─► rpcclient ─► beacon ─► [attester|proposer]
//! start:  start_all in registration order (failures logged, node keeps running)
//! signal: 1st ─► spawn close()      2nd..9th ─► warn      10th ─► exit(1)
//! close:  storage ─► stop_all in reverse order ─► NodeStopped ─► start() returns
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Supervision**   | Build, start and close the node.                              | [`Node`], [`NodeBuilder`]                 |
//! | **Registry**      | One instance per concrete type, typed lookup.                 | [`ServiceRegistry`], [`Service`]          |
//! | **Shutdown**      | Interrupt counting and forced termination.                    | [`Escalation`], [`SignalSource`]          |
//! | **Subscriber API**| Hook into lifecycle events (logging, custom subscribers).     | [`Subscribe`], [`LogWriter`]              |
//! | **Errors**        | Typed errors for registry, services and storage.              | [`NodeError`], [`ServiceError`]           |
//! | **Configuration** | Centralize node settings.                                     | [`Config`], [`ActorRole`]                 |
//!
//! ## Example
//! ```rust,no_run
//! use shardvisor::{ActorRole, Config, Node};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         actor: ActorRole::Proposer,
//!         ..Config::default()
//!     };
//!
//!     let node = Node::new(cfg)?;
//!     node.start().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
pub mod services;
mod storage;
mod subscribers;

// ---- Public re-exports ----

pub use config::{ActorRole, Config, SHARD_CHAIN_DB_NAME};
pub use crate::core::{
    Escalation, ExitHook, Node, NodeBuilder, OsSignals, ServiceFault, ServiceRegistry,
    ShutdownState, SignalAction, SignalSource, force_exit, handle_signals,
};
pub use error::{NodeError, RegistryError, ServiceError, StorageError};
pub use events::{Bus, Event, EventKind};
pub use services::{Service, ServiceRef, Worker};
pub use storage::{Database, DbConfig};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
