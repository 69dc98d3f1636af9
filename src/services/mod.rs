//! # Services wired together by the node.
//!
//! - [`Service`] - lifecycle contract every registered subsystem implements
//! - [`ServiceRef`] - shared handle (`Arc<dyn Service>`)
//! - [`Worker`] - background loop owned by a service
//!
//! Built-in services, in build order:
//!
//! ```text
//! p2p::Server ─► txpool::TxPool            (proposer only)
//! rpcclient::RpcClient ─► beacon::Beacon ─► actors::{Attester | Proposer}
//! ```

pub mod actors;
pub mod beacon;
pub mod p2p;
pub mod rpcclient;
pub mod txpool;

mod service;
mod worker;

pub use service::{Service, ServiceRef};
pub use worker::Worker;
