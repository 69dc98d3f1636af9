//! # Peer-to-peer networking service.
//!
//! In-process stand-in for the shard gossip network: messages handed to
//! [`Server::broadcast`] are queued and, while the service runs, relayed to every
//! [`Server::subscribe`] receiver. The server owns a random 32-byte peer identity and
//! the socket address it announces.

use std::net::SocketAddr;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::error::ServiceError;
use crate::services::{Service, Worker};

const OUTBOUND_CAPACITY: usize = 256;
const FEED_CAPACITY: usize = 256;

/// Gossip payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Serialized transaction relayed by the transaction pool.
    Transaction(Vec<u8>),
}

/// Networking service.
pub struct Server {
    peer_id: [u8; 32],
    listen_addr: SocketAddr,
    outbound: mpsc::Sender<Message>,
    pending: Mutex<Option<mpsc::Receiver<Message>>>,
    feed: broadcast::Sender<Message>,
    worker: Worker,
}

impl Server {
    /// Creates the server; fails when `listen_addr` is not a usable socket address.
    pub fn new(listen_addr: &str) -> Result<Self, ServiceError> {
        let listen_addr: SocketAddr = listen_addr.parse().map_err(|e| ServiceError::Construction {
            service: "p2p",
            error: format!("invalid listen address {listen_addr:?}: {e}"),
        })?;

        let (outbound, pending) = mpsc::channel(OUTBOUND_CAPACITY);
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Ok(Self {
            peer_id: rand::random(),
            listen_addr,
            outbound,
            pending: Mutex::new(Some(pending)),
            feed,
            worker: Worker::new("p2p"),
        })
    }

    /// Random identity of this peer.
    pub fn peer_id(&self) -> &[u8; 32] {
        &self.peer_id
    }

    /// Announced socket address.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Queues a message for gossip. Returns `false` if the queue is full or closed.
    pub fn broadcast(&self, msg: Message) -> bool {
        self.outbound.try_send(msg).is_ok()
    }

    /// Receives every message relayed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.feed.subscribe()
    }
}

#[async_trait]
impl Service for Server {
    fn name(&self) -> &str {
        "p2p"
    }

    fn start(&self) -> Result<(), ServiceError> {
        let mut pending = self
            .pending
            .lock()
            .take()
            .ok_or(ServiceError::AlreadyStarted)?;
        let feed = self.feed.clone();

        self.worker.spawn(|token| async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = pending.recv() => match msg {
                        Some(msg) => {
                            let _ = feed.send(msg);
                        }
                        None => break,
                    },
                }
            }
        })?;

        tracing::info!(
            addr = %self.listen_addr,
            peer = ?&self.peer_id[..4],
            "p2p server started"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.worker.shutdown().await
    }
}
