//! # Actor services: attester and proposer.
//!
//! Both follow beacon slots and perform their duty once per slot. They are
//! distinct capability types so the registry can hold either one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::services::beacon::Beacon;
use crate::services::{Service, Worker};

/// Performs the slot duty for every published slot until cancelled or the feed closes.
async fn follow_slots(
    actor: &'static str,
    token: CancellationToken,
    mut slots: broadcast::Receiver<u64>,
    done: Arc<AtomicU64>,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            slot = slots.recv() => match slot {
                Ok(slot) => {
                    done.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(actor, slot, "performing slot duty");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(actor, skipped, "missed beacon slots");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// Attests to collations every slot.
pub struct Attester {
    beacon: Arc<Beacon>,
    attested: Arc<AtomicU64>,
    worker: Worker,
}

impl Attester {
    /// Creates the actor on top of `beacon`.
    pub fn new(beacon: Arc<Beacon>) -> Self {
        Self {
            beacon,
            attested: Arc::new(AtomicU64::new(0)),
            worker: Worker::new("attester"),
        }
    }

    /// Number of slots attested so far.
    pub fn attested(&self) -> u64 {
        self.attested.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Service for Attester {
    fn name(&self) -> &str {
        "attester"
    }

    fn start(&self) -> Result<(), ServiceError> {
        let slots = self.beacon.subscribe_slots();
        let done = Arc::clone(&self.attested);
        self.worker
            .spawn(|token| follow_slots("attester", token, slots, done))
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.worker.shutdown().await
    }
}

/// Proposes collations every slot.
pub struct Proposer {
    beacon: Arc<Beacon>,
    proposed: Arc<AtomicU64>,
    worker: Worker,
}

impl Proposer {
    /// Creates the actor on top of `beacon`.
    pub fn new(beacon: Arc<Beacon>) -> Self {
        Self {
            beacon,
            proposed: Arc::new(AtomicU64::new(0)),
            worker: Worker::new("proposer"),
        }
    }

    /// Number of slots proposed for so far.
    pub fn proposed(&self) -> u64 {
        self.proposed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Service for Proposer {
    fn name(&self) -> &str {
        "proposer"
    }

    fn start(&self) -> Result<(), ServiceError> {
        let slots = self.beacon.subscribe_slots();
        let done = Arc::clone(&self.proposed);
        self.worker
            .spawn(|token| follow_slots("proposer", token, slots, done))
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.worker.shutdown().await
    }
}
