//! # Beacon coordination service.
//!
//! Follows the beacon chain through the RPC client and publishes slot numbers to
//! actor services. A slot is only published while the RPC client has an active
//! target; otherwise the tick is skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::ServiceError;
use crate::services::rpcclient::RpcClient;
use crate::services::{Service, Worker};

const SLOT_FEED_CAPACITY: usize = 64;

/// Beacon service settings.
#[derive(Clone, Debug)]
pub struct BeaconConfig {
    /// Period between slots; must be non-zero.
    pub slot_duration: Duration,
}

/// Beacon service.
pub struct Beacon {
    cfg: BeaconConfig,
    rpc: Arc<RpcClient>,
    slots: broadcast::Sender<u64>,
    current: Arc<AtomicU64>,
    worker: Worker,
}

impl Beacon {
    /// Creates the service on top of `rpc`.
    pub fn new(cfg: BeaconConfig, rpc: Arc<RpcClient>) -> Result<Self, ServiceError> {
        if cfg.slot_duration.is_zero() {
            return Err(ServiceError::Construction {
                service: "beacon",
                error: "slot duration must be non-zero".to_string(),
            });
        }
        let (slots, _) = broadcast::channel(SLOT_FEED_CAPACITY);
        Ok(Self {
            cfg,
            rpc,
            slots,
            current: Arc::new(AtomicU64::new(0)),
            worker: Worker::new("beacon"),
        })
    }

    /// Receives every slot published after this call.
    pub fn subscribe_slots(&self) -> broadcast::Receiver<u64> {
        self.slots.subscribe()
    }

    /// Last published slot (0 before the first one).
    pub fn current_slot(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Service for Beacon {
    fn name(&self) -> &str {
        "beacon"
    }

    fn start(&self) -> Result<(), ServiceError> {
        let rpc = Arc::clone(&self.rpc);
        let slots = self.slots.clone();
        let current = Arc::clone(&self.current);
        let period = self.cfg.slot_duration;

        self.worker.spawn(|token| async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(target) = rpc.target() else {
                            tracing::debug!("rpc client not connected, skipping slot");
                            continue;
                        };
                        let slot = current.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(slot, endpoint = %target, "new beacon slot");
                        let _ = slots.send(slot);
                    }
                }
            }
        })
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.worker.shutdown().await
    }
}
