//! # Transaction relay.
//!
//! Registered for proposers only. Relays synthetic transactions through the p2p
//! feed at a fixed interval so the proposer has data to serialize into collations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::services::p2p::{Message, Server};
use crate::services::{Service, Worker};

/// Transaction pool relaying over the networking service.
pub struct TxPool {
    p2p: Arc<Server>,
    interval: Duration,
    relayed: Arc<AtomicU64>,
    worker: Worker,
}

impl TxPool {
    /// Creates the pool on top of `p2p`; `interval` must be non-zero.
    pub fn new(p2p: Arc<Server>, interval: Duration) -> Result<Self, ServiceError> {
        if interval.is_zero() {
            return Err(ServiceError::Construction {
                service: "txpool",
                error: "relay interval must be non-zero".to_string(),
            });
        }
        Ok(Self {
            p2p,
            interval,
            relayed: Arc::new(AtomicU64::new(0)),
            worker: Worker::new("txpool"),
        })
    }

    /// Number of transactions handed to the networking service so far.
    pub fn relayed(&self) -> u64 {
        self.relayed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Service for TxPool {
    fn name(&self) -> &str {
        "txpool"
    }

    fn start(&self) -> Result<(), ServiceError> {
        let p2p = Arc::clone(&self.p2p);
        let relayed = Arc::clone(&self.relayed);
        let period = self.interval;

        self.worker.spawn(|token| async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let payload: [u8; 32] = rand::random();
                        if p2p.broadcast(Message::Transaction(payload.to_vec())) {
                            relayed.fetch_add(1, Ordering::Relaxed);
                        } else {
                            tracing::debug!("p2p queue full, transaction dropped");
                        }
                    }
                }
            }
        })
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.worker.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        let p2p = Arc::new(Server::new("127.0.0.1:0").unwrap());
        assert!(TxPool::new(p2p, Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_relays_into_p2p_feed() {
        let p2p = Arc::new(Server::new("127.0.0.1:0").unwrap());
        let mut feed = p2p.subscribe();
        let pool = TxPool::new(Arc::clone(&p2p), Duration::from_millis(5)).unwrap();

        p2p.start().unwrap();
        pool.start().unwrap();

        let Message::Transaction(payload) = feed.recv().await.unwrap();
        assert_eq!(payload.len(), 32);
        assert!(pool.relayed() >= 1);

        pool.stop().await.unwrap();
        p2p.stop().await.unwrap();
    }
}
