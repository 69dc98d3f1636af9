//! # Remote-procedure client.
//!
//! Holds the endpoint of the beacon RPC provider. Construction never touches the
//! endpoint; `start` validates it and records it as the active target, which the
//! beacon service reads on every slot.

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::error::ServiceError;
use crate::services::Service;

/// RPC client settings.
#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// Provider endpoint, e.g. `http://localhost:4000/`.
    pub endpoint: String,
}

/// RPC client service.
pub struct RpcClient {
    cfg: RpcConfig,
    target: Mutex<Option<Url>>,
}

impl RpcClient {
    /// Creates an unconnected client.
    pub fn new(cfg: RpcConfig) -> Self {
        Self {
            cfg,
            target: Mutex::new(None),
        }
    }

    /// Configured endpoint, as given.
    pub fn endpoint(&self) -> &str {
        &self.cfg.endpoint
    }

    /// Active target, `None` before a successful start or after stop.
    pub fn target(&self) -> Option<Url> {
        self.target.lock().clone()
    }
}

#[async_trait]
impl Service for RpcClient {
    fn name(&self) -> &str {
        "rpcclient"
    }

    fn start(&self) -> Result<(), ServiceError> {
        let url = Url::parse(&self.cfg.endpoint).map_err(|e| {
            ServiceError::start(format!("invalid endpoint {:?}: {e}", self.cfg.endpoint))
        })?;
        tracing::info!(endpoint = %url, "rpc client ready");
        *self.target.lock() = Some(url);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.target.lock().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_target_follows_lifecycle() {
        let client = RpcClient::new(RpcConfig {
            endpoint: "http://localhost:4000/".into(),
        });
        assert!(client.target().is_none());

        client.start().unwrap();
        assert_eq!(client.target().unwrap().port(), Some(4000));

        client.stop().await.unwrap();
        assert!(client.target().is_none());
    }

    #[test]
    fn test_invalid_endpoint_fails_start_only() {
        let client = RpcClient::new(RpcConfig {
            endpoint: "::not a url::".into(),
        });
        assert_eq!(client.endpoint(), "::not a url::");

        let err = client.start().unwrap_err();
        assert_eq!(err.as_label(), "service_start_failed");
        assert!(client.target().is_none());
    }
}
