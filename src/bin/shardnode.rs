//! Sharding client node.
//!
//! Log filtering follows `RUST_LOG`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use shardvisor::{ActorRole, Config, Node};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "shardnode", version)]
#[command(about = "Sharding client node", long_about = None)]
struct Cli {
    /// Role of this node: attester or proposer (anything else runs without an actor)
    #[arg(long, value_name = "ROLE")]
    actor: Option<String>,

    /// Directory holding the node database
    #[arg(long, value_name = "DIR")]
    datadir: Option<PathBuf>,

    /// Beacon chain RPC endpoint
    #[arg(long, value_name = "URL")]
    beacon_rpc_provider: Option<String>,

    /// Socket address announced by the p2p server
    #[arg(long, value_name = "ADDR")]
    p2p_listen_addr: Option<String>,
}

impl Cli {
    /// Applies the given flags on top of [`Config::default`].
    fn into_config(self) -> Config {
        let mut cfg = Config::default();
        if let Some(actor) = self.actor {
            cfg.actor = ActorRole::from_flag(&actor);
        }
        if let Some(dir) = self.datadir {
            cfg.data_dir = dir;
        }
        if let Some(endpoint) = self.beacon_rpc_provider {
            cfg.beacon_endpoint = endpoint;
        }
        if let Some(addr) = self.p2p_listen_addr {
            cfg.p2p_listen_addr = addr;
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Cli::parse().into_config();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardvisor=info,shardnode=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let node = Node::new(cfg).context("failed to build node")?;
    let cfg = node.config();
    tracing::info!(
        actor = %cfg.actor,
        data_dir = %cfg.data_dir.display(),
        endpoint = %cfg.beacon_endpoint,
        p2p = %cfg.p2p_listen_addr,
        "starting sharding client"
    );

    node.start().await;
    tracing::info!("node exited cleanly");
    Ok(())
}
