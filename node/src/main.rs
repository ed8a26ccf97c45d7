//! Strongbox Node Binary
//!
//! Hosts a vault ledger and serves requests until interrupted.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use strongbox_node::{NodeConfig, PayoutBook, VaultNode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Strongbox node");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let node_id = config
        .node_id
        .clone()
        .unwrap_or_else(|| format!("strongbox-{}", uuid::Uuid::new_v4()));

    info!(node_id = %node_id, "Node ID assigned");

    let payouts = Arc::new(PayoutBook::new());
    let node = Arc::new(VaultNode::new(config, node_id.clone(), payouts.clone())?);

    node.start().await?;

    // The sender side belongs to whatever transport fronts the node.
    let (requests, rx) = node.channel();
    let server = tokio::spawn(node.clone().serve(rx));

    info!(node_id = %node_id, "Node running");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    node.stop().await?;
    drop(requests);
    if let Err(e) = server.await {
        error!(error = %e, "Request loop terminated abnormally");
    }

    info!(
        snapshot = %serde_json::to_string(&node.ledger().snapshot())?,
        total_paid_out = %payouts.total_delivered(),
        "Final ledger state"
    );
    print!("{}", node.metrics().to_prometheus());

    info!("Node shutdown complete");
    Ok(())
}
