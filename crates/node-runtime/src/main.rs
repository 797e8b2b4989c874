//! # Agent Registry Node
//!
//! Runs the identity, reputation and validation registries in one process.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from the environment (`AR_*` variables)
//! 3. Start the registries, restoring snapshots from `AR_DATA_DIR`
//! 4. Run until Ctrl+C, then shut down and persist

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::{NodeConfig, NodeRuntime};
use shared_types::SystemTimeSource;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    info!(
        mailbox_capacity = config.bus.mailbox_capacity,
        pending_feedback_ttl_secs = config.reputation.pending_ttl_secs,
        validation_ttl_secs = config.validation.ttl_secs,
        "Configuration loaded"
    );

    let runtime = NodeRuntime::start(config, Arc::new(SystemTimeSource)).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await?;
    Ok(())
}
