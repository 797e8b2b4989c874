//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Load snapshots (if a data directory is configured)
//! 3. Start the registries in dependency order
//! 4. Start the event logger
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to every actor
//! 2. Collect each actor's final state
//! 3. Persist snapshots (if a data directory is configured)

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use shared_bus::{EventFilter, EventStream, EventTopic, RegistryEvent};
use shared_types::TimeSource;
use tokio_stream::StreamExt;

use crate::adapters::{Snapshot, SnapshotStore};
use crate::container::{NodeConfig, RegistryContainer};

/// The running node.
pub struct NodeRuntime {
    container: RegistryContainer,
    store: Option<SnapshotStore>,
    event_logger: JoinHandle<()>,
}

impl NodeRuntime {
    /// Start the node with `config`, reading time from `clock`.
    pub async fn start(config: NodeConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        info!("===========================================");
        info!("  Agent Registry Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let store = config.storage.data_dir.clone().map(SnapshotStore::new);
        let snapshot = match &store {
            Some(store) => store.load().context("Failed to load snapshots")?,
            None => Snapshot::default(),
        };

        let container = RegistryContainer::start(config, clock, snapshot)?;
        let event_logger = tokio::spawn(log_events(
            container.events.event_stream(EventFilter::all()),
            container.shutdown_signal(),
        ));

        match &store {
            Some(store) => info!(dir = %store.dir().display(), "Persistence enabled"),
            None => info!("Persistence disabled (AR_DATA_DIR not set)"),
        }
        info!("All registries running");

        Ok(Self {
            container,
            store,
            event_logger,
        })
    }

    /// The running registries.
    #[must_use]
    pub fn container(&self) -> &RegistryContainer {
        &self.container
    }

    /// Stop the node and persist the final state.
    pub async fn shutdown(self) -> Result<Snapshot> {
        info!("Initiating graceful shutdown...");
        let snapshot = self.container.shutdown().await?;

        if let Some(store) = &self.store {
            store.save(&snapshot).context("Failed to persist snapshots")?;
        }
        if self.event_logger.await.is_err() {
            warn!("Event logger ended abnormally");
        }

        info!("Shutdown complete");
        Ok(snapshot)
    }
}

/// Log every domain event until shutdown.
async fn log_events(mut events: EventStream, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = events.next() => {
                let Some(published) = event else { break };
                match published.event.topic() {
                    EventTopic::DeadLetterQueue => warn!(
                        source = %published.source.short(),
                        event = ?published.event,
                        "[dlq] Undeliverable message"
                    ),
                    topic => info!(
                        topic = ?topic,
                        source = %published.source.short(),
                        event = %describe(&published.event),
                        "Event"
                    ),
                }
            }
        }
    }
}

fn describe(event: &RegistryEvent) -> String {
    match event {
        RegistryEvent::AgentRegistered { agent_id, owner } => {
            format!("agent {agent_id} registered to {}", owner.short())
        }
        RegistryEvent::AgentAddressUpdated {
            agent_id,
            new_address,
            ..
        } => format!("agent {agent_id} moved to {}", new_address.short()),
        RegistryEvent::FeedbackResolved {
            query_id,
            authorized,
            ..
        } => format!("feedback {query_id} authorized={authorized}"),
        RegistryEvent::ValidationResponded {
            data_hash,
            response,
        } => format!("validation {} scored {response}", data_hash.short()),
        other => format!("{other:?}"),
    }
}
