//! # Registry Container
//!
//! Builds the shared infrastructure and starts the three registry actors.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: Event bus, actor bus
//! Level 1: Identity Registry (no dependencies)
//! Level 2: Reputation Registry, Validation Registry (bound to Identity's address)
//! ```
//!
//! Actors never hold references to each other; the dependency is the
//! identity registry's address, fixed in the dependents' state at creation.

use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use ar_01_identity_registry::{AgentTable, IdentityIpcHandler, IdentityRegistryHandle};
use ar_02_reputation_registry::{FeedbackLedger, ReputationIpcHandler, ReputationRegistryHandle};
use ar_03_validation_registry::{ValidationBook, ValidationIpcHandler, ValidationRegistryHandle};
use shared_bus::{BusError, InMemoryActorBus, InMemoryEventBus};
use shared_types::TimeSource;

use crate::adapters::Snapshot;
use crate::container::config::NodeConfig;

struct ActorTasks {
    identity: JoinHandle<IdentityIpcHandler>,
    reputation: JoinHandle<ReputationIpcHandler>,
    validation: JoinHandle<ValidationIpcHandler>,
}

/// Running registries plus the infrastructure they share.
pub struct RegistryContainer {
    /// Node configuration (immutable after start).
    pub config: NodeConfig,
    /// Actor transport.
    pub bus: Arc<InMemoryActorBus>,
    /// Domain event broadcast.
    pub events: Arc<InMemoryEventBus>,
    pub identity: IdentityRegistryHandle,
    pub reputation: ReputationRegistryHandle,
    pub validation: ValidationRegistryHandle,
    tasks: ActorTasks,
    shutdown_tx: watch::Sender<bool>,
}

impl RegistryContainer {
    /// Start all registries, resuming from `snapshot` where present.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(name = "registry_init", skip_all)]
    pub fn start(
        config: NodeConfig,
        clock: Arc<dyn TimeSource>,
        snapshot: Snapshot,
    ) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        info!("Phase 1: Creating shared infrastructure");
        let events = Arc::new(InMemoryEventBus::with_capacity(config.bus.event_capacity));
        let bus = Arc::new(InMemoryActorBus::with_capacity(
            Arc::clone(&events),
            clock,
            config.bus.mailbox_capacity,
        ));

        Self::start_on(config, bus, events, snapshot)
    }

    /// Restore state and start the actors on existing infrastructure.
    ///
    /// If any actor fails to start, the ones already running are stopped
    /// before the error is returned.
    fn start_on(
        config: NodeConfig,
        bus: Arc<InMemoryActorBus>,
        events: Arc<InMemoryEventBus>,
        snapshot: Snapshot,
    ) -> Result<Self> {
        info!("Phase 2: Restoring registry state");
        let table = restore_identity(snapshot.identity)?;
        let ledger = restore_reputation(&config, snapshot.reputation)?;
        let book = restore_validation(&config, snapshot.validation)?;

        info!("Phase 3: Starting actors");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let addresses = &config.addresses;
        let (identity, identity_task) = ar_01_identity_registry::spawn(
            addresses.identity,
            table,
            &bus,
            shutdown_rx.clone(),
        )
        .context("Failed to start identity registry")?;
        info!(address = %addresses.identity, "  [1] Identity Registry started");

        let (reputation, reputation_task) = stop_on_failure(
            ar_02_reputation_registry::spawn(
                addresses.reputation,
                ledger,
                &bus,
                shutdown_rx.clone(),
            ),
            &shutdown_tx,
        )
        .context("Failed to start reputation registry")?;
        info!(address = %addresses.reputation, "  [2] Reputation Registry started");

        let (validation, validation_task) = stop_on_failure(
            ar_03_validation_registry::spawn(addresses.validation, book, &bus, shutdown_rx),
            &shutdown_tx,
        )
        .context("Failed to start validation registry")?;
        info!(address = %addresses.validation, "  [3] Validation Registry started");

        Ok(Self {
            config,
            bus,
            events,
            identity,
            reputation,
            validation,
            tasks: ActorTasks {
                identity: identity_task,
                reputation: reputation_task,
                validation: validation_task,
            },
            shutdown_tx,
        })
    }

    /// A receiver that flips to true when shutdown begins.
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stop every actor and collect its final state.
    pub async fn shutdown(self) -> Result<Snapshot> {
        info!("Signalling registries to stop");
        // Every actor holds a receiver, so the send cannot fail while tasks run.
        let _ = self.shutdown_tx.send(true);

        let identity = self
            .tasks
            .identity
            .await
            .context("Identity registry task failed")?;
        let reputation = self
            .tasks
            .reputation
            .await
            .context("Reputation registry task failed")?;
        let validation = self
            .tasks
            .validation
            .await
            .context("Validation registry task failed")?;

        info!(
            delivered = self.bus.delivered_count(),
            dropped = self.bus.dropped_count(),
            events = self.events.events_published(),
            "Registries stopped"
        );
        Ok(Snapshot {
            identity: Some(identity.into_table()),
            reputation: Some(reputation.into_ledger()),
            validation: Some(validation.into_book()),
        })
    }
}

/// Signal every running actor to stop if a later one failed to start.
fn stop_on_failure<T>(
    spawned: Result<T, BusError>,
    shutdown_tx: &watch::Sender<bool>,
) -> Result<T, BusError> {
    spawned.inspect_err(|err| {
        warn!(error = %err, "Registry failed to start, stopping the others");
        let _ = shutdown_tx.send(true);
    })
}

fn restore_identity(saved: Option<AgentTable>) -> Result<AgentTable> {
    let Some(table) = saved else {
        return Ok(AgentTable::new());
    };
    table
        .check_consistency()
        .context("Identity snapshot is inconsistent")?;
    info!(agents = table.agent_count(), "Identity registry restored");
    Ok(table)
}

fn restore_reputation(config: &NodeConfig, saved: Option<FeedbackLedger>) -> Result<FeedbackLedger> {
    let identity = config.addresses.identity;
    let ttl = config.reputation.pending_ttl_secs;
    let Some(ledger) = saved else {
        return FeedbackLedger::new(identity, ttl).context("Failed to create feedback ledger");
    };

    ensure!(
        ledger.identity_registry() == identity,
        "Reputation snapshot is bound to identity registry {}, configured {}",
        ledger.identity_registry(),
        identity
    );
    ensure!(
        ledger.pending_ttl_secs() == ttl,
        "Reputation snapshot has pending TTL {}s, configured {}s",
        ledger.pending_ttl_secs(),
        ttl
    );
    ledger
        .check_consistency()
        .context("Reputation snapshot is inconsistent")?;
    info!(
        feedback = ledger.feedback_count(),
        authorized = ledger.authorized_count(),
        pending = ledger.pending_count(),
        "Reputation registry restored"
    );
    Ok(ledger)
}

fn restore_validation(config: &NodeConfig, saved: Option<ValidationBook>) -> Result<ValidationBook> {
    let identity = config.addresses.identity;
    let ttl = config.validation.ttl_secs;
    let Some(book) = saved else {
        return ValidationBook::new(identity, ttl).context("Failed to create validation book");
    };

    ensure!(
        book.identity_registry() == identity,
        "Validation snapshot is bound to identity registry {}, configured {}",
        book.identity_registry(),
        identity
    );
    ensure!(
        book.ttl_secs() == ttl,
        "Validation snapshot has TTL {}s, configured {}s",
        book.ttl_secs(),
        ttl
    );
    book.check_consistency()
        .context("Validation snapshot is inconsistent")?;
    info!(
        validations = book.validation_count(),
        pending = book.pending_count(),
        "Validation registry restored"
    );
    Ok(book)
}
