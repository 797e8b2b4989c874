//! Reputation registry service: the actor task and its client handle.

use crate::domain::{FeedbackLedger, PendingFeedback};
use crate::ipc::ReputationIpcHandler;
use crate::ports::ReputationRegistryApi;
use async_trait::async_trait;
use shared_bus::{spawn_actor, Actor, BusError, Effects, Envelope, InMemoryActorBus, QueryClient};
use shared_types::{Address, AgentId, QueryId, RegistryMessage, RegistryResult, Timestamp};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Read-only queries answered from the ledger.
#[derive(Debug)]
pub enum ReputationQuery {
    FeedbackCount(oneshot::Sender<u64>),
    AuthorizedCount(oneshot::Sender<u64>),
    IdentityRegistryAddress(oneshot::Sender<Address>),
    PendingCount(oneshot::Sender<usize>),
    PendingFeedbackTtl(oneshot::Sender<u64>),
    GetPendingFeedback {
        query_id: QueryId,
        reply: oneshot::Sender<Option<PendingFeedback>>,
    },
}

impl Actor for ReputationIpcHandler {
    type Query = ReputationQuery;

    fn name(&self) -> &'static str {
        "ReputationRegistry"
    }

    fn handle(&mut self, envelope: &Envelope, now: Timestamp) -> RegistryResult<Effects> {
        ReputationIpcHandler::handle(self, envelope, now)
    }

    fn answer(&self, query: ReputationQuery, _now: Timestamp) {
        let ledger = self.ledger();
        match query {
            ReputationQuery::FeedbackCount(reply) => {
                let _ = reply.send(ledger.feedback_count());
            }
            ReputationQuery::AuthorizedCount(reply) => {
                let _ = reply.send(ledger.authorized_count());
            }
            ReputationQuery::IdentityRegistryAddress(reply) => {
                let _ = reply.send(ledger.identity_registry());
            }
            ReputationQuery::PendingCount(reply) => {
                let _ = reply.send(ledger.pending_count());
            }
            ReputationQuery::PendingFeedbackTtl(reply) => {
                let _ = reply.send(ledger.pending_ttl_secs());
            }
            ReputationQuery::GetPendingFeedback { query_id, reply } => {
                let _ = reply.send(ledger.get_pending(query_id).cloned());
            }
        }
    }
}

/// Client handle to a running reputation registry.
#[derive(Clone)]
pub struct ReputationRegistryHandle {
    address: Address,
    bus: Arc<InMemoryActorBus>,
    queries: QueryClient<ReputationQuery>,
}

impl ReputationRegistryHandle {
    /// Submit any message as `caller` and wait for its outcome.
    pub async fn submit(&self, caller: Address, message: RegistryMessage) -> RegistryResult<()> {
        self.bus.call(caller, self.address, message).await
    }
}

#[async_trait]
impl ReputationRegistryApi for ReputationRegistryHandle {
    fn address(&self) -> Address {
        self.address
    }

    async fn accept_feedback(
        &self,
        caller: Address,
        agent_client_id: AgentId,
        agent_server_id: AgentId,
    ) -> RegistryResult<()> {
        self.submit(
            caller,
            RegistryMessage::AcceptFeedback {
                agent_client_id,
                agent_server_id,
            },
        )
        .await
    }

    async fn cleanup_pending_feedback(
        &self,
        caller: Address,
        query_id: QueryId,
    ) -> RegistryResult<()> {
        self.submit(caller, RegistryMessage::CleanupPendingFeedback { query_id })
            .await
    }

    async fn feedback_count(&self) -> RegistryResult<u64> {
        self.queries.ask(ReputationQuery::FeedbackCount).await
    }

    async fn authorized_count(&self) -> RegistryResult<u64> {
        self.queries.ask(ReputationQuery::AuthorizedCount).await
    }

    async fn identity_registry_address(&self) -> RegistryResult<Address> {
        self.queries
            .ask(ReputationQuery::IdentityRegistryAddress)
            .await
    }

    async fn pending_count(&self) -> RegistryResult<usize> {
        self.queries.ask(ReputationQuery::PendingCount).await
    }

    async fn pending_feedback_ttl(&self) -> RegistryResult<u64> {
        self.queries.ask(ReputationQuery::PendingFeedbackTtl).await
    }

    async fn get_pending_feedback(
        &self,
        query_id: QueryId,
    ) -> RegistryResult<Option<PendingFeedback>> {
        self.queries
            .ask(|reply| ReputationQuery::GetPendingFeedback { query_id, reply })
            .await
    }
}

/// Start a reputation registry at `address` with the given ledger.
pub fn spawn(
    address: Address,
    ledger: FeedbackLedger,
    bus: &Arc<InMemoryActorBus>,
    shutdown: watch::Receiver<bool>,
) -> Result<(ReputationRegistryHandle, JoinHandle<ReputationIpcHandler>), BusError> {
    let handler = ReputationIpcHandler::new(address, ledger);
    let (queries, task) = spawn_actor(handler, address, bus, shutdown)?;
    let handle = ReputationRegistryHandle {
        address,
        bus: Arc::clone(bus),
        queries,
    };
    Ok((handle, task))
}
