//! Validation registry service: the actor task and its client handle.

use crate::domain::{PendingValidation, Validation, ValidationBook};
use crate::ipc::ValidationIpcHandler;
use crate::ports::ValidationRegistryApi;
use async_trait::async_trait;
use shared_bus::{spawn_actor, Actor, BusError, Effects, Envelope, InMemoryActorBus, QueryClient};
use shared_types::{
    Address, AgentId, DataHash, QueryId, RegistryMessage, RegistryResult, Score, Timestamp,
};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Read-only queries answered from the validation book.
#[derive(Debug)]
pub enum ValidationQuery {
    TtlValue(oneshot::Sender<u64>),
    IdentityRegistryAddress(oneshot::Sender<Address>),
    GetValidation {
        data_hash: DataHash,
        reply: oneshot::Sender<Option<Validation>>,
    },
    GetPendingValidation {
        query_id: QueryId,
        reply: oneshot::Sender<Option<PendingValidation>>,
    },
    ValidationCount(oneshot::Sender<usize>),
    PendingCount(oneshot::Sender<usize>),
    /// Evaluated against the clock at the time the query is answered.
    IsExpired {
        data_hash: DataHash,
        reply: oneshot::Sender<Option<bool>>,
    },
}

impl Actor for ValidationIpcHandler {
    type Query = ValidationQuery;

    fn name(&self) -> &'static str {
        "ValidationRegistry"
    }

    fn handle(&mut self, envelope: &Envelope, now: Timestamp) -> RegistryResult<Effects> {
        ValidationIpcHandler::handle(self, envelope, now)
    }

    fn answer(&self, query: ValidationQuery, now: Timestamp) {
        let book = self.book();
        match query {
            ValidationQuery::TtlValue(reply) => {
                let _ = reply.send(book.ttl_secs());
            }
            ValidationQuery::IdentityRegistryAddress(reply) => {
                let _ = reply.send(book.identity_registry());
            }
            ValidationQuery::GetValidation { data_hash, reply } => {
                let _ = reply.send(book.get_validation(data_hash).cloned());
            }
            ValidationQuery::GetPendingValidation { query_id, reply } => {
                let _ = reply.send(book.get_pending(query_id).cloned());
            }
            ValidationQuery::ValidationCount(reply) => {
                let _ = reply.send(book.validation_count());
            }
            ValidationQuery::PendingCount(reply) => {
                let _ = reply.send(book.pending_count());
            }
            ValidationQuery::IsExpired { data_hash, reply } => {
                let _ = reply.send(book.is_expired(data_hash, now));
            }
        }
    }
}

/// Client handle to a running validation registry.
#[derive(Clone)]
pub struct ValidationRegistryHandle {
    address: Address,
    bus: Arc<InMemoryActorBus>,
    queries: QueryClient<ValidationQuery>,
}

impl ValidationRegistryHandle {
    /// Submit any message as `caller` and wait for its outcome.
    pub async fn submit(&self, caller: Address, message: RegistryMessage) -> RegistryResult<()> {
        self.bus.call(caller, self.address, message).await
    }
}

#[async_trait]
impl ValidationRegistryApi for ValidationRegistryHandle {
    fn address(&self) -> Address {
        self.address
    }

    async fn request_validation(
        &self,
        caller: Address,
        agent_validator_id: AgentId,
        agent_server_id: AgentId,
        data_hash: DataHash,
        validator_address: Address,
    ) -> RegistryResult<()> {
        self.submit(
            caller,
            RegistryMessage::RequestValidation {
                agent_validator_id,
                agent_server_id,
                data_hash,
                validator_address,
            },
        )
        .await
    }

    async fn respond_validation(
        &self,
        caller: Address,
        data_hash: DataHash,
        response: Score,
    ) -> RegistryResult<()> {
        self.submit(
            caller,
            RegistryMessage::RespondValidation {
                data_hash,
                response,
            },
        )
        .await
    }

    async fn cleanup_expired_validation(
        &self,
        caller: Address,
        data_hash: DataHash,
    ) -> RegistryResult<()> {
        self.submit(caller, RegistryMessage::CleanupExpiredValidation { data_hash })
            .await
    }

    async fn cleanup_pending_validation(
        &self,
        caller: Address,
        query_id: QueryId,
    ) -> RegistryResult<()> {
        self.submit(caller, RegistryMessage::CleanupPendingValidation { query_id })
            .await
    }

    async fn ttl_value(&self) -> RegistryResult<u64> {
        self.queries.ask(ValidationQuery::TtlValue).await
    }

    async fn identity_registry_address(&self) -> RegistryResult<Address> {
        self.queries
            .ask(ValidationQuery::IdentityRegistryAddress)
            .await
    }

    async fn get_validation(&self, data_hash: DataHash) -> RegistryResult<Option<Validation>> {
        self.queries
            .ask(|reply| ValidationQuery::GetValidation { data_hash, reply })
            .await
    }

    async fn get_pending_validation(
        &self,
        query_id: QueryId,
    ) -> RegistryResult<Option<PendingValidation>> {
        self.queries
            .ask(|reply| ValidationQuery::GetPendingValidation { query_id, reply })
            .await
    }

    async fn validation_count(&self) -> RegistryResult<usize> {
        self.queries.ask(ValidationQuery::ValidationCount).await
    }

    async fn pending_count(&self) -> RegistryResult<usize> {
        self.queries.ask(ValidationQuery::PendingCount).await
    }

    async fn is_expired(&self, data_hash: DataHash) -> RegistryResult<Option<bool>> {
        self.queries
            .ask(|reply| ValidationQuery::IsExpired { data_hash, reply })
            .await
    }
}

/// Start a validation registry at `address` with the given book.
pub fn spawn(
    address: Address,
    book: ValidationBook,
    bus: &Arc<InMemoryActorBus>,
    shutdown: watch::Receiver<bool>,
) -> Result<(ValidationRegistryHandle, JoinHandle<ValidationIpcHandler>), BusError> {
    let handler = ValidationIpcHandler::new(address, book);
    let (queries, task) = spawn_actor(handler, address, bus, shutdown)?;
    let handle = ValidationRegistryHandle {
        address,
        bus: Arc::clone(bus),
        queries,
    };
    Ok((handle, task))
}
