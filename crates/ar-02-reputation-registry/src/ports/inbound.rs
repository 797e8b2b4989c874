//! Inbound port: the reputation registry's public surface.

use crate::domain::PendingFeedback;
use async_trait::async_trait;
use shared_types::{Address, AgentId, QueryId, RegistryResult};

/// Messages and queries accepted by the reputation registry.
#[async_trait]
pub trait ReputationRegistryApi: Send + Sync {
    /// Address the registry is deployed at.
    fn address(&self) -> Address;

    /// `AcceptFeedback` from `caller`, who claims to control
    /// `agent_server_id`.
    ///
    /// Resolves once the request is recorded; authorization is decided later
    /// by the identity callback.
    async fn accept_feedback(
        &self,
        caller: Address,
        agent_client_id: AgentId,
        agent_server_id: AgentId,
    ) -> RegistryResult<()>;

    /// `CleanupPendingFeedback` from `caller`.
    async fn cleanup_pending_feedback(&self, caller: Address, query_id: QueryId)
        -> RegistryResult<()>;

    /// Total accepted feedback requests.
    async fn feedback_count(&self) -> RegistryResult<u64>;

    /// Feedback requests confirmed by the identity registry.
    async fn authorized_count(&self) -> RegistryResult<u64>;

    /// The identity registry this actor trusts.
    async fn identity_registry_address(&self) -> RegistryResult<Address>;

    /// Requests awaiting their callback.
    async fn pending_count(&self) -> RegistryResult<usize>;

    /// Cleanup TTL in seconds.
    async fn pending_feedback_ttl(&self) -> RegistryResult<u64>;

    /// One pending request.
    async fn get_pending_feedback(&self, query_id: QueryId)
        -> RegistryResult<Option<PendingFeedback>>;
}
