//! Inbound port: the validation registry's public surface.

use crate::domain::{PendingValidation, Validation};
use async_trait::async_trait;
use shared_types::{Address, AgentId, DataHash, QueryId, RegistryResult, Score};

/// Messages and queries accepted by the validation registry.
#[async_trait]
pub trait ValidationRegistryApi: Send + Sync {
    /// Address the registry is deployed at.
    fn address(&self) -> Address;

    /// `RequestValidation` from `caller`.
    ///
    /// Resolves once the request is recorded. Whether a slot is opened is
    /// decided by the identity callback.
    async fn request_validation(
        &self,
        caller: Address,
        agent_validator_id: AgentId,
        agent_server_id: AgentId,
        data_hash: DataHash,
        validator_address: Address,
    ) -> RegistryResult<()>;

    /// `RespondValidation` from `caller`.
    async fn respond_validation(
        &self,
        caller: Address,
        data_hash: DataHash,
        response: Score,
    ) -> RegistryResult<()>;

    /// `CleanupExpiredValidation` from `caller`.
    async fn cleanup_expired_validation(
        &self,
        caller: Address,
        data_hash: DataHash,
    ) -> RegistryResult<()>;

    /// `CleanupPendingValidation` from `caller`.
    async fn cleanup_pending_validation(
        &self,
        caller: Address,
        query_id: QueryId,
    ) -> RegistryResult<()>;

    /// Validation window in seconds.
    async fn ttl_value(&self) -> RegistryResult<u64>;

    /// The identity registry this actor trusts.
    async fn identity_registry_address(&self) -> RegistryResult<Address>;

    /// A committed validation.
    async fn get_validation(&self, data_hash: DataHash) -> RegistryResult<Option<Validation>>;

    /// A request awaiting confirmation.
    async fn get_pending_validation(
        &self,
        query_id: QueryId,
    ) -> RegistryResult<Option<PendingValidation>>;

    /// Committed validations currently stored.
    async fn validation_count(&self) -> RegistryResult<usize>;

    /// Requests awaiting confirmation.
    async fn pending_count(&self) -> RegistryResult<usize>;

    /// Whether a committed validation is past its window, `None` if absent.
    async fn is_expired(&self, data_hash: DataHash) -> RegistryResult<Option<bool>>;
}
