//! Inbound port: the identity registry's public surface.

use async_trait::async_trait;
use shared_types::{Address, AgentId, RegistryResult};

/// Messages and queries accepted by the identity registry.
///
/// Message methods take the authenticated caller explicitly; they resolve
/// once the registry has processed the message.
#[async_trait]
pub trait IdentityRegistryApi: Send + Sync {
    /// Address the registry is deployed at.
    fn address(&self) -> Address;

    /// `RegisterAgent` from `caller`.
    async fn register_agent(&self, caller: Address) -> RegistryResult<()>;

    /// `UpdateAgentAddress` from `caller`.
    async fn update_agent_address(
        &self,
        caller: Address,
        agent_id: AgentId,
        new_address: Address,
    ) -> RegistryResult<()>;

    /// Number of registered agents.
    async fn agent_count(&self) -> RegistryResult<u64>;

    /// Owner address of `agent_id`.
    async fn get_agent(&self, agent_id: AgentId) -> RegistryResult<Option<Address>>;

    /// Same as `get_agent`.
    async fn get_agent_owner(&self, agent_id: AgentId) -> RegistryResult<Option<Address>> {
        self.get_agent(agent_id).await
    }

    /// Agent controlled by `address`.
    async fn get_agent_by_address(&self, address: Address) -> RegistryResult<Option<AgentId>>;

    /// True if `address` controls an agent.
    async fn is_registered(&self, address: Address) -> RegistryResult<bool>;
}
