//! IPC handler for the identity registry.
//!
//! Authorization and validation run before any mutation, so a rejected
//! message leaves the table untouched.

use crate::domain::AgentTable;
use crate::ipc::security::AuthorizationRules;
use shared_bus::{Effects, Envelope, RegistryEvent};
use shared_types::{
    Address, AgentId, Outbound, QueryId, RegistryError, RegistryMessage, RegistryResult,
};
use tracing::{debug, info};

/// Identity registry message handler. Owns the agent table.
#[derive(Debug, Clone)]
pub struct IdentityIpcHandler {
    address: Address,
    table: AgentTable,
}

impl IdentityIpcHandler {
    /// Handler for a registry deployed at `address`.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self::with_table(address, AgentTable::new())
    }

    /// Handler resuming from a restored table.
    #[must_use]
    pub fn with_table(address: Address, table: AgentTable) -> Self {
        Self { address, table }
    }

    /// This registry's own address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Read access to the table.
    #[must_use]
    pub fn table(&self) -> &AgentTable {
        &self.table
    }

    /// Consume the handler and keep the table.
    #[must_use]
    pub fn into_table(self) -> AgentTable {
        self.table
    }

    /// Dispatch one authenticated message.
    pub fn handle(&mut self, envelope: &Envelope) -> RegistryResult<Effects> {
        let sender = envelope.sender;
        match &envelope.payload {
            RegistryMessage::RegisterAgent => self.handle_register(sender),
            RegistryMessage::UpdateAgentAddress {
                agent_id,
                new_address,
            } => self.handle_update_address(sender, *agent_id, *new_address),
            RegistryMessage::VerifyAgent { agent_id, query_id } => {
                Ok(self.handle_verify(sender, *agent_id, *query_id))
            }
            other => Err(RegistryError::UnsupportedMessage {
                actor: "IdentityRegistry".to_string(),
                message: other.name().to_string(),
            }),
        }
    }

    fn handle_register(&mut self, sender: Address) -> RegistryResult<Effects> {
        let agent_id = self.table.register(sender)?;
        info!(agent_id, owner = %sender.short(), "Agent registered");
        Ok(Effects::event(RegistryEvent::AgentRegistered {
            agent_id,
            owner: sender,
        }))
    }

    fn handle_update_address(
        &mut self,
        sender: Address,
        agent_id: AgentId,
        new_address: Address,
    ) -> RegistryResult<Effects> {
        let owner = self.table.owner_of(agent_id)?;
        AuthorizationRules::validate_update_address(sender, owner)?;

        let old_address = self.table.update_address(agent_id, new_address)?;
        info!(
            agent_id,
            old = %old_address.short(),
            new = %new_address.short(),
            "Agent address updated"
        );
        Ok(Effects::event(RegistryEvent::AgentAddressUpdated {
            agent_id,
            old_address,
            new_address,
        }))
    }

    /// Never fails: unknown ids are answered with `verified = false` and
    /// this registry's own address.
    fn handle_verify(&self, sender: Address, agent_id: AgentId, query_id: QueryId) -> Effects {
        let response = self.table.verify(agent_id, query_id, self.address);
        debug!(
            agent_id,
            query_id,
            verified = response.verified,
            requester = %sender.short(),
            "Verification answered"
        );
        Effects::none().send(Outbound::new(
            sender,
            RegistryMessage::VerifyAgentResponse(response),
        ))
    }
}
