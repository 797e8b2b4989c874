//! IPC handler for the reputation registry.
//!
//! ## Round Trip
//!
//! ```text
//! caller ──AcceptFeedback──→ Reputation ──VerifyAgent(server, q)──→ Identity
//!                                 ↑                                    │
//!                                 └──VerifyAgentResponse(q, …)─────────┘
//! ```
//!
//! After the sender check the callback path cannot fail, so the pending
//! entry for `q` is always released.

use crate::domain::FeedbackLedger;
use crate::ipc::security::AuthorizationRules;
use shared_bus::{Effects, Envelope, RegistryEvent};
use shared_types::{
    Address, AgentId, Outbound, QueryId, RegistryError, RegistryMessage, RegistryResult,
    Timestamp, VerifyAgentResponse,
};
use tracing::{debug, info, warn};

/// Reputation registry message handler. Owns the ledger.
#[derive(Debug, Clone)]
pub struct ReputationIpcHandler {
    address: Address,
    ledger: FeedbackLedger,
}

impl ReputationIpcHandler {
    /// Handler for a registry deployed at `address`.
    #[must_use]
    pub fn new(address: Address, ledger: FeedbackLedger) -> Self {
        Self { address, ledger }
    }

    /// This registry's own address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Read access to the ledger.
    #[must_use]
    pub fn ledger(&self) -> &FeedbackLedger {
        &self.ledger
    }

    /// Consume the handler and keep the ledger.
    #[must_use]
    pub fn into_ledger(self) -> FeedbackLedger {
        self.ledger
    }

    /// Dispatch one authenticated message processed at `now`.
    pub fn handle(&mut self, envelope: &Envelope, now: Timestamp) -> RegistryResult<Effects> {
        let sender = envelope.sender;
        match &envelope.payload {
            RegistryMessage::AcceptFeedback {
                agent_client_id,
                agent_server_id,
            } => self.handle_accept(sender, *agent_client_id, *agent_server_id, now),
            RegistryMessage::VerifyAgentResponse(response) => {
                self.handle_verification(sender, response)
            }
            RegistryMessage::CleanupPendingFeedback { query_id } => {
                self.handle_cleanup(sender, *query_id, now)
            }
            other => Err(RegistryError::UnsupportedMessage {
                actor: "ReputationRegistry".to_string(),
                message: other.name().to_string(),
            }),
        }
    }

    fn handle_accept(
        &mut self,
        sender: Address,
        agent_client_id: AgentId,
        agent_server_id: AgentId,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        let query_id = self
            .ledger
            .accept(sender, agent_client_id, agent_server_id, now)?;

        debug!(
            query_id,
            agent_client_id,
            agent_server_id,
            requester = %sender.short(),
            "Feedback accepted, verifying server agent"
        );
        Ok(Effects::event(RegistryEvent::FeedbackAccepted {
            query_id,
            agent_client_id,
            agent_server_id,
            requester: sender,
        })
        .send(Outbound::new(
            self.ledger.identity_registry(),
            RegistryMessage::VerifyAgent {
                agent_id: agent_server_id,
                query_id,
            },
        )))
    }

    fn handle_verification(
        &mut self,
        sender: Address,
        response: &VerifyAgentResponse,
    ) -> RegistryResult<Effects> {
        AuthorizationRules::validate_identity_callback(sender, self.ledger.identity_registry())
            .inspect_err(|_| {
                warn!(
                    sender = %sender.short(),
                    query_id = response.query_id,
                    "Rejected verification callback from untrusted sender"
                );
            })?;

        let Some(resolution) = self.ledger.resolve(response) else {
            debug!(
                query_id = response.query_id,
                "Callback for unknown or collected query ignored"
            );
            return Ok(Effects::none());
        };

        let pending = resolution.pending;
        if resolution.authorized {
            info!(
                query_id = pending.query_id,
                agent_server_id = pending.agent_server_id,
                "Feedback authorized"
            );
        } else {
            info!(
                query_id = pending.query_id,
                agent_server_id = pending.agent_server_id,
                verified = response.verified,
                "Feedback not authorized"
            );
        }
        Ok(Effects::event(RegistryEvent::FeedbackResolved {
            query_id: pending.query_id,
            agent_server_id: pending.agent_server_id,
            authorized: resolution.authorized,
        }))
    }

    fn handle_cleanup(
        &mut self,
        sender: Address,
        query_id: QueryId,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        let removed = self.ledger.cleanup(query_id, now)?;
        warn!(
            query_id,
            age_secs = now.saturating_sub(removed.created_at),
            collector = %sender.short(),
            "Orphaned feedback request collected"
        );
        Ok(Effects::event(RegistryEvent::PendingFeedbackExpired { query_id }))
    }
}
