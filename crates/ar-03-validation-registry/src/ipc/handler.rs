//! IPC handler for the validation registry.
//!
//! `RespondValidation` checks, in order: existence, expiry, prior response,
//! sender, score range.

use crate::domain::{Confirmation, ValidationBook};
use crate::ipc::security::AuthorizationRules;
use shared_bus::{Effects, Envelope, RegistryEvent};
use shared_types::{
    Address, AgentId, DataHash, Outbound, QueryId, RegistryError, RegistryMessage,
    RegistryResult, Score, Timestamp, VerifyAgentResponse,
};
use tracing::{debug, info, warn};

/// Validation registry message handler. Owns the validation book.
#[derive(Debug, Clone)]
pub struct ValidationIpcHandler {
    address: Address,
    book: ValidationBook,
}

impl ValidationIpcHandler {
    /// Handler for a registry deployed at `address`.
    #[must_use]
    pub fn new(address: Address, book: ValidationBook) -> Self {
        Self { address, book }
    }

    /// This registry's own address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Read access to the book.
    #[must_use]
    pub fn book(&self) -> &ValidationBook {
        &self.book
    }

    /// Consume the handler and keep the book.
    #[must_use]
    pub fn into_book(self) -> ValidationBook {
        self.book
    }

    /// Dispatch one authenticated message processed at `now`.
    pub fn handle(&mut self, envelope: &Envelope, now: Timestamp) -> RegistryResult<Effects> {
        let sender = envelope.sender;
        match &envelope.payload {
            RegistryMessage::RequestValidation {
                agent_validator_id,
                agent_server_id,
                data_hash,
                validator_address,
            } => self.handle_request(
                sender,
                *agent_validator_id,
                *agent_server_id,
                *data_hash,
                *validator_address,
                now,
            ),
            RegistryMessage::VerifyAgentResponse(response) => {
                self.handle_verification(sender, response, now)
            }
            RegistryMessage::RespondValidation {
                data_hash,
                response,
            } => self.handle_respond(sender, *data_hash, *response, now),
            RegistryMessage::CleanupExpiredValidation { data_hash } => {
                self.handle_cleanup_expired(sender, *data_hash, now)
            }
            RegistryMessage::CleanupPendingValidation { query_id } => {
                self.handle_cleanup_pending(sender, *query_id, now)
            }
            other => Err(RegistryError::UnsupportedMessage {
                actor: "ValidationRegistry".to_string(),
                message: other.name().to_string(),
            }),
        }
    }

    fn handle_request(
        &mut self,
        sender: Address,
        agent_validator_id: AgentId,
        agent_server_id: AgentId,
        data_hash: DataHash,
        validator_address: Address,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        let query_id = self.book.request(
            sender,
            agent_validator_id,
            agent_server_id,
            data_hash,
            validator_address,
            now,
        )?;

        debug!(
            query_id,
            data_hash = %data_hash.short(),
            agent_validator_id,
            "Validation requested, confirming validator"
        );
        Ok(Effects::event(RegistryEvent::ValidationRequested {
            query_id,
            data_hash,
            agent_validator_id,
            agent_server_id,
        })
        .send(Outbound::new(
            self.book.identity_registry(),
            RegistryMessage::VerifyAgent {
                agent_id: agent_validator_id,
                query_id,
            },
        )))
    }

    fn handle_verification(
        &mut self,
        sender: Address,
        response: &VerifyAgentResponse,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        AuthorizationRules::validate_identity_callback(sender, self.book.identity_registry())
            .inspect_err(|_| {
                warn!(
                    sender = %sender.short(),
                    query_id = response.query_id,
                    "Rejected verification callback from untrusted sender"
                );
            })?;

        let effects = match self.book.confirm(response, now) {
            None => {
                debug!(
                    query_id = response.query_id,
                    "Callback for unknown or collected query ignored"
                );
                Effects::none()
            }
            Some(Confirmation::Committed(validation)) => {
                info!(
                    data_hash = %validation.data_hash.short(),
                    validator = %validation.validator_address.short(),
                    "Validation committed"
                );
                Effects::event(RegistryEvent::ValidationCommitted {
                    data_hash: validation.data_hash,
                    validator: validation.validator_address,
                })
            }
            Some(Confirmation::Rejected(pending) | Confirmation::Superseded(pending)) => {
                info!(
                    query_id = pending.query_id,
                    data_hash = %pending.data_hash.short(),
                    verified = response.verified,
                    "Validation request discarded"
                );
                Effects::event(RegistryEvent::ValidationDiscarded {
                    data_hash: pending.data_hash,
                    query_id: pending.query_id,
                })
            }
        };
        Ok(effects)
    }

    fn handle_respond(
        &mut self,
        sender: Address,
        data_hash: DataHash,
        response: Score,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        let validator = self.book.open_validation(data_hash, now)?.validator_address;
        AuthorizationRules::validate_designated_validator(sender, validator)?;
        self.book.record_response(data_hash, response)?;

        info!(data_hash = %data_hash.short(), response, "Validation responded");
        Ok(Effects::event(RegistryEvent::ValidationResponded {
            data_hash,
            response,
        }))
    }

    fn handle_cleanup_expired(
        &mut self,
        sender: Address,
        data_hash: DataHash,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        let removed = self.book.cleanup_expired(data_hash, now)?;
        warn!(
            data_hash = %data_hash.short(),
            requested_at = removed.requested_at,
            collector = %sender.short(),
            "Expired validation collected"
        );
        Ok(Effects::event(RegistryEvent::ValidationExpired { data_hash }))
    }

    fn handle_cleanup_pending(
        &mut self,
        sender: Address,
        query_id: QueryId,
        now: Timestamp,
    ) -> RegistryResult<Effects> {
        let removed = self.book.cleanup_pending(query_id, now)?;
        warn!(
            query_id,
            data_hash = %removed.data_hash.short(),
            collector = %sender.short(),
            "Orphaned validation request collected"
        );
        Ok(Effects::event(RegistryEvent::PendingValidationExpired {
            query_id,
            data_hash: removed.data_hash,
        }))
    }
}
