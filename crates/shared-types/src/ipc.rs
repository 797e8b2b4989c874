//! # IPC Message Payloads
//!
//! Every message that can travel between actors, per the message surface:
//!
//! | Message | Actor | Reply |
//! |---------|-------|-------|
//! | `RegisterAgent` | Identity | none |
//! | `UpdateAgentAddress` | Identity | none |
//! | `VerifyAgent` | Identity | `VerifyAgentResponse` |
//! | `AcceptFeedback` | Reputation | triggers `VerifyAgent` |
//! | `VerifyAgentResponse` | Reputation, Validation | none |
//! | `CleanupPendingFeedback` | Reputation | none |
//! | `RequestValidation` | Validation | triggers `VerifyAgent` |
//! | `RespondValidation` | Validation | none |
//! | `CleanupExpiredValidation` | Validation | none |
//! | `CleanupPendingValidation` | Validation | none |
//!
//! ## Security
//!
//! No payload carries the caller's address; the envelope's `sender` is the
//! only identity an actor ever trusts.

use crate::entities::{Address, AgentId, DataHash, QueryId, Score};
use serde::{Deserialize, Serialize};

/// Identity oracle answer, sent by the identity registry to whichever actor
/// asked.
///
/// `agent_address` is only meaningful when `verified` is true. For unknown
/// ids the identity registry answers with its own address; callers MUST
/// branch on `verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyAgentResponse {
    /// The agent id that was queried.
    pub agent_id: AgentId,
    /// Correlation id chosen by the requesting actor.
    pub query_id: QueryId,
    /// Whether `agent_id` exists.
    pub verified: bool,
    /// Current owner of `agent_id`, or the sentinel when not verified.
    pub agent_address: Address,
}

impl VerifyAgentResponse {
    /// True when the agent exists and is currently owned by `expected`.
    #[must_use]
    pub fn confirms(&self, expected: &Address) -> bool {
        self.verified && self.agent_address == *expected
    }
}

/// All payloads that can be delivered to a registry actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryMessage {
    // =========================================================================
    // IDENTITY REGISTRY
    // =========================================================================
    /// Register the sender as a new agent.
    RegisterAgent,

    /// Move an agent to a new controlling address. Sender must be the owner.
    UpdateAgentAddress {
        agent_id: AgentId,
        new_address: Address,
    },

    /// Oracle request. Answered with `VerifyAgentResponse` to the sender.
    VerifyAgent { agent_id: AgentId, query_id: QueryId },

    // =========================================================================
    // CALLBACK (Reputation + Validation)
    // =========================================================================
    /// Oracle answer. Accepted only from the configured identity registry.
    VerifyAgentResponse(VerifyAgentResponse),

    // =========================================================================
    // REPUTATION REGISTRY
    // =========================================================================
    /// Sender claims to control `agent_server_id` and accepts feedback from
    /// `agent_client_id`.
    AcceptFeedback {
        agent_client_id: AgentId,
        agent_server_id: AgentId,
    },

    /// Collect a pending feedback entry whose callback never arrived.
    CleanupPendingFeedback { query_id: QueryId },

    // =========================================================================
    // VALIDATION REGISTRY
    // =========================================================================
    /// Open a validation slot for `data_hash`, answerable only by
    /// `validator_address`.
    RequestValidation {
        agent_validator_id: AgentId,
        agent_server_id: AgentId,
        data_hash: DataHash,
        validator_address: Address,
    },

    /// Designated validator's one-shot response.
    RespondValidation { data_hash: DataHash, response: Score },

    /// Collect an unresponded validation after its TTL.
    CleanupExpiredValidation { data_hash: DataHash },

    /// Collect a validation request whose identity callback never arrived.
    CleanupPendingValidation { query_id: QueryId },
}

impl RegistryMessage {
    /// Message name for logs and error reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterAgent => "RegisterAgent",
            Self::UpdateAgentAddress { .. } => "UpdateAgentAddress",
            Self::VerifyAgent { .. } => "VerifyAgent",
            Self::VerifyAgentResponse(_) => "VerifyAgentResponse",
            Self::AcceptFeedback { .. } => "AcceptFeedback",
            Self::CleanupPendingFeedback { .. } => "CleanupPendingFeedback",
            Self::RequestValidation { .. } => "RequestValidation",
            Self::RespondValidation { .. } => "RespondValidation",
            Self::CleanupExpiredValidation { .. } => "CleanupExpiredValidation",
            Self::CleanupPendingValidation { .. } => "CleanupPendingValidation",
        }
    }
}

/// A message an actor wants sent once its current message has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Destination actor.
    pub recipient: Address,
    /// Payload to deliver.
    pub payload: RegistryMessage,
}

impl Outbound {
    /// Creates an outbound message.
    pub fn new(recipient: Address, payload: RegistryMessage) -> Self {
        Self { recipient, payload }
    }
}
