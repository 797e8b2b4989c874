//! # Error Types
//!
//! Logical failure kinds shared by all registry actors. A message that fails
//! with one of these leaves the actor's state exactly as it was.

use crate::entities::{Address, AgentId, DataHash, QueryId, Score, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A keyed record an operation looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    /// An agent in the identity registry.
    Agent(AgentId),
    /// A feedback request awaiting its identity callback.
    PendingFeedback(QueryId),
    /// A committed validation record.
    Validation(DataHash),
    /// A validation request awaiting its identity callback.
    PendingValidation(QueryId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "agent {id}"),
            Self::PendingFeedback(q) => write!(f, "pending feedback {q}"),
            Self::Validation(h) => write!(f, "validation {}", h.short()),
            Self::PendingValidation(q) => write!(f, "pending validation {q}"),
        }
    }
}

/// Errors returned by registry message handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RegistryError {
    /// The address already controls an agent.
    #[error("Duplicate identity: {address} already controls agent {agent_id}")]
    DuplicateIdentity { address: Address, agent_id: AgentId },

    /// The referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(Resource),

    /// The authenticated sender is not allowed to perform this operation.
    #[error("Unauthorized: sender {sender} is not {expected}")]
    Unauthorized { sender: Address, expected: Address },

    /// A field failed validation.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A validation for this data hash already exists or is being confirmed.
    #[error("Duplicate request for data hash {}", .data_hash.short())]
    DuplicateRequest { data_hash: DataHash },

    /// The validation window has closed.
    #[error("Validation {} expired at {deadline}", .data_hash.short())]
    Expired {
        data_hash: DataHash,
        deadline: Timestamp,
    },

    /// The record may not be collected yet.
    #[error("{resource} is not expired (collectible after {collectible_after})")]
    NotExpired {
        resource: Resource,
        collectible_after: Timestamp,
    },

    /// The validation already holds a response.
    #[error("Validation {} already responded", .data_hash.short())]
    AlreadyResponded { data_hash: DataHash },

    /// Score outside `0..=max`.
    #[error("Invalid score {score}, maximum is {max}")]
    InvalidScore { score: Score, max: Score },

    /// The payload is not part of the recipient actor's message surface.
    #[error("{actor} does not accept {message}")]
    UnsupportedMessage { actor: String, message: String },

    /// The actor's mailbox is closed or it dropped the reply.
    #[error("Actor unavailable: {actor}")]
    ActorUnavailable { actor: String },
}

impl RegistryError {
    /// Shorthand for `InvalidInput`.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Result alias used across the workspace.
pub type RegistryResult<T> = Result<T, RegistryError>;
