//! # Registry Events
//!
//! Domain events published after an actor commits a state change. Events are
//! observability only: no actor consumes another actor's events, all
//! protocol traffic goes through the actor bus.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, AgentId, DataHash, QueryId, Score};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    // =========================================================================
    // IDENTITY REGISTRY
    // =========================================================================
    /// A new agent id was assigned.
    AgentRegistered { agent_id: AgentId, owner: Address },

    /// An agent moved to a new controlling address.
    AgentAddressUpdated {
        agent_id: AgentId,
        old_address: Address,
        new_address: Address,
    },

    // =========================================================================
    // REPUTATION REGISTRY
    // =========================================================================
    /// Feedback accepted and sent for identity verification.
    FeedbackAccepted {
        query_id: QueryId,
        agent_client_id: AgentId,
        agent_server_id: AgentId,
        requester: Address,
    },

    /// Identity callback resolved a pending feedback entry.
    FeedbackResolved {
        query_id: QueryId,
        agent_server_id: AgentId,
        authorized: bool,
    },

    /// An orphaned pending feedback entry was collected.
    PendingFeedbackExpired { query_id: QueryId },

    // =========================================================================
    // VALIDATION REGISTRY
    // =========================================================================
    /// Validation request sent for identity confirmation.
    ValidationRequested {
        query_id: QueryId,
        data_hash: DataHash,
        agent_validator_id: AgentId,
        agent_server_id: AgentId,
    },

    /// Identity confirmed; the validation slot is open.
    ValidationCommitted {
        data_hash: DataHash,
        validator: Address,
    },

    /// Identity did not confirm the validator; nothing was stored.
    ValidationDiscarded {
        data_hash: DataHash,
        query_id: QueryId,
    },

    /// The designated validator answered.
    ValidationResponded { data_hash: DataHash, response: Score },

    /// An unresponded validation was collected after its TTL.
    ValidationExpired { data_hash: DataHash },

    /// An orphaned confirmation request was collected.
    PendingValidationExpired {
        query_id: QueryId,
        data_hash: DataHash,
    },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// The actor bus failed to deliver a message.
    MessageDropped {
        sender: Address,
        recipient: Address,
        message: String,
        reason: String,
    },
}

impl RegistryEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::AgentRegistered { .. } | Self::AgentAddressUpdated { .. } => {
                EventTopic::Identity
            }
            Self::FeedbackAccepted { .. }
            | Self::FeedbackResolved { .. }
            | Self::PendingFeedbackExpired { .. } => EventTopic::Reputation,
            Self::ValidationRequested { .. }
            | Self::ValidationCommitted { .. }
            | Self::ValidationDiscarded { .. }
            | Self::ValidationResponded { .. }
            | Self::ValidationExpired { .. }
            | Self::PendingValidationExpired { .. } => EventTopic::Validation,
            Self::MessageDropped { .. } => EventTopic::DeadLetterQueue,
        }
    }
}

/// An event tagged with the address of the actor that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedEvent {
    /// Emitting actor (or the bus itself for DLQ events).
    pub source: Address,
    /// The event.
    pub event: RegistryEvent,
}

impl PublishedEvent {
    /// Tags an event with its source.
    pub fn new(source: Address, event: RegistryEvent) -> Self {
        Self { source, event }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Identity registry events.
    Identity,
    /// Reputation registry events.
    Reputation,
    /// Validation registry events.
    Validation,
    /// Dead Letter Queue for undeliverable messages.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source actors to include. Empty means all sources.
    pub sources: Vec<Address>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            sources: Vec::new(),
        }
    }

    /// Create a filter for events from specific actors.
    #[must_use]
    pub fn from_sources(sources: Vec<Address>) -> Self {
        Self {
            topics: Vec::new(),
            sources,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, published: &PublishedEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&published.event.topic());

        let source_match = self.sources.is_empty() || self.sources.contains(&published.source);

        topic_match && source_match
    }
}
