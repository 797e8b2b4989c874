//! Feedback ledger: counters plus the pending correlation table.
//!
//! Lifecycle of one `query_id`:
//!
//! ```text
//! absent ──accept──→ pending ──resolve──→ absent (authorized or not)
//!                       │
//!                       └──cleanup (after TTL)──→ absent
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, AgentId, QueryId, RegistryError, RegistryResult, Resource, Timestamp,
    VerifyAgentResponse,
};
use std::collections::BTreeMap;

/// A feedback request waiting for its identity callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFeedback {
    /// Correlation id sent to the identity registry.
    pub query_id: QueryId,
    /// Authenticated sender of `AcceptFeedback`.
    pub requester: Address,
    /// Client agent giving feedback.
    pub agent_client_id: AgentId,
    /// Server agent the requester claims to control.
    pub agent_server_id: AgentId,
    /// When the request was accepted.
    pub created_at: Timestamp,
}

/// Outcome of a matched identity callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The entry that was removed.
    pub pending: PendingFeedback,
    /// Whether the requester controls the server agent.
    pub authorized: bool,
}

/// Reputation registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLedger {
    identity_registry: Address,
    pending_ttl_secs: u64,
    feedback_count: u64,
    authorized_count: u64,
    next_query_id: QueryId,
    pending: BTreeMap<QueryId, PendingFeedback>,
}

impl FeedbackLedger {
    /// Empty ledger bound to `identity_registry`.
    pub fn new(identity_registry: Address, pending_ttl_secs: u64) -> RegistryResult<Self> {
        if pending_ttl_secs == 0 {
            return Err(RegistryError::invalid_input(
                "pending feedback TTL must be positive",
            ));
        }
        Ok(Self {
            identity_registry,
            pending_ttl_secs,
            feedback_count: 0,
            authorized_count: 0,
            next_query_id: 0,
            pending: BTreeMap::new(),
        })
    }

    /// Record a feedback request and return the query id to verify with.
    pub fn accept(
        &mut self,
        requester: Address,
        agent_client_id: AgentId,
        agent_server_id: AgentId,
        now: Timestamp,
    ) -> RegistryResult<QueryId> {
        let query_id = self.next_query_id;
        let next = query_id
            .checked_add(1)
            .ok_or_else(|| RegistryError::invalid_input("query id space exhausted"))?;
        let feedback_count = self
            .feedback_count
            .checked_add(1)
            .ok_or_else(|| RegistryError::invalid_input("feedback counter exhausted"))?;

        self.pending.insert(
            query_id,
            PendingFeedback {
                query_id,
                requester,
                agent_client_id,
                agent_server_id,
                created_at: now,
            },
        );
        self.next_query_id = next;
        self.feedback_count = feedback_count;
        Ok(query_id)
    }

    /// Apply an identity callback. Never fails.
    ///
    /// The pending entry is removed before anything else is decided, so it
    /// cannot survive the callback whatever the verdict. Unknown query ids
    /// return `None`.
    pub fn resolve(&mut self, response: &VerifyAgentResponse) -> Option<Resolution> {
        let pending = self.pending.remove(&response.query_id)?;

        let authorized = response.confirms(&pending.requester);
        if authorized {
            self.authorized_count = self.authorized_count.saturating_add(1);
        }
        Some(Resolution {
            pending,
            authorized,
        })
    }

    /// Remove an orphaned entry once it is at least `pending_ttl_secs` old.
    pub fn cleanup(&mut self, query_id: QueryId, now: Timestamp) -> RegistryResult<PendingFeedback> {
        let entry = self
            .pending
            .get(&query_id)
            .ok_or(RegistryError::NotFound(Resource::PendingFeedback(query_id)))?;

        let collectible_after = entry.created_at.saturating_add(self.pending_ttl_secs);
        if now < collectible_after {
            return Err(RegistryError::NotExpired {
                resource: Resource::PendingFeedback(query_id),
                collectible_after,
            });
        }
        self.pending
            .remove(&query_id)
            .ok_or(RegistryError::NotFound(Resource::PendingFeedback(query_id)))
    }

    /// Address whose callbacks are trusted.
    #[must_use]
    pub fn identity_registry(&self) -> Address {
        self.identity_registry
    }

    /// Cleanup TTL in seconds.
    #[must_use]
    pub fn pending_ttl_secs(&self) -> u64 {
        self.pending_ttl_secs
    }

    /// Every accepted `AcceptFeedback`.
    #[must_use]
    pub fn feedback_count(&self) -> u64 {
        self.feedback_count
    }

    /// Feedback whose requester was confirmed by the identity registry.
    #[must_use]
    pub fn authorized_count(&self) -> u64 {
        self.authorized_count
    }

    /// Requests still awaiting a callback.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Look up a pending entry.
    #[must_use]
    pub fn get_pending(&self, query_id: QueryId) -> Option<&PendingFeedback> {
        self.pending.get(&query_id)
    }

    /// Check the ledger invariants. Used when restoring a snapshot.
    pub fn check_consistency(&self) -> RegistryResult<()> {
        if self.pending_ttl_secs == 0 {
            return Err(RegistryError::invalid_input(
                "pending feedback TTL must be positive",
            ));
        }
        if self.authorized_count > self.feedback_count {
            return Err(RegistryError::invalid_input(format!(
                "authorized count {} exceeds feedback count {}",
                self.authorized_count, self.feedback_count
            )));
        }
        for (&query_id, entry) in &self.pending {
            if entry.query_id != query_id || query_id >= self.next_query_id {
                return Err(RegistryError::invalid_input(format!(
                    "pending feedback {query_id} is inconsistent"
                )));
            }
        }
        Ok(())
    }
}
