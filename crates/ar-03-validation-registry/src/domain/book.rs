//! Validation book: committed validations and in-flight confirmations.
//!
//! Lifecycle of one `data_hash`:
//!
//! ```text
//! absent ──request──→ pending-confirmation ──confirm(ok)──→ unresponded ──respond──→ responded
//!                          │                                     │
//!                          ├──confirm(mismatch)──→ absent        └──cleanup (expired)──→ absent
//!                          └──cleanup pending (expired)──→ absent
//! ```
//!
//! `responded` is terminal and never collected.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, AgentId, DataHash, QueryId, RegistryError, RegistryResult, Resource, Score,
    Timestamp, VerifyAgentResponse, MAX_SCORE,
};
use std::collections::{BTreeMap, HashMap};

/// A committed validation slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Key of the slot; unique across committed and pending requests.
    pub data_hash: DataHash,
    /// Agent doing the validation.
    pub agent_validator_id: AgentId,
    /// Agent whose output is being validated.
    pub agent_server_id: AgentId,
    /// The only address allowed to respond.
    pub validator_address: Address,
    /// Start of the response window (commit time).
    pub requested_at: Timestamp,
    /// Set once by the validator's response.
    pub responded: bool,
    /// Meaningful only when `responded`.
    pub response: Score,
}

/// A validation request waiting for its identity callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingValidation {
    /// Correlates the identity callback with this request.
    pub query_id: QueryId,
    /// Hash reserved while the callback is outstanding.
    pub data_hash: DataHash,
    /// Agent that must own `validator_address`.
    pub agent_validator_id: AgentId,
    /// Agent whose output is being validated.
    pub agent_server_id: AgentId,
    /// Address the validator will respond from.
    pub validator_address: Address,
    /// Authenticated sender of `RequestValidation`.
    pub requester: Address,
    /// When the request was received; starts the collection TTL.
    pub created_at: Timestamp,
}

/// Outcome of a matched identity callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The validator pair matched; the slot is open.
    Committed(Validation),
    /// The identity registry did not confirm the validator pair.
    Rejected(PendingValidation),
    /// The data hash was already committed; the existing record is kept.
    Superseded(PendingValidation),
}

/// Validation registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationBook {
    identity_registry: Address,
    ttl_secs: u64,
    next_query_id: QueryId,
    validations: BTreeMap<DataHash, Validation>,
    pending: BTreeMap<QueryId, PendingValidation>,
    /// `data_hash → query_id` for every pending entry.
    in_flight: HashMap<DataHash, QueryId>,
}

impl ValidationBook {
    /// Empty book. Fails if `ttl_secs` is zero.
    pub fn new(identity_registry: Address, ttl_secs: u64) -> RegistryResult<Self> {
        if ttl_secs == 0 {
            return Err(RegistryError::invalid_input("validation TTL must be positive"));
        }
        Ok(Self {
            identity_registry,
            ttl_secs,
            next_query_id: 0,
            validations: BTreeMap::new(),
            pending: BTreeMap::new(),
            in_flight: HashMap::new(),
        })
    }

    /// Record a request awaiting identity confirmation.
    pub fn request(
        &mut self,
        requester: Address,
        agent_validator_id: AgentId,
        agent_server_id: AgentId,
        data_hash: DataHash,
        validator_address: Address,
        now: Timestamp,
    ) -> RegistryResult<QueryId> {
        if validator_address.is_zero() {
            return Err(RegistryError::invalid_input(
                "validator address must not be the zero address",
            ));
        }
        if self.validations.contains_key(&data_hash) || self.in_flight.contains_key(&data_hash) {
            return Err(RegistryError::DuplicateRequest { data_hash });
        }
        let query_id = self.next_query_id;
        let next = query_id
            .checked_add(1)
            .ok_or_else(|| RegistryError::invalid_input("query id space exhausted"))?;

        self.pending.insert(
            query_id,
            PendingValidation {
                query_id,
                data_hash,
                agent_validator_id,
                agent_server_id,
                validator_address,
                requester,
                created_at: now,
            },
        );
        self.in_flight.insert(data_hash, query_id);
        self.next_query_id = next;
        Ok(query_id)
    }

    /// Apply an identity callback. Never fails.
    ///
    /// The correlation entry is released first; unknown query ids return
    /// `None`.
    pub fn confirm(
        &mut self,
        response: &VerifyAgentResponse,
        now: Timestamp,
    ) -> Option<Confirmation> {
        let pending = self.release(response.query_id)?;

        if self.validations.contains_key(&pending.data_hash) {
            return Some(Confirmation::Superseded(pending));
        }
        if !response.confirms(&pending.validator_address) {
            return Some(Confirmation::Rejected(pending));
        }

        let validation = Validation {
            data_hash: pending.data_hash,
            agent_validator_id: pending.agent_validator_id,
            agent_server_id: pending.agent_server_id,
            validator_address: pending.validator_address,
            requested_at: now,
            responded: false,
            response: 0,
        };
        self.validations
            .insert(validation.data_hash, validation.clone());
        Some(Confirmation::Committed(validation))
    }

    /// The validation, if it can still accept a response at `now`.
    ///
    /// Checks existence, then expiry, then whether it already holds a
    /// response.
    pub fn open_validation(&self, data_hash: DataHash, now: Timestamp) -> RegistryResult<&Validation> {
        let validation = self.validation(data_hash)?;
        let deadline = self.deadline(validation);
        if now > deadline {
            return Err(RegistryError::Expired {
                data_hash,
                deadline,
            });
        }
        if validation.responded {
            return Err(RegistryError::AlreadyResponded { data_hash });
        }
        Ok(validation)
    }

    /// Store the designated validator's score.
    ///
    /// The caller must have checked `open_validation` and the sender.
    pub fn record_response(&mut self, data_hash: DataHash, response: Score) -> RegistryResult<()> {
        if response > MAX_SCORE {
            return Err(RegistryError::InvalidScore {
                score: response,
                max: MAX_SCORE,
            });
        }
        let validation = self
            .validations
            .get_mut(&data_hash)
            .ok_or(RegistryError::NotFound(Resource::Validation(data_hash)))?;
        if validation.responded {
            return Err(RegistryError::AlreadyResponded { data_hash });
        }
        validation.responded = true;
        validation.response = response;
        Ok(())
    }

    /// Collect an unresponded validation after its window closed.
    pub fn cleanup_expired(
        &mut self,
        data_hash: DataHash,
        now: Timestamp,
    ) -> RegistryResult<Validation> {
        let validation = self.validation(data_hash)?;
        if validation.responded {
            return Err(RegistryError::AlreadyResponded { data_hash });
        }
        let deadline = self.deadline(validation);
        if now <= deadline {
            return Err(RegistryError::NotExpired {
                resource: Resource::Validation(data_hash),
                collectible_after: deadline.saturating_add(1),
            });
        }
        self.validations
            .remove(&data_hash)
            .ok_or(RegistryError::NotFound(Resource::Validation(data_hash)))
    }

    /// Collect a request whose identity callback never arrived.
    pub fn cleanup_pending(
        &mut self,
        query_id: QueryId,
        now: Timestamp,
    ) -> RegistryResult<PendingValidation> {
        let pending = self
            .pending
            .get(&query_id)
            .ok_or(RegistryError::NotFound(Resource::PendingValidation(query_id)))?;

        let deadline = pending.created_at.saturating_add(self.ttl_secs);
        if now <= deadline {
            return Err(RegistryError::NotExpired {
                resource: Resource::PendingValidation(query_id),
                collectible_after: deadline.saturating_add(1),
            });
        }
        self.release(query_id)
            .ok_or(RegistryError::NotFound(Resource::PendingValidation(query_id)))
    }

    /// `Some(expired)` for a committed validation, `None` if absent.
    ///
    /// Responded records are never reported expired.
    #[must_use]
    pub fn is_expired(&self, data_hash: DataHash, now: Timestamp) -> Option<bool> {
        self.validations
            .get(&data_hash)
            .map(|v| !v.responded && now > self.deadline(v))
    }

    #[must_use]
    pub fn get_validation(&self, data_hash: DataHash) -> Option<&Validation> {
        self.validations.get(&data_hash)
    }

    #[must_use]
    pub fn get_pending(&self, query_id: QueryId) -> Option<&PendingValidation> {
        self.pending.get(&query_id)
    }

    #[must_use]
    pub fn identity_registry(&self) -> Address {
        self.identity_registry
    }

    #[must_use]
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    #[must_use]
    pub fn validation_count(&self) -> usize {
        self.validations.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check the book invariants. Used when restoring a snapshot.
    pub fn check_consistency(&self) -> RegistryResult<()> {
        if self.ttl_secs == 0 {
            return Err(RegistryError::invalid_input("validation TTL must be positive"));
        }
        if self.in_flight.len() != self.pending.len() {
            return Err(RegistryError::invalid_input(
                "in-flight index does not match pending table",
            ));
        }
        for (&query_id, pending) in &self.pending {
            if pending.query_id != query_id
                || query_id >= self.next_query_id
                || self.in_flight.get(&pending.data_hash) != Some(&query_id)
            {
                return Err(RegistryError::invalid_input(format!(
                    "pending validation {query_id} is inconsistent"
                )));
            }
        }
        for (data_hash, validation) in &self.validations {
            if validation.data_hash != *data_hash || validation.response > MAX_SCORE {
                return Err(RegistryError::invalid_input(format!(
                    "validation {} is inconsistent",
                    data_hash.short()
                )));
            }
        }
        Ok(())
    }

    fn validation(&self, data_hash: DataHash) -> RegistryResult<&Validation> {
        self.validations
            .get(&data_hash)
            .ok_or(RegistryError::NotFound(Resource::Validation(data_hash)))
    }

    fn deadline(&self, validation: &Validation) -> Timestamp {
        validation.requested_at.saturating_add(self.ttl_secs)
    }

    /// Remove a pending entry together with its in-flight index entry.
    fn release(&mut self, query_id: QueryId) -> Option<PendingValidation> {
        let pending = self.pending.remove(&query_id)?;
        if self.in_flight.get(&pending.data_hash) == Some(&query_id) {
            self.in_flight.remove(&pending.data_hash);
        }
        Some(pending)
    }
}
