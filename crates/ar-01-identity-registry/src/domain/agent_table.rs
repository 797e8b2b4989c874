//! Agent table: the address ↔ agent id bijection.

use serde::{Deserialize, Serialize};
use shared_types::{
    Address, AgentId, RegistryError, RegistryResult, Resource, VerifyAgentResponse, QueryId,
};
use std::collections::{BTreeMap, HashMap};

/// Identity registry state.
///
/// Invariants:
/// - ids are dense, `1..=agent_count`
/// - `by_id` and `by_address` are exact inverses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTable {
    agent_count: AgentId,
    by_id: BTreeMap<AgentId, Address>,
    by_address: HashMap<Address, AgentId>,
}

impl AgentTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next agent id to `owner`.
    pub fn register(&mut self, owner: Address) -> RegistryResult<AgentId> {
        if let Some(&agent_id) = self.by_address.get(&owner) {
            return Err(RegistryError::DuplicateIdentity {
                address: owner,
                agent_id,
            });
        }
        let agent_id = self
            .agent_count
            .checked_add(1)
            .ok_or_else(|| RegistryError::invalid_input("agent id space exhausted"))?;

        self.by_id.insert(agent_id, owner);
        self.by_address.insert(owner, agent_id);
        self.agent_count = agent_id;
        Ok(agent_id)
    }

    /// Move `agent_id` to `new_address`, returning the previous owner.
    ///
    /// The caller must already have checked that the sender owns the agent.
    /// Moving an agent to the address it already has is a no-op.
    pub fn update_address(
        &mut self,
        agent_id: AgentId,
        new_address: Address,
    ) -> RegistryResult<Address> {
        let old_address = self.owner_of(agent_id)?;
        match self.by_address.get(&new_address) {
            Some(&other) if other != agent_id => {
                return Err(RegistryError::DuplicateIdentity {
                    address: new_address,
                    agent_id: other,
                });
            }
            Some(_) => return Ok(old_address),
            None => {}
        }

        self.by_address.remove(&old_address);
        self.by_id.insert(agent_id, new_address);
        self.by_address.insert(new_address, agent_id);
        Ok(old_address)
    }

    /// Oracle answer for `agent_id`. Unknown ids yield `verified = false`
    /// with `sentinel` as the address.
    #[must_use]
    pub fn verify(
        &self,
        agent_id: AgentId,
        query_id: QueryId,
        sentinel: Address,
    ) -> VerifyAgentResponse {
        let owner = self.get_agent(agent_id);
        VerifyAgentResponse {
            agent_id,
            query_id,
            verified: owner.is_some(),
            agent_address: owner.unwrap_or(sentinel),
        }
    }

    /// Current owner, or `NotFound`.
    pub fn owner_of(&self, agent_id: AgentId) -> RegistryResult<Address> {
        self.get_agent(agent_id)
            .ok_or(RegistryError::NotFound(Resource::Agent(agent_id)))
    }

    /// Number of agents ever registered.
    #[must_use]
    pub fn agent_count(&self) -> AgentId {
        self.agent_count
    }

    /// Owner of `agent_id`.
    #[must_use]
    pub fn get_agent(&self, agent_id: AgentId) -> Option<Address> {
        self.by_id.get(&agent_id).copied()
    }

    /// Agent controlled by `address`.
    #[must_use]
    pub fn get_agent_by_address(&self, address: &Address) -> Option<AgentId> {
        self.by_address.get(address).copied()
    }

    /// True if `address` controls an agent.
    #[must_use]
    pub fn is_registered(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// Check the table invariants. Used when restoring a snapshot.
    pub fn check_consistency(&self) -> RegistryResult<()> {
        if self.by_id.len() != self.by_address.len() {
            return Err(RegistryError::invalid_input(format!(
                "index sizes differ: {} ids, {} addresses",
                self.by_id.len(),
                self.by_address.len()
            )));
        }
        if self.by_id.len() as u64 != self.agent_count {
            return Err(RegistryError::invalid_input(format!(
                "agent count {} does not match {} records",
                self.agent_count,
                self.by_id.len()
            )));
        }
        for (expected, (&agent_id, address)) in (1..).zip(&self.by_id) {
            if agent_id != expected {
                return Err(RegistryError::invalid_input(format!(
                    "agent ids are not dense: found {agent_id}, expected {expected}"
                )));
            }
            if self.by_address.get(address) != Some(&agent_id) {
                return Err(RegistryError::invalid_input(format!(
                    "reverse index disagrees for agent {agent_id}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address([n; 32])
    }

    #[test]
    fn test_empty_table_defaults() {
        let table = AgentTable::new();
        assert_eq!(table.agent_count(), 0);
        assert_eq!(table.get_agent(1), None);
        assert_eq!(table.get_agent_by_address(&addr(1)), None);
        assert!(table.check_consistency().is_ok());
    }

    #[test]
    fn test_sequential_ids() {
        let mut table = AgentTable::new();
        assert_eq!(table.register(addr(0xA)).unwrap(), 1);
        assert_eq!(table.register(addr(0xB)).unwrap(), 2);
        assert_eq!(table.register(addr(0xC)).unwrap(), 3);

        assert_eq!(table.get_agent(1), Some(addr(0xA)));
        assert_eq!(table.get_agent(2), Some(addr(0xB)));
        assert_eq!(table.get_agent(3), Some(addr(0xC)));
        assert_eq!(table.agent_count(), 3);
    }

    #[test]
    fn test_duplicate_registration_leaves_state() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();
        let before = table.clone();

        let err = table.register(addr(1)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateIdentity {
                address: addr(1),
                agent_id: 1
            }
        );
        assert_eq!(table, before);
        assert_eq!(table.agent_count(), 1);
    }

    #[test]
    fn test_update_flips_both_indexes() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();

        let old = table.update_address(1, addr(2)).unwrap();
        assert_eq!(old, addr(1));
        assert_eq!(table.get_agent(1), Some(addr(2)));
        assert_eq!(table.get_agent_by_address(&addr(2)), Some(1));
        assert!(!table.is_registered(&addr(1)));
        assert!(table.check_consistency().is_ok());

        // The freed address can register again.
        assert_eq!(table.register(addr(1)).unwrap(), 2);
    }

    #[test]
    fn test_update_to_taken_address_fails() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();
        table.register(addr(2)).unwrap();
        let before = table.clone();

        let err = table.update_address(1, addr(2)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateIdentity { agent_id: 2, .. }
        ));
        assert_eq!(table, before);
    }

    #[test]
    fn test_update_to_own_address_is_noop() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();
        let before = table.clone();

        assert_eq!(table.update_address(1, addr(1)).unwrap(), addr(1));
        assert_eq!(table, before);
    }

    #[test]
    fn test_update_unknown_agent() {
        let mut table = AgentTable::new();
        assert_eq!(
            table.update_address(9, addr(1)).unwrap_err(),
            RegistryError::NotFound(Resource::Agent(9))
        );
    }

    #[test]
    fn test_verify_known_and_unknown() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();
        let sentinel = addr(0xFF);

        let known = table.verify(1, 7, sentinel);
        assert!(known.verified);
        assert_eq!(known.agent_address, addr(1));
        assert_eq!(known.query_id, 7);

        let unknown = table.verify(5, 8, sentinel);
        assert!(!unknown.verified);
        assert_eq!(unknown.agent_address, sentinel);
        assert_eq!(unknown.agent_id, 5);
    }

    #[test]
    fn test_bijection_holds_after_mixed_operations() {
        let mut table = AgentTable::new();
        for n in 1..=10u8 {
            table.register(addr(n)).unwrap();
        }
        table.update_address(3, addr(30)).unwrap();
        table.update_address(7, addr(70)).unwrap();
        let _ = table.update_address(4, addr(5));

        for id in 1..=table.agent_count() {
            let owner = table.get_agent(id).unwrap();
            assert_eq!(table.get_agent_by_address(&owner), Some(id));
        }
        assert!(table.check_consistency().is_ok());
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_invariants() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();
        table.register(addr(2)).unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let restored: AgentTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
        assert!(restored.check_consistency().is_ok());
    }

    #[test]
    fn test_consistency_rejects_broken_counter() {
        let mut table = AgentTable::new();
        table.register(addr(1)).unwrap();
        table.agent_count = 4;
        assert!(matches!(
            table.check_consistency(),
            Err(RegistryError::InvalidInput { .. })
        ));
    }
}
