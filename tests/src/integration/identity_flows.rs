//! # Identity Registry Flows
//!
//! Registration and ownership transfer as seen by external callers, plus the
//! address/id bijection under a randomized workload.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use ar_01_identity_registry::IdentityRegistryApi;
    use shared_bus::{EventFilter, EventTopic, RegistryEvent};
    use shared_types::{Address, RegistryError, RegistryMessage, Resource};

    use crate::integration::harness::{user, Harness};

    async fn assert_bijection(harness: &Harness, pool: &[Address]) {
        let identity = &harness.node.identity;
        let count = identity.agent_count().await.unwrap();

        for id in 1..=count {
            let owner = identity.get_agent(id).await.unwrap().expect("ids are dense");
            assert_eq!(identity.get_agent_by_address(owner).await.unwrap(), Some(id));
        }
        for &address in pool {
            if let Some(id) = identity.get_agent_by_address(address).await.unwrap() {
                assert_eq!(identity.get_agent(id).await.unwrap(), Some(address));
                assert!(identity.is_registered(address).await.unwrap());
            } else {
                assert!(!identity.is_registered(address).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn test_agents_numbered_in_registration_order() {
        let harness = Harness::start();
        let identity = &harness.node.identity;
        let (a, b, c) = (user("A"), user("B"), user("C"));

        for sender in [a, b, c] {
            identity.register_agent(sender).await.unwrap();
        }

        assert_eq!(identity.get_agent(1).await.unwrap(), Some(a));
        assert_eq!(identity.get_agent(2).await.unwrap(), Some(b));
        assert_eq!(identity.get_agent(3).await.unwrap(), Some(c));
        assert_eq!(identity.agent_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_second_registration_rejected() {
        let harness = Harness::start();
        let identity = &harness.node.identity;
        let alice = user("alice");

        identity.register_agent(alice).await.unwrap();
        assert_eq!(
            identity.register_agent(alice).await,
            Err(RegistryError::DuplicateIdentity {
                address: alice,
                agent_id: 1
            })
        );
        assert_eq!(identity.agent_count().await.unwrap(), 1);
        assert_eq!(identity.get_agent(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_owner_moves_agent() {
        let harness = Harness::start();
        let identity = &harness.node.identity;
        let mut events = harness
            .node
            .events
            .subscribe(EventFilter::topics(vec![EventTopic::Identity]));
        let (old, new) = (user("old-key"), user("new-key"));

        identity.register_agent(old).await.unwrap();
        identity.update_agent_address(old, 1, new).await.unwrap();

        assert_eq!(identity.get_agent(1).await.unwrap(), Some(new));
        assert_eq!(identity.get_agent_by_address(new).await.unwrap(), Some(1));
        assert_eq!(identity.get_agent_by_address(old).await.unwrap(), None);
        assert!(!identity.is_registered(old).await.unwrap());

        // The released address may register afresh.
        identity.register_agent(old).await.unwrap();
        assert_eq!(identity.get_agent_by_address(old).await.unwrap(), Some(2));

        let published: Vec<_> = events.drain().into_iter().map(|p| p.event).collect();
        assert!(published.contains(&RegistryEvent::AgentAddressUpdated {
            agent_id: 1,
            old_address: old,
            new_address: new,
        }));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_move_agent() {
        let harness = Harness::start();
        let identity = &harness.node.identity;
        let (owner, mallory) = (user("owner"), user("mallory"));

        identity.register_agent(owner).await.unwrap();
        assert_eq!(
            identity.update_agent_address(mallory, 1, mallory).await,
            Err(RegistryError::Unauthorized {
                sender: mallory,
                expected: owner
            })
        );

        assert_eq!(identity.get_agent(1).await.unwrap(), Some(owner));
        assert_eq!(identity.get_agent_by_address(mallory).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_unknown_agent() {
        let harness = Harness::start();
        let caller = user("caller");
        assert_eq!(
            harness
                .node
                .identity
                .update_agent_address(caller, 9, user("x"))
                .await,
            Err(RegistryError::NotFound(Resource::Agent(9)))
        );
    }

    #[tokio::test]
    async fn test_bijection_under_random_workload() {
        let harness = Harness::start();
        let identity = &harness.node.identity;
        let pool: Vec<Address> = (0..12).map(|i| user(&format!("user-{i}"))).collect();
        let mut rng = StdRng::seed_from_u64(0xA6E7);

        for _ in 0..200 {
            let caller = pool[rng.gen_range(0..pool.len())];
            if rng.gen_bool(0.4) {
                let _ = identity.register_agent(caller).await;
            } else {
                let count = identity.agent_count().await.unwrap();
                let agent_id = rng.gen_range(0..=count + 1);
                let target = pool[rng.gen_range(0..pool.len())];
                let _ = identity.update_agent_address(caller, agent_id, target).await;
            }
        }

        assert!(identity.agent_count().await.unwrap() > 0);
        assert_bijection(&harness, &pool).await;
    }

    #[tokio::test]
    async fn test_foreign_message_rejected() {
        let harness = Harness::start();
        let caller = user("caller");
        let outcome = harness
            .node
            .identity
            .submit(caller, RegistryMessage::CleanupPendingFeedback { query_id: 0 })
            .await;
        assert!(matches!(
            outcome,
            Err(RegistryError::UnsupportedMessage { .. })
        ));
    }
}
