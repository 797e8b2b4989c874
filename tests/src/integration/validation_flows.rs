//! # Validation Registry Flows
//!
//! Request → identity confirmation → response, and the TTL rules around
//! responding to and collecting validations.

#[cfg(test)]
mod tests {
    use ar_01_identity_registry::IdentityRegistryApi;
    use ar_02_reputation_registry::ReputationRegistryApi;
    use ar_03_validation_registry::ValidationRegistryApi;
    use node_runtime::NodeConfig;
    use shared_bus::{EventFilter, EventTopic, RegistryEvent};
    use shared_types::{Address, DataHash, RegistryError, Resource};

    use crate::integration::harness::{user, Harness, GENESIS};

    const TTL: u64 = 60;

    struct Parties {
        validator: Address,
        server: Address,
    }

    /// Validator registered as agent 1, server as agent 2.
    async fn register_parties(harness: &Harness) -> Parties {
        let parties = Parties {
            validator: user("validator"),
            server: user("server"),
        };
        let identity = &harness.node.identity;
        identity.register_agent(parties.validator).await.unwrap();
        identity.register_agent(parties.server).await.unwrap();
        parties
    }

    fn short_ttl() -> Harness {
        let mut config = NodeConfig::default();
        config.validation.ttl_secs = TTL;
        Harness::with_config(config)
    }

    /// Request a validation and wait for the identity confirmation.
    async fn open(harness: &Harness, parties: &Parties, data_hash: DataHash) {
        harness
            .node
            .validation
            .request_validation(parties.server, 1, 2, data_hash, parties.validator)
            .await
            .unwrap();
        harness.settle().await;
    }

    #[tokio::test]
    async fn test_confirmed_request_opens_validation() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        let h = DataHash::of(b"inference output");

        open(&harness, &parties, h).await;

        let validation = harness
            .node
            .validation
            .get_validation(h)
            .await
            .unwrap()
            .expect("committed");
        assert_eq!(validation.validator_address, parties.validator);
        assert_eq!(validation.agent_validator_id, 1);
        assert_eq!(validation.agent_server_id, 2);
        assert_eq!(validation.requested_at, GENESIS);
        assert!(!validation.responded);
        assert_eq!(harness.node.validation.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_validator_leaves_nothing() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        let mut events = harness
            .node
            .events
            .subscribe(EventFilter::topics(vec![EventTopic::Validation]));
        let validation = &harness.node.validation;
        let (wrong_address, unknown_id) = (DataHash::from(1u64), DataHash::from(2u64));

        validation
            .request_validation(parties.server, 1, 2, wrong_address, parties.server)
            .await
            .unwrap();
        validation
            .request_validation(parties.server, 99, 2, unknown_id, parties.validator)
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(validation.get_validation(wrong_address).await.unwrap(), None);
        assert_eq!(validation.get_validation(unknown_id).await.unwrap(), None);
        assert_eq!(validation.pending_count().await.unwrap(), 0);

        let discarded = events
            .drain()
            .into_iter()
            .filter(|p| matches!(p.event, RegistryEvent::ValidationDiscarded { .. }))
            .count();
        assert_eq!(discarded, 2);

        // A discarded hash may be requested again.
        open(&harness, &parties, wrong_address).await;
        assert!(validation.get_validation(wrong_address).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_data_hash_rejected() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        let h = DataHash::from(7u64);
        open(&harness, &parties, h).await;

        let other = user("other-validator");
        assert_eq!(
            harness
                .node
                .validation
                .request_validation(parties.server, 1, 2, h, other)
                .await,
            Err(RegistryError::DuplicateRequest { data_hash: h })
        );

        let stored = harness.node.validation.get_validation(h).await.unwrap().unwrap();
        assert_eq!(stored.validator_address, parties.validator);
    }

    #[tokio::test]
    async fn test_zero_validator_address_rejected() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        assert!(matches!(
            harness
                .node
                .validation
                .request_validation(parties.server, 1, 2, DataHash::from(1u64), Address::ZERO)
                .await,
            Err(RegistryError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_score_bounds() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        let validation = &harness.node.validation;
        let (low, high) = (DataHash::from(1u64), DataHash::from(2u64));
        open(&harness, &parties, low).await;
        open(&harness, &parties, high).await;

        assert_eq!(
            validation.respond_validation(parties.validator, low, 101).await,
            Err(RegistryError::InvalidScore {
                score: 101,
                max: 100
            })
        );
        validation.respond_validation(parties.validator, low, 0).await.unwrap();
        validation.respond_validation(parties.validator, high, 100).await.unwrap();

        let low_v = validation.get_validation(low).await.unwrap().unwrap();
        let high_v = validation.get_validation(high).await.unwrap().unwrap();
        assert!(low_v.responded && low_v.response == 0);
        assert!(high_v.responded && high_v.response == 100);
    }

    #[tokio::test]
    async fn test_only_designated_validator_responds_once() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        let validation = &harness.node.validation;
        let h = DataHash::from(3u64);
        open(&harness, &parties, h).await;

        assert_eq!(
            validation.respond_validation(parties.server, h, 50).await,
            Err(RegistryError::Unauthorized {
                sender: parties.server,
                expected: parties.validator
            })
        );
        validation.respond_validation(parties.validator, h, 80).await.unwrap();
        assert_eq!(
            validation.respond_validation(parties.validator, h, 10).await,
            Err(RegistryError::AlreadyResponded { data_hash: h })
        );

        let stored = validation.get_validation(h).await.unwrap().unwrap();
        assert_eq!(stored.response, 80);
    }

    #[tokio::test]
    async fn test_validator_moving_keys_keeps_stored_address() {
        let harness = Harness::start();
        let parties = register_parties(&harness).await;
        let h = DataHash::from(4u64);
        open(&harness, &parties, h).await;

        let rotated = user("validator-rotated");
        harness
            .node
            .identity
            .update_agent_address(parties.validator, 1, rotated)
            .await
            .unwrap();

        let validation = &harness.node.validation;
        assert!(matches!(
            validation.respond_validation(rotated, h, 70).await,
            Err(RegistryError::Unauthorized { .. })
        ));
        validation.respond_validation(parties.validator, h, 70).await.unwrap();
    }

    #[tokio::test]
    async fn test_response_window_and_expiry_cleanup() {
        let harness = short_ttl();
        let parties = register_parties(&harness).await;
        let validation = &harness.node.validation;
        let sweeper = user("sweeper");
        let h = DataHash::from(5u64);
        open(&harness, &parties, h).await;

        harness.clock.advance(TTL);
        assert_eq!(validation.is_expired(h).await.unwrap(), Some(false));
        assert_eq!(
            validation.cleanup_expired_validation(sweeper, h).await,
            Err(RegistryError::NotExpired {
                resource: Resource::Validation(h),
                collectible_after: GENESIS + TTL + 1
            })
        );

        harness.clock.advance(1);
        assert_eq!(validation.is_expired(h).await.unwrap(), Some(true));
        assert_eq!(
            validation.respond_validation(parties.validator, h, 50).await,
            Err(RegistryError::Expired {
                data_hash: h,
                deadline: GENESIS + TTL
            })
        );

        validation.cleanup_expired_validation(sweeper, h).await.unwrap();
        assert_eq!(validation.get_validation(h).await.unwrap(), None);
        assert_eq!(validation.is_expired(h).await.unwrap(), None);
        assert_eq!(
            validation.cleanup_expired_validation(sweeper, h).await,
            Err(RegistryError::NotFound(Resource::Validation(h)))
        );
    }

    #[tokio::test]
    async fn test_responded_validation_never_collected() {
        let harness = short_ttl();
        let parties = register_parties(&harness).await;
        let validation = &harness.node.validation;
        let h = DataHash::from(6u64);
        open(&harness, &parties, h).await;

        harness.clock.advance(TTL);
        validation.respond_validation(parties.validator, h, 90).await.unwrap();

        harness.clock.advance(TTL * 10);
        assert_eq!(
            validation
                .cleanup_expired_validation(user("sweeper"), h)
                .await,
            Err(RegistryError::AlreadyResponded { data_hash: h })
        );
        assert_eq!(
            validation.get_validation(h).await.unwrap().unwrap().response,
            90
        );
    }

    #[tokio::test]
    async fn test_queries_before_any_write() {
        let harness = Harness::start();
        let node = &harness.node;
        let h = DataHash::from(1u64);
        let nobody = user("nobody");

        for _ in 0..2 {
            assert_eq!(node.identity.agent_count().await.unwrap(), 0);
            assert_eq!(node.identity.get_agent(1).await.unwrap(), None);
            assert_eq!(node.identity.get_agent_owner(1).await.unwrap(), None);
            assert_eq!(node.identity.get_agent_by_address(nobody).await.unwrap(), None);
            assert!(!node.identity.is_registered(nobody).await.unwrap());

            assert_eq!(node.reputation.feedback_count().await.unwrap(), 0);
            assert_eq!(node.reputation.authorized_count().await.unwrap(), 0);
            assert_eq!(node.reputation.pending_count().await.unwrap(), 0);
            assert_eq!(
                node.reputation.identity_registry_address().await.unwrap(),
                node.config.addresses.identity
            );

            assert_eq!(node.validation.get_validation(h).await.unwrap(), None);
            assert_eq!(node.validation.validation_count().await.unwrap(), 0);
            assert_eq!(node.validation.is_expired(h).await.unwrap(), None);
            assert_eq!(
                node.validation.identity_registry_address().await.unwrap(),
                node.config.addresses.identity
            );
            assert_eq!(node.validation.ttl_value().await.unwrap(), 86_400);
        }
    }
}
