//! # Fault Injection
//!
//! Lost identity round trips, forged callbacks and the dead-letter queue.
//! Message loss is simulated by isolating the identity registry on the bus.

#[cfg(test)]
mod tests {
    use ar_01_identity_registry::IdentityRegistryApi;
    use ar_02_reputation_registry::ReputationRegistryApi;
    use ar_03_validation_registry::ValidationRegistryApi;
    use node_runtime::NodeConfig;
    use shared_bus::{EventFilter, EventTopic, RegistryEvent};
    use shared_types::{
        DataHash, RegistryError, RegistryMessage, Resource, VerifyAgentResponse,
    };

    use crate::integration::harness::{user, Harness, GENESIS};

    const TTL: u64 = 120;

    fn short_ttls() -> Harness {
        let mut config = NodeConfig::default();
        config.reputation.pending_ttl_secs = TTL;
        config.validation.ttl_secs = TTL;
        Harness::with_config(config)
    }

    #[tokio::test]
    async fn test_lost_verification_goes_to_dlq() {
        let harness = short_ttls();
        let identity_address = harness.node.config.addresses.identity;
        let mut dlq = harness
            .node
            .events
            .subscribe(EventFilter::topics(vec![EventTopic::DeadLetterQueue]));

        harness.node.bus.isolate(identity_address);
        harness
            .node
            .reputation
            .accept_feedback(user("server"), 2, 1)
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(harness.node.bus.dropped_count(), 1);
        let dropped = dlq.drain();
        assert_eq!(dropped.len(), 1);
        match &dropped[0].event {
            RegistryEvent::MessageDropped {
                sender,
                recipient,
                message,
                ..
            } => {
                assert_eq!(*sender, harness.node.config.addresses.reputation);
                assert_eq!(*recipient, identity_address);
                assert_eq!(message, "VerifyAgent");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_orphaned_feedback_collected_after_ttl() {
        let harness = short_ttls();
        let identity_address = harness.node.config.addresses.identity;
        let reputation = &harness.node.reputation;
        let server = user("server");
        let sweeper = user("sweeper");
        harness.node.identity.register_agent(server).await.unwrap();

        harness.node.bus.isolate(identity_address);
        reputation.accept_feedback(server, 2, 1).await.unwrap();
        harness.settle().await;

        let pending = reputation.get_pending_feedback(0).await.unwrap().unwrap();
        assert_eq!(pending.requester, server);
        assert_eq!(pending.created_at, GENESIS);

        harness.clock.advance(TTL - 1);
        assert_eq!(
            reputation.cleanup_pending_feedback(sweeper, 0).await,
            Err(RegistryError::NotExpired {
                resource: Resource::PendingFeedback(0),
                collectible_after: GENESIS + TTL
            })
        );
        harness.clock.advance(1);
        reputation.cleanup_pending_feedback(sweeper, 0).await.unwrap();
        assert_eq!(reputation.pending_count().await.unwrap(), 0);
        assert_eq!(reputation.feedback_count().await.unwrap(), 1);
        assert_eq!(reputation.authorized_count().await.unwrap(), 0);

        // Round trips resume once the identity registry is reachable again.
        harness.node.bus.restore(&identity_address);
        reputation.accept_feedback(server, 2, 1).await.unwrap();
        harness.settle().await;
        assert_eq!(reputation.authorized_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_orphaned_validation_collected_and_retried() {
        let harness = short_ttls();
        let identity_address = harness.node.config.addresses.identity;
        let validation = &harness.node.validation;
        let (validator, server, sweeper) = (user("validator"), user("server"), user("sweeper"));
        harness.node.identity.register_agent(validator).await.unwrap();
        harness.node.identity.register_agent(server).await.unwrap();
        let h = DataHash::from(11u64);

        harness.node.bus.isolate(identity_address);
        validation
            .request_validation(server, 1, 2, h, validator)
            .await
            .unwrap();
        harness.settle().await;

        assert_eq!(validation.get_validation(h).await.unwrap(), None);
        let pending = validation.get_pending_validation(0).await.unwrap().unwrap();
        assert_eq!(pending.data_hash, h);
        assert_eq!(
            validation.request_validation(server, 1, 2, h, validator).await,
            Err(RegistryError::DuplicateRequest { data_hash: h })
        );

        harness.clock.advance(TTL);
        assert!(matches!(
            validation.cleanup_pending_validation(sweeper, 0).await,
            Err(RegistryError::NotExpired { .. })
        ));
        harness.clock.advance(1);
        validation.cleanup_pending_validation(sweeper, 0).await.unwrap();
        assert_eq!(validation.pending_count().await.unwrap(), 0);

        harness.node.bus.restore(&identity_address);
        validation
            .request_validation(server, 1, 2, h, validator)
            .await
            .unwrap();
        harness.settle().await;
        let committed = validation.get_validation(h).await.unwrap().unwrap();
        assert_eq!(committed.requested_at, GENESIS + TTL + 1);
    }

    #[tokio::test]
    async fn test_forged_callbacks_rejected() {
        let harness = short_ttls();
        let identity_address = harness.node.config.addresses.identity;
        let forger = user("forger");
        let validator = user("validator");
        let h = DataHash::from(12u64);

        harness.node.bus.isolate(identity_address);
        harness
            .node
            .reputation
            .accept_feedback(forger, 2, 1)
            .await
            .unwrap();
        harness
            .node
            .validation
            .request_validation(forger, 1, 2, h, validator)
            .await
            .unwrap();
        harness.settle().await;

        let forged = RegistryMessage::VerifyAgentResponse(VerifyAgentResponse {
            agent_id: 1,
            query_id: 0,
            verified: true,
            agent_address: forger,
        });
        let expected = Err(RegistryError::Unauthorized {
            sender: forger,
            expected: identity_address,
        });
        assert_eq!(harness.node.reputation.submit(forger, forged.clone()).await, expected);
        assert_eq!(harness.node.validation.submit(forger, forged).await, expected);

        assert_eq!(harness.node.reputation.pending_count().await.unwrap(), 1);
        assert_eq!(harness.node.reputation.authorized_count().await.unwrap(), 0);
        assert_eq!(harness.node.validation.pending_count().await.unwrap(), 1);
        assert_eq!(harness.node.validation.get_validation(h).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_late_callback_after_cleanup_ignored() {
        let harness = short_ttls();
        let identity_address = harness.node.config.addresses.identity;
        let server = user("server");
        let reputation = &harness.node.reputation;
        harness.node.identity.register_agent(server).await.unwrap();

        harness.node.bus.isolate(identity_address);
        reputation.accept_feedback(server, 2, 1).await.unwrap();
        harness.settle().await;
        harness.clock.advance(TTL);
        reputation.cleanup_pending_feedback(server, 0).await.unwrap();

        // The identity registry's answer finally arrives.
        let late = RegistryMessage::VerifyAgentResponse(VerifyAgentResponse {
            agent_id: 1,
            query_id: 0,
            verified: true,
            agent_address: server,
        });
        harness.node.bus.restore(&identity_address);
        reputation.submit(identity_address, late).await.unwrap();

        assert_eq!(reputation.authorized_count().await.unwrap(), 0);
        assert_eq!(reputation.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stopped_registry_unavailable() {
        let harness = Harness::start();
        let identity = harness.node.identity.clone();
        harness.node.shutdown().await.unwrap();

        assert!(matches!(
            identity.agent_count().await,
            Err(RegistryError::ActorUnavailable { .. })
        ));
        assert!(matches!(
            identity.register_agent(user("late")).await,
            Err(RegistryError::ActorUnavailable { .. })
        ));
    }
}
