//! # Reputation Registry Flows
//!
//! `AcceptFeedback` → `VerifyAgent` → `VerifyAgentResponse` round trips
//! between the reputation and identity registries.

#[cfg(test)]
mod tests {
    use ar_01_identity_registry::IdentityRegistryApi;
    use ar_02_reputation_registry::ReputationRegistryApi;
    use shared_bus::{EventFilter, RegistryEvent};
    use shared_types::{RegistryError, Resource};

    use crate::integration::harness::{user, Harness};

    #[tokio::test]
    async fn test_server_owner_feedback_authorized() {
        let harness = Harness::start();
        let server = user("server");
        harness.node.identity.register_agent(server).await.unwrap();

        let reputation = &harness.node.reputation;
        reputation.accept_feedback(server, 2, 1).await.unwrap();
        harness.settle().await;

        assert_eq!(reputation.feedback_count().await.unwrap(), 1);
        assert_eq!(reputation.authorized_count().await.unwrap(), 1);
        assert_eq!(reputation.pending_count().await.unwrap(), 0);
        assert_eq!(reputation.get_pending_feedback(0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_impostor_feedback_not_authorized() {
        let harness = Harness::start();
        let mut events = harness
            .node
            .events
            .subscribe(EventFilter::from_sources(vec![harness.node.config.addresses.reputation]));
        let (server, impostor) = (user("server"), user("impostor"));
        harness.node.identity.register_agent(server).await.unwrap();

        let reputation = &harness.node.reputation;
        reputation.accept_feedback(impostor, 2, 1).await.unwrap();
        harness.settle().await;

        assert_eq!(reputation.feedback_count().await.unwrap(), 1);
        assert_eq!(reputation.authorized_count().await.unwrap(), 0);
        assert_eq!(reputation.pending_count().await.unwrap(), 0);

        let published: Vec<_> = events.drain().into_iter().map(|p| p.event).collect();
        assert!(published.contains(&RegistryEvent::FeedbackResolved {
            query_id: 0,
            agent_server_id: 1,
            authorized: false,
        }));
    }

    #[tokio::test]
    async fn test_unknown_server_agent_not_authorized() {
        let harness = Harness::start();
        let caller = user("caller");
        let reputation = &harness.node.reputation;

        reputation.accept_feedback(caller, 1, 77).await.unwrap();
        harness.settle().await;

        assert_eq!(reputation.feedback_count().await.unwrap(), 1);
        assert_eq!(reputation.authorized_count().await.unwrap(), 0);
        assert_eq!(reputation.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authorization_follows_address_update() {
        let harness = Harness::start();
        let identity = &harness.node.identity;
        let reputation = &harness.node.reputation;
        let (old, new) = (user("old"), user("new"));

        identity.register_agent(old).await.unwrap();
        identity.update_agent_address(old, 1, new).await.unwrap();

        reputation.accept_feedback(old, 5, 1).await.unwrap();
        reputation.accept_feedback(new, 5, 1).await.unwrap();
        harness.settle().await;

        assert_eq!(reputation.feedback_count().await.unwrap(), 2);
        assert_eq!(reputation.authorized_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_of_resolved_or_unknown_query() {
        let harness = Harness::start();
        let server = user("server");
        harness.node.identity.register_agent(server).await.unwrap();

        let reputation = &harness.node.reputation;
        reputation.accept_feedback(server, 2, 1).await.unwrap();
        harness.settle().await;

        let anyone = user("sweeper");
        assert_eq!(
            reputation.cleanup_pending_feedback(anyone, 0).await,
            Err(RegistryError::NotFound(Resource::PendingFeedback(0)))
        );
        assert_eq!(
            reputation.cleanup_pending_feedback(anyone, 42).await,
            Err(RegistryError::NotFound(Resource::PendingFeedback(42)))
        );
    }

    #[tokio::test]
    async fn test_query_ids_increase_per_request() {
        let harness = Harness::start();
        let mut events = harness.node.events.subscribe(EventFilter::all());
        let caller = user("caller");
        let reputation = &harness.node.reputation;

        for client in 1..=3 {
            reputation.accept_feedback(caller, client, 9).await.unwrap();
        }
        harness.settle().await;

        let query_ids: Vec<_> = events
            .drain()
            .into_iter()
            .filter_map(|p| match p.event {
                RegistryEvent::FeedbackAccepted { query_id, .. } => Some(query_id),
                _ => None,
            })
            .collect();
        assert_eq!(query_ids, vec![0, 1, 2]);
    }
}
