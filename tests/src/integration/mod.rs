//! Cross-actor choreography tests.
//!
//! Every scenario goes through the bus the way an external caller would:
//! handle calls return once the target actor has processed the message, and
//! `Harness::settle` waits for the identity round trips it triggered.

pub mod fault_injection;
pub mod identity_flows;
pub mod reputation_flows;
pub mod validation_flows;

#[cfg(test)]
pub(crate) mod harness {
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::{NodeConfig, RegistryContainer, Snapshot};
    use shared_types::{Address, ManualTimeSource};
    use tokio::time::timeout;

    /// Start of the manual clock in every scenario.
    pub const GENESIS: u64 = 1_700_000_000;

    /// A running node plus the clock that drives it.
    pub struct Harness {
        pub clock: ManualTimeSource,
        pub node: RegistryContainer,
    }

    impl Harness {
        pub fn start() -> Self {
            Self::with_config(NodeConfig::default())
        }

        pub fn with_config(config: NodeConfig) -> Self {
            let clock = ManualTimeSource::new(GENESIS);
            let node = RegistryContainer::start(config, Arc::new(clock.clone()), Snapshot::default())
                .expect("container starts");
            Self { clock, node }
        }

        /// Wait until every triggered round trip has been processed.
        pub async fn settle(&self) {
            timeout(Duration::from_secs(5), self.node.bus.wait_idle())
                .await
                .expect("bus did not go idle");
        }
    }

    /// A user address derived from a readable name.
    pub fn user(name: &str) -> Address {
        Address::from_label(name)
    }
}
