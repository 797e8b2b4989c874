//! Identity registry service: the actor task and its client handle.

use crate::domain::AgentTable;
use crate::ipc::IdentityIpcHandler;
use crate::ports::IdentityRegistryApi;
use async_trait::async_trait;
use shared_bus::{spawn_actor, Actor, BusError, Effects, Envelope, InMemoryActorBus, QueryClient};
use shared_types::{Address, AgentId, RegistryMessage, RegistryResult, Timestamp};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Read-only queries answered from the agent table.
#[derive(Debug)]
pub enum IdentityQuery {
    /// Number of registered agents.
    AgentCount(oneshot::Sender<u64>),
    /// Owner of an agent.
    GetAgent {
        agent_id: AgentId,
        reply: oneshot::Sender<Option<Address>>,
    },
    /// Agent controlled by an address.
    GetAgentByAddress {
        address: Address,
        reply: oneshot::Sender<Option<AgentId>>,
    },
    /// Whether an address controls an agent.
    IsRegistered {
        address: Address,
        reply: oneshot::Sender<bool>,
    },
}

impl Actor for IdentityIpcHandler {
    type Query = IdentityQuery;

    fn name(&self) -> &'static str {
        "IdentityRegistry"
    }

    fn handle(&mut self, envelope: &Envelope, _now: Timestamp) -> RegistryResult<Effects> {
        IdentityIpcHandler::handle(self, envelope)
    }

    fn answer(&self, query: IdentityQuery, _now: Timestamp) {
        let table = self.table();
        // A dropped reply means the asker gave up.
        match query {
            IdentityQuery::AgentCount(reply) => {
                let _ = reply.send(table.agent_count());
            }
            IdentityQuery::GetAgent { agent_id, reply } => {
                let _ = reply.send(table.get_agent(agent_id));
            }
            IdentityQuery::GetAgentByAddress { address, reply } => {
                let _ = reply.send(table.get_agent_by_address(&address));
            }
            IdentityQuery::IsRegistered { address, reply } => {
                let _ = reply.send(table.is_registered(&address));
            }
        }
    }
}

/// Client handle to a running identity registry.
#[derive(Clone)]
pub struct IdentityRegistryHandle {
    address: Address,
    bus: Arc<InMemoryActorBus>,
    queries: QueryClient<IdentityQuery>,
}

impl IdentityRegistryHandle {
    /// Submit any message as `caller` and wait for its outcome.
    pub async fn submit(&self, caller: Address, message: RegistryMessage) -> RegistryResult<()> {
        self.bus.call(caller, self.address, message).await
    }
}

#[async_trait]
impl IdentityRegistryApi for IdentityRegistryHandle {
    fn address(&self) -> Address {
        self.address
    }

    async fn register_agent(&self, caller: Address) -> RegistryResult<()> {
        self.submit(caller, RegistryMessage::RegisterAgent).await
    }

    async fn update_agent_address(
        &self,
        caller: Address,
        agent_id: AgentId,
        new_address: Address,
    ) -> RegistryResult<()> {
        self.submit(
            caller,
            RegistryMessage::UpdateAgentAddress {
                agent_id,
                new_address,
            },
        )
        .await
    }

    async fn agent_count(&self) -> RegistryResult<u64> {
        self.queries.ask(IdentityQuery::AgentCount).await
    }

    async fn get_agent(&self, agent_id: AgentId) -> RegistryResult<Option<Address>> {
        self.queries
            .ask(|reply| IdentityQuery::GetAgent { agent_id, reply })
            .await
    }

    async fn get_agent_by_address(&self, address: Address) -> RegistryResult<Option<AgentId>> {
        self.queries
            .ask(|reply| IdentityQuery::GetAgentByAddress { address, reply })
            .await
    }

    async fn is_registered(&self, address: Address) -> RegistryResult<bool> {
        self.queries
            .ask(|reply| IdentityQuery::IsRegistered { address, reply })
            .await
    }
}

/// Start an identity registry at `address` with the given table.
///
/// The task returns the final table once `shutdown` flips to true.
pub fn spawn(
    address: Address,
    table: AgentTable,
    bus: &Arc<InMemoryActorBus>,
    shutdown: watch::Receiver<bool>,
) -> Result<(IdentityRegistryHandle, JoinHandle<IdentityIpcHandler>), BusError> {
    let handler = IdentityIpcHandler::with_table(address, table);
    let (queries, task) = spawn_actor(handler, address, bus, shutdown)?;
    let handle = IdentityRegistryHandle {
        address,
        bus: Arc::clone(bus),
        queries,
    };
    Ok((handle, task))
}
