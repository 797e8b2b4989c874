//! # Actor Run Loop
//!
//! Each registry is a single-threaded state machine driven by one tokio task:
//!
//! ```text
//!   mailbox ─┐
//!            ├─▶ select! ─▶ handle(envelope, now) ─▶ Effects ─▶ outbox
//!   queries ─┘                      │                              │
//!                                   └──── Err: nothing committed ──┘ (nothing sent)
//! ```
//!
//! `handle` must validate everything before mutating. Effects of a message
//! are dispatched only after `handle` returned `Ok`, so a failed message
//! leaves no trace outside the caller's outcome.

use crate::actor_bus::{BusError, Delivery, Envelope, InMemoryActorBus, Mailbox, Outbox};
use crate::events::RegistryEvent;
use crate::DEFAULT_QUERY_CAPACITY;
use shared_types::{Address, Outbound, RegistryError, RegistryResult, TimeSource, Timestamp};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What a successfully handled message wants the host to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Effects {
    /// Messages to send, in order.
    pub outbound: Vec<Outbound>,
    /// Events to publish, in order.
    pub events: Vec<RegistryEvent>,
}

impl Effects {
    /// No outbound traffic, no events.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A single event.
    #[must_use]
    pub fn event(event: RegistryEvent) -> Self {
        Self {
            outbound: Vec::new(),
            events: vec![event],
        }
    }

    /// Append an outbound message.
    #[must_use]
    pub fn send(mut self, outbound: Outbound) -> Self {
        self.outbound.push(outbound);
        self
    }
}

/// A registry actor.
pub trait Actor: Send + 'static {
    /// Read-only requests answered from local state.
    type Query: Send + 'static;

    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Process one authenticated message.
    ///
    /// On `Err` the actor's state must be unchanged.
    fn handle(&mut self, envelope: &Envelope, now: Timestamp) -> RegistryResult<Effects>;

    /// Answer a query. Never mutates state.
    fn answer(&self, query: Self::Query, now: Timestamp);
}

/// Drive `actor` until shutdown is signalled or its mailbox closes, then
/// hand the final state back.
///
/// On shutdown the mailbox is closed to new deliveries and everything already
/// queued is still processed, so no accepted message is lost and the bus's
/// in-flight count returns to zero.
pub async fn run_actor<A: Actor>(
    mut actor: A,
    mut mailbox: Mailbox,
    mut queries: mpsc::Receiver<A::Query>,
    outbox: Outbox,
    clock: Arc<dyn TimeSource>,
    mut shutdown: watch::Receiver<bool>,
) -> A {
    let name = actor.name();
    let mut queries_open = true;
    let mut shutdown_open = true;
    info!(actor = name, address = %outbox.owner(), "Actor started");

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed(), if shutdown_open => {
                if changed.is_err() {
                    shutdown_open = false;
                } else if *shutdown.borrow() {
                    info!(actor = name, "Shutdown signal received");
                    mailbox.close();
                    let mut drained = 0usize;
                    while let Some(delivery) = mailbox.recv().await {
                        process(&mut actor, delivery, &outbox, clock.now());
                        drained += 1;
                    }
                    if drained > 0 {
                        info!(actor = name, drained, "Queued messages processed before stop");
                    }
                    break;
                }
            }

            delivery = mailbox.recv() => {
                let Some(delivery) = delivery else {
                    debug!(actor = name, "Mailbox closed");
                    break;
                };
                process(&mut actor, delivery, &outbox, clock.now());
            }

            query = queries.recv(), if queries_open => {
                match query {
                    Some(query) => actor.answer(query, clock.now()),
                    None => queries_open = false,
                }
            }
        }
    }

    info!(actor = name, "Actor stopped");
    actor
}

/// Handle one delivery, dispatch its effects, release the caller and mark it
/// complete on the bus.
fn process<A: Actor>(actor: &mut A, delivery: Delivery, outbox: &Outbox, now: Timestamp) {
    let name = actor.name();
    let envelope = delivery.envelope;
    let message = envelope.payload.name();

    let outcome = actor.handle(&envelope, now).map(|effects| {
        for event in effects.events {
            outbox.publish(event);
        }
        for outbound in effects.outbound {
            outbox.send(outbound);
        }
    });

    match &outcome {
        Ok(()) => debug!(
            actor = name,
            message,
            sender = %envelope.sender.short(),
            "Message handled"
        ),
        Err(err) => debug!(
            actor = name,
            message,
            sender = %envelope.sender.short(),
            error = %err,
            "Message rejected"
        ),
    }

    if let Some(reply) = delivery.outcome {
        let _ = reply.send(outcome);
    }
    outbox.complete();
}

/// Register `actor` at `address` and run it on its own task.
pub fn spawn_actor<A: Actor>(
    actor: A,
    address: Address,
    bus: &Arc<InMemoryActorBus>,
    shutdown: watch::Receiver<bool>,
) -> Result<(QueryClient<A::Query>, JoinHandle<A>), BusError> {
    let mailbox = bus.register(address)?;
    let (client, queries) = QueryClient::channel(actor.name(), DEFAULT_QUERY_CAPACITY);
    let task = tokio::spawn(run_actor(
        actor,
        mailbox,
        queries,
        bus.outbox(address),
        bus.clock(),
        shutdown,
    ));
    Ok((client, task))
}

/// Sends queries to a running actor.
pub struct QueryClient<Q> {
    tx: mpsc::Sender<Q>,
    actor: &'static str,
}

impl<Q> Clone for QueryClient<Q> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            actor: self.actor,
        }
    }
}

impl<Q: Send> QueryClient<Q> {
    /// Create a client and the receiving end for the actor loop.
    #[must_use]
    pub fn channel(actor: &'static str, capacity: usize) -> (Self, mpsc::Receiver<Q>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, actor }, rx)
    }

    /// Build a query around a reply channel and wait for the answer.
    pub async fn ask<R>(&self, build: impl FnOnce(oneshot::Sender<R>) -> Q) -> RegistryResult<R> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| self.unavailable())?;
        answer.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RegistryError {
        RegistryError::ActorUnavailable {
            actor: self.actor.to_string(),
        }
    }
}
