//! # Actor Bus
//!
//! Point-to-point transport between registry actors.
//!
//! ## Host Guarantees
//!
//! - **Authenticated sender**: the bus stamps `sender` from the sending
//!   `Outbox`; a payload can never choose its own sender.
//! - **Per-actor ordering**: each actor owns one bounded FIFO mailbox.
//! - **No delivery guarantee**: a message to an unknown, isolated or
//!   saturated mailbox is dropped, logged, counted and published on the DLQ
//!   topic. The sending actor is never told.
//!
//! ## Quiescence
//!
//! Every enqueued delivery is counted as in flight until the receiving actor
//! calls `complete()`. Actors dispatch their outbound messages before
//! completing, so `wait_idle()` returns only after every round trip that was
//! triggered has finished.

use crate::events::{PublishedEvent, RegistryEvent};
use crate::publisher::InMemoryEventBus;
use crate::DEFAULT_MAILBOX_CAPACITY;
use parking_lot::RwLock;
use shared_types::{
    Address, AuthenticatedMessage, Outbound, RegistryError, RegistryMessage, RegistryResult,
    TimeSource,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, info, warn};

/// Envelope type carried by the actor bus.
pub type Envelope = AuthenticatedMessage<RegistryMessage>;

/// Channel on which an external caller learns the message outcome.
pub type OutcomeSender = oneshot::Sender<RegistryResult<()>>;

/// One mailbox entry.
#[derive(Debug)]
pub struct Delivery {
    /// The authenticated message.
    pub envelope: Envelope,
    /// Present only for messages submitted by external callers.
    pub outcome: Option<OutcomeSender>,
}

/// Receiving end of an actor's mailbox.
pub type Mailbox = mpsc::Receiver<Delivery>;

/// Why a message was not enqueued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// No actor is registered at the address.
    #[error("no actor registered at {0}")]
    UnknownRecipient(Address),
    /// The recipient is cut off by fault injection.
    #[error("recipient {0} is isolated")]
    Isolated(Address),
    /// The recipient's mailbox is at capacity.
    #[error("mailbox of {0} is full")]
    MailboxFull(Address),
    /// The recipient stopped.
    #[error("mailbox of {0} is closed")]
    MailboxClosed(Address),
    /// Envelope version not understood.
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u16),
}

/// Errors from mailbox registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Another actor already listens on this address.
    #[error("address {0} already has a mailbox")]
    AddressInUse(Address),
}

#[derive(Debug, Default)]
struct BusStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// In-memory actor transport.
pub struct InMemoryActorBus {
    routes: RwLock<HashMap<Address, mpsc::Sender<Delivery>>>,
    isolated: RwLock<HashSet<Address>>,
    events: Arc<InMemoryEventBus>,
    clock: Arc<dyn TimeSource>,
    in_flight: AtomicU64,
    idle: Notify,
    stats: BusStats,
    mailbox_capacity: usize,
}

impl InMemoryActorBus {
    /// Create a bus with the default mailbox capacity.
    pub fn new(events: Arc<InMemoryEventBus>, clock: Arc<dyn TimeSource>) -> Self {
        Self::with_capacity(events, clock, DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a bus whose mailboxes hold at most `mailbox_capacity` messages.
    pub fn with_capacity(
        events: Arc<InMemoryEventBus>,
        clock: Arc<dyn TimeSource>,
        mailbox_capacity: usize,
    ) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            isolated: RwLock::new(HashSet::new()),
            events,
            clock,
            in_flight: AtomicU64::new(0),
            idle: Notify::new(),
            stats: BusStats::default(),
            mailbox_capacity: mailbox_capacity.max(1),
        }
    }

    /// Open a mailbox at `address`.
    pub fn register(&self, address: Address) -> Result<Mailbox, BusError> {
        let mut routes = self.routes.write();
        if routes.contains_key(&address) {
            return Err(BusError::AddressInUse(address));
        }
        let (tx, rx) = mpsc::channel(self.mailbox_capacity);
        routes.insert(address, tx);
        info!(address = %address, capacity = self.mailbox_capacity, "Mailbox registered");
        Ok(rx)
    }

    /// True if an actor listens on `address`.
    #[must_use]
    pub fn is_registered(&self, address: &Address) -> bool {
        self.routes.read().contains_key(address)
    }

    /// An outbox that sends with `owner` as the authenticated sender.
    #[must_use]
    pub fn outbox(self: &Arc<Self>, owner: Address) -> Outbox {
        Outbox {
            owner,
            bus: Arc::clone(self),
        }
    }

    /// The event bus domain events are published on.
    #[must_use]
    pub fn events(&self) -> &Arc<InMemoryEventBus> {
        &self.events
    }

    /// The host clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn TimeSource> {
        Arc::clone(&self.clock)
    }

    /// Fire-and-forget send with a host-authenticated `sender`.
    pub fn send(
        &self,
        sender: Address,
        recipient: Address,
        payload: RegistryMessage,
    ) -> Result<(), DeliveryError> {
        let envelope = Envelope::new(sender, recipient, self.clock.now(), payload);
        self.deliver(Delivery {
            envelope,
            outcome: None,
        })
    }

    /// Send and obtain a receiver for the message outcome.
    pub fn submit(
        &self,
        sender: Address,
        recipient: Address,
        payload: RegistryMessage,
    ) -> Result<oneshot::Receiver<RegistryResult<()>>, DeliveryError> {
        let (tx, rx) = oneshot::channel();
        let envelope = Envelope::new(sender, recipient, self.clock.now(), payload);
        self.deliver(Delivery {
            envelope,
            outcome: Some(tx),
        })?;
        Ok(rx)
    }

    /// Send and wait until the recipient has processed the message.
    ///
    /// Transport failures surface as `ActorUnavailable`.
    pub async fn call(
        &self,
        sender: Address,
        recipient: Address,
        payload: RegistryMessage,
    ) -> RegistryResult<()> {
        let unavailable = || RegistryError::ActorUnavailable {
            actor: recipient.to_string(),
        };
        let outcome = self
            .submit(sender, recipient, payload)
            .map_err(|_| unavailable())?;
        outcome.await.map_err(|_| unavailable())?
    }

    /// Deliver a pre-built envelope.
    pub fn deliver(&self, delivery: Delivery) -> Result<(), DeliveryError> {
        let sender = delivery.envelope.sender;
        let recipient = delivery.envelope.recipient;
        let message = delivery.envelope.payload.name();

        match self.enqueue(delivery) {
            Ok(()) => {
                self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    sender = %sender.short(),
                    recipient = %recipient.short(),
                    message,
                    "Message enqueued"
                );
                Ok(())
            }
            Err(err) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    sender = %sender.short(),
                    recipient = %recipient.short(),
                    message,
                    reason = %err,
                    "Message dropped"
                );
                self.events.emit(PublishedEvent::new(
                    Address::ZERO,
                    RegistryEvent::MessageDropped {
                        sender,
                        recipient,
                        message: message.to_string(),
                        reason: err.to_string(),
                    },
                ));
                Err(err)
            }
        }
    }

    fn enqueue(&self, delivery: Delivery) -> Result<(), DeliveryError> {
        let recipient = delivery.envelope.recipient;
        if !delivery.envelope.is_supported_version() {
            return Err(DeliveryError::UnsupportedVersion(delivery.envelope.version));
        }
        if self.isolated.read().contains(&recipient) {
            return Err(DeliveryError::Isolated(recipient));
        }
        let route = self
            .routes
            .read()
            .get(&recipient)
            .cloned()
            .ok_or(DeliveryError::UnknownRecipient(recipient))?;

        // Counted before the send so the receiver can never complete first.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        route.try_send(delivery).map_err(|e| {
            self.complete();
            match e {
                mpsc::error::TrySendError::Full(_) => DeliveryError::MailboxFull(recipient),
                mpsc::error::TrySendError::Closed(_) => DeliveryError::MailboxClosed(recipient),
            }
        })
    }

    /// Mark one delivery as fully processed.
    pub fn complete(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Deliveries enqueued but not yet processed.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no delivery is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Drop every message addressed to `address` until `restore` is called.
    pub fn isolate(&self, address: Address) {
        warn!(address = %address, "Recipient isolated, messages will be dropped");
        self.isolated.write().insert(address);
    }

    /// Undo `isolate`.
    pub fn restore(&self, address: &Address) {
        if self.isolated.write().remove(address) {
            info!(address = %address, "Recipient restored");
        }
    }

    /// Total messages enqueued so far.
    #[must_use]
    pub fn delivered_count(&self) -> u64 {
        self.stats.delivered.load(Ordering::Relaxed)
    }

    /// Total messages dropped so far.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }
}

/// Sending capability bound to one actor's address.
#[derive(Clone)]
pub struct Outbox {
    owner: Address,
    bus: Arc<InMemoryActorBus>,
}

impl Outbox {
    /// The address this outbox authenticates as.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Fire-and-forget. Returns whether the message was enqueued.
    pub fn send(&self, outbound: Outbound) -> bool {
        self.bus
            .send(self.owner, outbound.recipient, outbound.payload)
            .is_ok()
    }

    /// Publish a domain event tagged with this actor's address.
    pub fn publish(&self, event: RegistryEvent) {
        self.bus.events.emit(PublishedEvent::new(self.owner, event));
    }

    /// Mark the current delivery as processed.
    pub fn complete(&self) {
        self.bus.complete();
    }
}
