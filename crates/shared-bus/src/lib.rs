//! # Shared Bus - Actor Transport and Event Bus
//!
//! Two channels connect the registry actors to the outside world:
//!
//! - **Actor bus** (`actor_bus`): point-to-point, per-actor FIFO mailboxes.
//!   The only way one actor can affect another.
//! - **Event bus** (`publisher`, `subscriber`): broadcast of domain events
//!   after each committed state change. Observers only.
//!
//! ```text
//!  caller ──submit()──▶ ┌──────────────┐ ──mailbox──▶ ┌──────────┐
//!                       │  Actor Bus   │              │  Actor   │
//!                       │              │ ◀──outbox─── │          │
//!                       └──────────────┘              └────┬─────┘
//!                              │ DLQ                       │ publish()
//!                              ▼                           ▼
//!                       ┌──────────────────────────────────────┐
//!                       │              Event Bus               │
//!                       └──────────────────────────────────────┘
//! ```
//!
//! ## Security
//!
//! - **Envelope-Only Identity:** `sender` is stamped by the bus from the
//!   sending outbox and is the sole authority.
//! - **Dead Letter Queue:** undeliverable messages are published on
//!   `EventTopic::DeadLetterQueue`.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod actor;
pub mod actor_bus;
pub mod events;
pub mod publisher;
pub mod subscriber;

pub use actor::{run_actor, spawn_actor, Actor, Effects, QueryClient};
pub use actor_bus::{
    BusError, Delivery, DeliveryError, Envelope, InMemoryActorBus, Mailbox, Outbox,
};
pub use events::{EventFilter, EventTopic, PublishedEvent, RegistryEvent};
pub use publisher::InMemoryEventBus;
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events buffered per subscriber before it starts lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Maximum messages queued in one actor's mailbox.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Maximum queries queued for one actor.
pub const DEFAULT_QUERY_CAPACITY: usize = 64;
