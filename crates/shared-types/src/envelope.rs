//! # `AuthenticatedMessage` Envelope
//!
//! The universal wrapper for ALL actor-to-actor communication.
//!
//! ## Security Properties
//!
//! - **Versioning**: All messages include a `version` field for forward compatibility.
//! - **Envelope Authority**: The `sender` is the sole source of truth for identity.
//!   It is stamped by the bus from the sending outbox, never taken from a payload.
//! - **Traceability**: Every envelope carries a unique `message_id` for log correlation.

use crate::entities::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The message envelope delivered to an actor's mailbox.
///
/// # Invariants
///
/// - The `sender` is the ONLY source of truth for the caller's identity.
/// - Payloads MUST NOT duplicate the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedMessage<T> {
    /// Protocol version. Checked by the bus before delivery.
    pub version: u16,

    /// Unique id of this message (log correlation only).
    pub message_id: Uuid,

    /// Authenticated sender address.
    pub sender: Address,

    /// Intended recipient actor address.
    pub recipient: Address,

    /// Host timestamp (Unix seconds) at which the message was sent.
    pub timestamp: Timestamp,

    /// The actual message payload.
    pub payload: T,
}

impl<T> AuthenticatedMessage<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Wraps a payload for delivery.
    pub fn new(sender: Address, recipient: Address, timestamp: Timestamp, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            message_id: Uuid::new_v4(),
            sender,
            recipient,
            timestamp,
            payload,
        }
    }

    /// Returns true if this envelope's version can be processed.
    #[must_use]
    pub fn is_supported_version(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}
