//! # Shared Types Crate
//!
//! This crate contains the identifiers, the message payloads and the
//! `AuthenticatedMessage<T>` envelope shared by the three registry actors.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-actor types are defined here.
//! - **Envelope Integrity**: The `AuthenticatedMessage<T>` is the sole wrapper
//!   for all actor-to-actor communication.
//! - **No Redundant Identity**: Payloads MUST NOT contain a caller field;
//!   the envelope's `sender` is authoritative.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;
pub mod time;

pub use entities::*;
pub use envelope::AuthenticatedMessage;
pub use errors::*;
pub use ipc::*;
pub use time::*;
