//! # ar-02-reputation-registry
//!
//! Reputation Registry: authorizes feedback by checking, through the
//! identity registry, that the caller controls the server agent it names.
//!
//! ## Architecture
//!
//! ```text
//! caller ──AcceptFeedback──→ Reputation (2) ──VerifyAgent──→ Identity (1)
//!                                  ↑                              │
//!                                  └────VerifyAgentResponse───────┘
//! ```
//!
//! ## Security Model
//!
//! | Message | Authorized Sender |
//! |---------|-------------------|
//! | AcceptFeedback | Any |
//! | VerifyAgentResponse | Identity Registry (bound at creation) |
//! | CleanupPendingFeedback | Any, after the pending TTL |
//!
//! ## Liveness
//!
//! A `VerifyAgent` that is never delivered leaves a pending entry behind.
//! Anyone may collect it with `CleanupPendingFeedback` once it is older than
//! the pending TTL.

pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

pub use domain::{FeedbackLedger, PendingFeedback, DEFAULT_PENDING_FEEDBACK_TTL_SECS};
pub use ipc::ReputationIpcHandler;
pub use ports::ReputationRegistryApi;
pub use service::{spawn, ReputationQuery, ReputationRegistryHandle};
