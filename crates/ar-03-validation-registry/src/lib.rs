//! # ar-03-validation-registry
//!
//! Validation Registry: time-bounded validation slots, each answerable once
//! by a single designated validator.
//!
//! ## Architecture
//!
//! ```text
//! caller ──RequestValidation──→ Validation (3) ──VerifyAgent──→ Identity (1)
//!                                     ↑                              │
//!                                     └────VerifyAgentResponse───────┘
//! validator ──RespondValidation──→ Validation (3)
//! anyone ──Cleanup*──→ Validation (3)
//! ```
//!
//! ## Security Model
//!
//! | Message | Authorized Sender |
//! |---------|-------------------|
//! | RequestValidation | Any |
//! | VerifyAgentResponse | Identity Registry (bound at creation) |
//! | RespondValidation | Designated validator |
//! | CleanupExpiredValidation | Any, after the TTL, unresponded only |
//! | CleanupPendingValidation | Any, after the TTL |
//!
//! ## TTL
//!
//! A committed validation accepts a response while
//! `now <= requested_at + ttl` and becomes collectible once
//! `now > requested_at + ttl`. Responded validations are permanent.

pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

pub use domain::{
    Confirmation, PendingValidation, Validation, ValidationBook, DEFAULT_VALIDATION_TTL_SECS,
};
pub use ipc::ValidationIpcHandler;
pub use ports::ValidationRegistryApi;
pub use service::{spawn, ValidationQuery, ValidationRegistryHandle};
