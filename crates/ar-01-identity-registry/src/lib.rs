//! # ar-01-identity-registry
//!
//! Identity Registry: owns the bijection between agent ids and their
//! controlling addresses, and answers verification requests from the other
//! registries.
//!
//! ## Architecture
//!
//! ```text
//! Reputation (2) ──VerifyAgent──→ Identity (1) ──VerifyAgentResponse──→ Reputation (2)
//! Validation (3) ──VerifyAgent──→ Identity (1) ──VerifyAgentResponse──→ Validation (3)
//! ```
//!
//! The identity registry depends on nothing. It never initiates traffic;
//! its only outbound message is the reply to `VerifyAgent`.
//!
//! ## Oracle Contract
//!
//! For an unknown agent id the reply carries `verified = false` and the
//! registry's own address. Consumers must branch on `verified`.

pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

pub use domain::AgentTable;
pub use ipc::IdentityIpcHandler;
pub use ports::IdentityRegistryApi;
pub use service::{spawn, IdentityQuery, IdentityRegistryHandle};
