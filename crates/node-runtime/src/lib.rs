//! # Node Runtime Library
//!
//! Wires the identity, reputation and validation registries onto one actor
//! bus. The binary in `main.rs` is a thin shell around [`NodeRuntime`].
//!
//! ## Modules
//!
//! - `container/` - Configuration and the running registry container
//! - `adapters/` - Snapshot persistence
//! - `runtime` - Start-up, event logging and graceful shutdown

#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod container;
pub mod runtime;

pub use adapters::{Snapshot, SnapshotStore};
pub use container::{ConfigError, NodeConfig, RegistryContainer};
pub use runtime::NodeRuntime;
