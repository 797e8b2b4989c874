//! # Registry Container
//!
//! Configuration plus the container holding the running registry actors.

pub mod config;
pub mod registries;

pub use config::{
    ActorAddresses, BusConfig, ConfigError, NodeConfig, ReputationConfig, StorageConfig,
    ValidationConfig,
};
pub use registries::RegistryContainer;
