//! Ports for the reputation registry.

pub mod inbound;

pub use inbound::ReputationRegistryApi;
