//! Ports for the identity registry.

pub mod inbound;

pub use inbound::IdentityRegistryApi;
