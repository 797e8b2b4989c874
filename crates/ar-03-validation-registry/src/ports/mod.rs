//! Ports for the validation registry.

pub mod inbound;

pub use inbound::ValidationRegistryApi;
