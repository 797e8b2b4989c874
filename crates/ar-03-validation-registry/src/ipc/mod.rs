//! IPC layer: message dispatch and sender authorization.

pub mod handler;
pub mod security;

pub use handler::ValidationIpcHandler;
pub use security::AuthorizationRules;
