//! IPC layer: message dispatch and sender authorization.

pub mod handler;
pub mod security;

pub use handler::IdentityIpcHandler;
pub use security::AuthorizationRules;
