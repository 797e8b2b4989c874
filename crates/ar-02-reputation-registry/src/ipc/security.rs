//! Sender authorization for reputation registry messages.
//!
//! # Authorization Rules
//!
//! | Message Type | Authorized Sender(s) |
//! |--------------|---------------------|
//! | `AcceptFeedback` | Any (the sender is the claimed server controller) |
//! | `VerifyAgentResponse` | Configured identity registry ONLY |
//! | `CleanupPendingFeedback` | Any |

use shared_types::{Address, RegistryError, RegistryResult};

/// Authorization rules for IPC messages.
#[derive(Debug, Clone)]
pub struct AuthorizationRules;

impl AuthorizationRules {
    /// Validates that a verification callback comes from the identity
    /// registry this actor was bound to at creation.
    pub fn validate_identity_callback(
        sender: Address,
        identity_registry: Address,
    ) -> RegistryResult<()> {
        if sender != identity_registry {
            return Err(RegistryError::Unauthorized {
                sender,
                expected: identity_registry,
            });
        }
        Ok(())
    }
}
