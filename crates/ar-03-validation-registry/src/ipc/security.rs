//! Sender authorization for validation registry messages.
//!
//! # Authorization Rules
//!
//! | Message Type | Authorized Sender(s) |
//! |--------------|---------------------|
//! | `RequestValidation` | Any |
//! | `VerifyAgentResponse` | Configured identity registry ONLY |
//! | `RespondValidation` | The validation's designated validator ONLY |
//! | `CleanupExpiredValidation` | Any |
//! | `CleanupPendingValidation` | Any |

use shared_types::{Address, RegistryError, RegistryResult};

/// Authorization rules for IPC messages.
#[derive(Debug, Clone)]
pub struct AuthorizationRules;

impl AuthorizationRules {
    /// Validates that a verification callback comes from the bound identity
    /// registry.
    pub fn validate_identity_callback(
        sender: Address,
        identity_registry: Address,
    ) -> RegistryResult<()> {
        Self::require(sender, identity_registry)
    }

    /// Validates that `sender` is the validator fixed at request time.
    pub fn validate_designated_validator(
        sender: Address,
        validator: Address,
    ) -> RegistryResult<()> {
        Self::require(sender, validator)
    }

    fn require(sender: Address, expected: Address) -> RegistryResult<()> {
        if sender != expected {
            return Err(RegistryError::Unauthorized { sender, expected });
        }
        Ok(())
    }
}
