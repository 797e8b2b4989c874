//! Sender authorization for identity registry messages.
//!
//! # Authorization Rules
//!
//! | Message Type | Authorized Sender(s) |
//! |--------------|---------------------|
//! | `RegisterAgent` | Any (the sender is the identity registered) |
//! | `UpdateAgentAddress` | Current owner of `agent_id` ONLY |
//! | `VerifyAgent` | Any (the reply goes back to the sender) |

use shared_types::{Address, RegistryError, RegistryResult};

/// Authorization rules for IPC messages.
#[derive(Debug, Clone)]
pub struct AuthorizationRules;

impl AuthorizationRules {
    /// Validates that `sender` may move an agent currently owned by `owner`.
    pub fn validate_update_address(sender: Address, owner: Address) -> RegistryResult<()> {
        if sender != owner {
            return Err(RegistryError::Unauthorized {
                sender,
                expected: owner,
            });
        }
        Ok(())
    }
}
