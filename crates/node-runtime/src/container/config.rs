//! # Node Configuration
//!
//! Defaults, environment overrides and validation for the registry node.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `AR_MAILBOX_CAPACITY` | `bus.mailbox_capacity` | 1024 |
//! | `AR_EVENT_CAPACITY` | `bus.event_capacity` | 1000 |
//! | `AR_PENDING_FEEDBACK_TTL_SECS` | `reputation.pending_ttl_secs` | 3600 |
//! | `AR_VALIDATION_TTL_SECS` | `validation.ttl_secs` | 86400 |
//! | `AR_DATA_DIR` | `storage.data_dir` | unset (no persistence) |

use ar_02_reputation_registry::DEFAULT_PENDING_FEEDBACK_TTL_SECS;
use ar_03_validation_registry::DEFAULT_VALIDATION_TTL_SECS;
use shared_bus::{DEFAULT_EVENT_CAPACITY, DEFAULT_MAILBOX_CAPACITY};
use shared_types::Address;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Actor transport configuration.
    pub bus: BusConfig,
    /// Where each registry is deployed.
    pub addresses: ActorAddresses,
    /// Reputation registry configuration.
    pub reputation: ReputationConfig,
    /// Validation registry configuration.
    pub validation: ValidationConfig,
    /// Snapshot storage configuration.
    pub storage: StorageConfig,
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (variable name → value).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "AR_MAILBOX_CAPACITY")? {
            self.bus.mailbox_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, "AR_EVENT_CAPACITY")? {
            self.bus.event_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, "AR_PENDING_FEEDBACK_TTL_SECS")? {
            self.reputation.pending_ttl_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "AR_VALIDATION_TTL_SECS")? {
            self.validation.ttl_secs = v;
        }
        if let Some(dir) = lookup("AR_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Reject configurations the registries cannot be created with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.mailbox_capacity == 0 {
            return Err(ConfigError::ZeroMailboxCapacity);
        }
        if self.reputation.pending_ttl_secs == 0 {
            return Err(ConfigError::ZeroPendingFeedbackTtl);
        }
        if self.validation.ttl_secs == 0 {
            return Err(ConfigError::ZeroValidationTtl);
        }
        self.addresses.validate()
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var: name, value: raw }),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("mailbox capacity must be positive")]
    ZeroMailboxCapacity,

    #[error("pending feedback TTL must be positive")]
    ZeroPendingFeedbackTtl,

    #[error("validation TTL must be positive")]
    ZeroValidationTtl,

    /// A registry would be deployed at the zero address.
    #[error("{actor} registry address must not be zero")]
    ZeroActorAddress { actor: &'static str },

    /// Two registries would share one mailbox.
    #[error("{first} and {second} registries share address {address}")]
    DuplicateActorAddress {
        first: &'static str,
        second: &'static str,
        address: Address,
    },
}

/// Actor transport configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Messages queued per actor before new ones are dropped.
    pub mailbox_capacity: usize,
    /// Events buffered per subscriber before it lags.
    pub event_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Deployment addresses of the three registries.
#[derive(Debug, Clone)]
pub struct ActorAddresses {
    pub identity: Address,
    pub reputation: Address,
    pub validation: Address,
}

impl ActorAddresses {
    fn named(&self) -> [(&'static str, Address); 3] {
        [
            ("identity", self.identity),
            ("reputation", self.reputation),
            ("validation", self.validation),
        ]
    }

    /// Every registry needs its own non-zero address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = self.named();
        for (i, &(actor, address)) in named.iter().enumerate() {
            if address.is_zero() {
                return Err(ConfigError::ZeroActorAddress { actor });
            }
            if let Some(&(first, _)) = named[..i].iter().find(|(_, other)| *other == address) {
                return Err(ConfigError::DuplicateActorAddress {
                    first,
                    second: actor,
                    address,
                });
            }
        }
        Ok(())
    }
}

impl Default for ActorAddresses {
    fn default() -> Self {
        Self {
            identity: Address::from_label("identity-registry"),
            reputation: Address::from_label("reputation-registry"),
            validation: Address::from_label("validation-registry"),
        }
    }
}

/// Reputation registry configuration.
#[derive(Debug, Clone)]
pub struct ReputationConfig {
    /// Age after which a pending feedback request may be collected.
    pub pending_ttl_secs: u64,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            pending_ttl_secs: DEFAULT_PENDING_FEEDBACK_TTL_SECS,
        }
    }
}

/// Validation registry configuration.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Response window, also the pending-confirmation TTL.
    pub ttl_secs: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_VALIDATION_TTL_SECS,
        }
    }
}

/// Snapshot storage configuration.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Directory for per-actor JSON snapshots. `None` disables persistence.
    pub data_dir: Option<PathBuf>,
}
