//! # Core Domain Entities
//!
//! Identifiers shared by every registry actor.
//!
//! - **Addresses**: `Address` identifies both actors and end-user accounts.
//! - **Keys**: `AgentId`, `QueryId`, `DataHash`
//! - **Time**: `Timestamp` (Unix seconds)

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dense, monotonically increasing agent identifier. The first agent is 1.
pub type AgentId = u64;

/// Correlation id tying an outbound `VerifyAgent` to its callback.
pub type QueryId = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Validation score. Valid range is `0..=MAX_SCORE`.
pub type Score = u8;

/// Highest score a validator may submit.
pub const MAX_SCORE: Score = 100;

/// Error parsing a hex-encoded 32-byte identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdError {
    /// The string was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    /// The decoded value was not exactly 32 bytes.
    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

fn decode_32(s: &str) -> Result<[u8; 32], ParseIdError> {
    let raw = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(raw).map_err(|e| ParseIdError::InvalidHex(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseIdError::InvalidLength(len))
}

/// Implements hex `Display`/`FromStr` and string serde for a 32-byte newtype.
///
/// Both types are used as map keys in persisted snapshots, and JSON object
/// keys must be strings.
macro_rules! hex_id {
    ($name:ident) => {
        impl $name {
            /// Raw bytes.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Abbreviated form for log lines.
            #[must_use]
            pub fn short(&self) -> String {
                format!("0x{}..", hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short())
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_32(s).map(Self)
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

/// A 32-byte account or actor address.
///
/// Actors and end users share one address space: an actor checks a callback's
/// authenticity by comparing the envelope sender against a stored `Address`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 32]);

hex_id!(Address);

impl Address {
    /// The zero address. Never a valid validator address.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Derives a stable address from a human-readable label (SHA-256).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self(Sha256::digest(label.as_bytes()).into())
    }

    /// Returns true for the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

/// Key of a validation request: a 256-bit digest of the work being validated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DataHash(pub [u8; 32]);

hex_id!(DataHash);

impl DataHash {
    /// Hashes arbitrary content into a validation key.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }
}

impl From<u64> for DataHash {
    /// Big-endian embedding of a small integer key.
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}
