//! Domain layer: pure state, no I/O.

pub mod book;

pub use book::{Confirmation, PendingValidation, Validation, ValidationBook};

/// Default validation window.
pub const DEFAULT_VALIDATION_TTL_SECS: u64 = 86_400;
