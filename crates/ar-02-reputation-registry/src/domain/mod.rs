//! Domain layer: pure state, no I/O.

pub mod ledger;

pub use ledger::{FeedbackLedger, PendingFeedback, Resolution};

/// Default age after which an unresolved feedback request may be collected.
pub const DEFAULT_PENDING_FEEDBACK_TTL_SECS: u64 = 3600;
