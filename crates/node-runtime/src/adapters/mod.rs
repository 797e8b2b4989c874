//! # Adapters
//!
//! Host-side implementations: snapshot persistence for actor state.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotStore};
