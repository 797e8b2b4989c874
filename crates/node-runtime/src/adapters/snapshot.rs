//! # Snapshot Store
//!
//! Per-actor JSON snapshots in a data directory:
//!
//! ```text
//! <data_dir>/identity.json
//! <data_dir>/reputation.json
//! <data_dir>/validation.json
//! ```
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use anyhow::{Context, Result};
use ar_01_identity_registry::AgentTable;
use ar_02_reputation_registry::FeedbackLedger;
use ar_03_validation_registry::ValidationBook;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const IDENTITY_FILE: &str = "identity.json";
const REPUTATION_FILE: &str = "reputation.json";
const VALIDATION_FILE: &str = "validation.json";

/// Final or restored state of all three registries.
///
/// A `None` entry means no snapshot exists for that actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub identity: Option<AgentTable>,
    pub reputation: Option<FeedbackLedger>,
    pub validation: Option<ValidationBook>,
}

impl Snapshot {
    /// True if no actor has a snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identity.is_none() && self.reputation.is_none() && self.validation.is_none()
    }
}

/// Reads and writes snapshots in one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load whatever snapshots exist.
    pub fn load(&self) -> Result<Snapshot> {
        let snapshot = Snapshot {
            identity: self.read(IDENTITY_FILE)?,
            reputation: self.read(REPUTATION_FILE)?,
            validation: self.read(VALIDATION_FILE)?,
        };
        if snapshot.is_empty() {
            debug!(dir = %self.dir.display(), "No snapshots found");
        } else {
            info!(dir = %self.dir.display(), "Snapshots loaded");
        }
        Ok(snapshot)
    }

    /// Write every present entry of `snapshot`.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data dir {}", self.dir.display()))?;

        if let Some(table) = &snapshot.identity {
            self.write(IDENTITY_FILE, table)?;
        }
        if let Some(ledger) = &snapshot.reputation {
            self.write(REPUTATION_FILE, ledger)?;
        }
        if let Some(book) = &snapshot.validation {
            self.write(VALIDATION_FILE, book)?;
        }
        info!(dir = %self.dir.display(), "Snapshots saved");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt snapshot {}", path.display()))?;
        Ok(Some(value))
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{file}.tmp"));
        let bytes = serde_json::to_vec_pretty(value)
            .with_context(|| format!("Failed to encode {file}"))?;
        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;
        debug!(path = %path.display(), "Snapshot written");
        Ok(())
    }
}
