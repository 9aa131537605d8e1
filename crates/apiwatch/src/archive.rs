//! Timestamped archive of before/after snapshots.
//!
//! Layout:
//! ```text
//! <root>/
//!   2026-01-02_03-04-05/
//!     oldEndpoints.json
//!     newEndpoints.json
//! ```
//! Directories are never pruned or merged.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::diff::ChangeRecord;
use crate::storage::{write_snapshot, write_text};
use crate::types::{ApiWatchError, ApiWatchResult, EndpointRegistry};

/// Sortable date-time format of archive keys.
pub const ARCHIVE_KEY_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub const OLD_SNAPSHOT_FILE: &str = "oldEndpoints.json";
pub const NEW_SNAPSHOT_FILE: &str = "newEndpoints.json";

/// Format a timestamp as an archive key.
pub fn archive_key(time: &NaiveDateTime) -> String {
    time.format(ARCHIVE_KEY_FORMAT).to_string()
}

fn is_archive_key(name: &str) -> bool {
    NaiveDateTime::parse_from_str(name, ARCHIVE_KEY_FORMAT).is_ok()
}

/// Directory of archived changes.
#[derive(Debug, Clone)]
pub struct ChangeArchive {
    root: PathBuf,
}

impl ChangeArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existing archive keys, oldest first. Empty when the root is missing.
    pub fn revisions(&self) -> ApiWatchResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_archive_key(name) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// The most recent archive key, if any.
    pub fn latest_revision(&self) -> ApiWatchResult<Option<String>> {
        Ok(self.revisions()?.pop())
    }

    /// Create the directory for `change.key` and write both snapshots.
    ///
    /// Fails if a directory with that key already exists.
    pub fn record(&self, change: &ChangeRecord) -> ApiWatchResult<PathBuf> {
        std::fs::create_dir_all(&self.root)?;

        let dir = self.root.join(&change.key);
        std::fs::create_dir(&dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ApiWatchError::Io(std::io::Error::new(
                    e.kind(),
                    format!("archive revision {} already exists", change.key),
                ))
            } else {
                ApiWatchError::Io(e)
            }
        })?;

        write_revision(&dir, change)?;

        tracing::info!("Archived change {} in {}", change.key, dir.display());
        Ok(dir)
    }
}

/// Write both snapshots into `dir`, removing `dir` if either write fails.
fn write_revision(dir: &Path, change: &ChangeRecord) -> ApiWatchResult<()> {
    let written = write_text(&change.old_text, &dir.join(OLD_SNAPSHOT_FILE))
        .and_then(|()| write_text(&change.new_text, &dir.join(NEW_SNAPSHOT_FILE)));

    if written.is_err() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            tracing::warn!("Failed to remove partial revision {}: {e}", dir.display());
        }
    }
    written
}

/// Overwrite the latest-output file with `registry`.
pub fn write_latest(path: &Path, registry: &EndpointRegistry) -> ApiWatchResult<()> {
    write_snapshot(registry, path)?;
    tracing::debug!("Wrote {} endpoints to {}", registry.len(), path.display());
    Ok(())
}
