//! Change detection between the stored and freshly scraped registries.

use similar::TextDiff;

use crate::storage::to_snapshot_text;
use crate::types::{ApiWatchResult, EndpointRegistry};

/// Context lines around each hunk of the unified diff.
const CONTEXT_LINES: usize = 3;

/// Label of the old side when no earlier archive revision exists.
const UNVERSIONED_LABEL: &str = "API.json";

/// A detected change, ready to be archived and reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Archive key of this change.
    pub key: String,
    /// Serialized existing snapshot.
    pub old_text: String,
    /// Serialized current snapshot.
    pub new_text: String,
    /// Unified diff from `old_text` to `new_text`.
    pub diff: String,
    pub from_label: String,
    pub to_label: String,
}

impl ChangeRecord {
    /// File name used when the diff is attached to a notification.
    pub fn diff_file_name(&self) -> String {
        format!("API_{}.diff", self.key)
    }
}

/// Whether two registries differ anywhere. All-or-nothing.
pub fn registries_differ(existing: &EndpointRegistry, current: &EndpointRegistry) -> bool {
    existing != current
}

/// Diff label for an archive key, or the unversioned label for `None`.
pub fn revision_label(key: Option<&str>) -> String {
    match key {
        Some(key) => format!("API_{key}.json"),
        None => UNVERSIONED_LABEL.to_string(),
    }
}

/// Line-oriented unified diff between two texts.
pub fn unified_diff(old: &str, new: &str, from_label: &str, to_label: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(CONTEXT_LINES)
        .header(from_label, to_label);
    unified.to_string()
}

/// Compare registries and build a [`ChangeRecord`] when they differ.
///
/// `previous_key` is the most recent archive revision before this one,
/// if any.
pub fn detect_change(
    existing: &EndpointRegistry,
    current: &EndpointRegistry,
    previous_key: Option<&str>,
    current_key: &str,
) -> ApiWatchResult<Option<ChangeRecord>> {
    if !registries_differ(existing, current) {
        return Ok(None);
    }

    let old_text = to_snapshot_text(existing)?;
    let new_text = to_snapshot_text(current)?;
    let from_label = revision_label(previous_key);
    let to_label = revision_label(Some(current_key));
    let diff = unified_diff(&old_text, &new_text, &from_label, &to_label);

    tracing::debug!(
        "Registries differ ({} -> {} endpoints)",
        existing.len(),
        current.len()
    );

    Ok(Some(ChangeRecord {
        key: current_key.to_string(),
        old_text,
        new_text,
        diff,
        from_label,
        to_label,
    }))
}
