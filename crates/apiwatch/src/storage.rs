//! Snapshot text format: pretty JSON with 4-space indentation and sorted keys.

use std::path::Path;

use serde::Serialize;

use crate::types::{ApiWatchError, ApiWatchResult, EndpointRegistry};

/// Indentation used for every serialized snapshot.
const INDENT: &[u8] = b"    ";

/// Serialize a registry to its durable text form, newline-terminated.
pub fn to_snapshot_text(registry: &EndpointRegistry) -> ApiWatchResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    registry.serialize(&mut ser)?;
    buf.push(b'\n');

    String::from_utf8(buf)
        .map_err(|e| ApiWatchError::Snapshot(format!("Serialized snapshot is not UTF-8: {e}")))
}

/// Parse a snapshot produced by [`to_snapshot_text`] (or any JSON object of
/// the same shape).
pub fn parse_snapshot(text: &str) -> ApiWatchResult<EndpointRegistry> {
    if text.trim().is_empty() {
        return Ok(EndpointRegistry::new());
    }
    serde_json::from_str(text)
        .map_err(|e| ApiWatchError::Snapshot(format!("Invalid snapshot: {e}")))
}

/// Read a snapshot file.
pub fn read_snapshot(path: &Path) -> ApiWatchResult<EndpointRegistry> {
    let text = std::fs::read_to_string(path)?;
    parse_snapshot(&text)
        .map_err(|e| ApiWatchError::Snapshot(format!("{}: {e}", path.display())))
}

/// Write a snapshot file, creating parent directories and overwriting any
/// existing content.
pub fn write_snapshot(registry: &EndpointRegistry, path: &Path) -> ApiWatchResult<()> {
    let text = to_snapshot_text(registry)?;
    write_text(&text, path)
}

pub(crate) fn write_text(text: &str, path: &Path) -> ApiWatchResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}
