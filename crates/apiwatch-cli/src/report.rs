//! Normalization mismatch report.

use std::path::Path;

use serde::Deserialize;

use apiwatch::{EndpointRegistry, Mismatch, Normalizer};

use crate::types::{WatchError, WatchResult};

/// Reference path set as stored on disk.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReferenceFile {
    Named(std::collections::BTreeMap<String, String>),
    List(Vec<String>),
}

/// Load the reference path set from a JSON object (`name → path`) or array.
pub fn load_reference(path: &Path) -> WatchResult<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| WatchError::Config(format!("reading reference {}: {e}", path.display())))?;
    parse_reference(&text)
        .map_err(|e| WatchError::Config(format!("parsing reference {}: {e}", path.display())))
}

fn parse_reference(text: &str) -> serde_json::Result<Vec<String>> {
    Ok(match serde_json::from_str(text)? {
        ReferenceFile::Named(map) => map.into_values().collect(),
        ReferenceFile::List(list) => list,
    })
}

/// Mismatch rows of `registry` against `reference`, with the default rules.
pub fn mismatch_rows(registry: &EndpointRegistry, reference: &[String]) -> Vec<Mismatch> {
    Normalizer::default().mismatches(registry, reference.iter().map(String::as_str))
}

/// Render rows as a two-column plain-text table.
pub fn render_table(rows: &[Mismatch]) -> String {
    const HEADERS: (&str, &str) = ("Endpoint", "Normalized URL");

    let width = rows
        .iter()
        .map(|row| row.identifier.chars().count())
        .chain(std::iter::once(HEADERS.0.len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<width$}  {}\n", HEADERS.0, HEADERS.1);
    out.push_str(&format!("{}  {}\n", "-".repeat(width), "-".repeat(HEADERS.1.len())));
    for row in rows {
        out.push_str(&format!("{:<width$}  {}\n", row.identifier, row.url));
    }
    out.push_str(&format!("\n{} endpoint(s) missing from reference\n", rows.len()));
    out
}

/// Load the reference set and print the mismatch table to stdout.
pub fn print_report(registry: &EndpointRegistry, reference_path: &Path) -> WatchResult<usize> {
    let reference = load_reference(reference_path)?;
    let rows = mismatch_rows(registry, &reference);
    print!("{}", render_table(&rows));
    Ok(rows.len())
}
