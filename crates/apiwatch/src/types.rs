//! Core data types for endpoint registries and their errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One API operation as rendered on the documentation page.
///
/// Field order matches the sorted key order of the serialized snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Human-readable summary. `None` serializes as `null`.
    #[serde(default)]
    pub description: Option<String>,
    /// Parameter name → description. Omitted when the page has no rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
    /// Path template with variable segments rendered as `{name}`.
    #[serde(rename = "url")]
    pub url_template: String,
}

impl EndpointDescriptor {
    /// Create a descriptor with only a url template.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            description: None,
            params: None,
            url_template: url_template.into(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a single parameter, creating the params map if needed.
    pub fn with_param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), description.into());
        self
    }
}

/// Identifier → descriptor. Ordered so serialization is key-sorted.
pub type EndpointRegistry = BTreeMap<String, EndpointDescriptor>;

/// Errors that can occur in the apiwatch core.
#[derive(thiserror::Error, Debug)]
pub enum ApiWatchError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type ApiWatchResult<T> = Result<T, ApiWatchError>;
