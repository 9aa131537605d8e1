//! Gist store holding the last published snapshot and diff.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;

use crate::config::GistConfig;
use crate::fetch::HttpClient;
use crate::types::{WatchError, WatchResult};

/// Gist file holding the serialized registry.
pub const SNAPSHOT_FILE: &str = "API.json";

/// Gist file holding the latest unified diff.
pub const DIFF_FILE: &str = "changes.diff";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

/// Client for one gist.
#[derive(Clone)]
pub struct GistStore {
    http: HttpClient,
    config: GistConfig,
}

impl GistStore {
    pub fn new(http: HttpClient, config: GistConfig) -> Self {
        Self { http, config }
    }

    /// Whether a token is configured, which updates require.
    pub fn can_update(&self) -> bool {
        self.config.token.is_some()
    }

    /// Human-facing page listing the gist's revisions.
    pub fn revisions_url(&self) -> String {
        format!(
            "https://gist.github.com/{}/revisions?diff=split",
            self.config.id
        )
    }

    fn api_url(&self) -> String {
        format!(
            "{}/gists/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.id
        )
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .inner()
            .request(method, self.api_url())
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);

        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Content of the snapshot file, or `None` when the gist lacks it.
    pub async fn read_snapshot(&self) -> WatchResult<Option<String>> {
        let resp = self
            .request(reqwest::Method::GET)
            .send()
            .await
            .map_err(|e| WatchError::Remote(format!("reading gist {}: {e}", self.config.id)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::Remote(format!(
                "reading gist {}: HTTP {status}",
                self.config.id
            )));
        }

        let gist: GistResponse = resp
            .json()
            .await
            .map_err(|e| WatchError::Remote(format!("decoding gist {}: {e}", self.config.id)))?;

        let Some(file) = gist.files.get(SNAPSHOT_FILE) else {
            tracing::warn!("Gist {} has no {SNAPSHOT_FILE}", self.config.id);
            return Ok(None);
        };

        match (&file.content, file.truncated, &file.raw_url) {
            (_, true, Some(raw_url)) => {
                tracing::debug!("Gist file {SNAPSHOT_FILE} is truncated, fetching raw content");
                self.http.get_text(raw_url).await.map(Some)
            }
            (Some(content), _, _) => Ok(Some(content.clone())),
            _ => Ok(None),
        }
    }

    /// Replace the snapshot and diff files.
    pub async fn update(&self, snapshot: &str, diff: &str) -> WatchResult<()> {
        if !self.can_update() {
            return Err(WatchError::Config(format!(
                "updating gist {} requires a GitHub token",
                self.config.id
            )));
        }

        let body = json!({
            "files": {
                SNAPSHOT_FILE: { "content": snapshot },
                DIFF_FILE: { "content": diff },
            }
        });

        let resp = self
            .request(reqwest::Method::PATCH)
            .json(&body)
            .send()
            .await
            .map_err(|e| WatchError::Remote(format!("updating gist {}: {e}", self.config.id)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::Remote(format!(
                "updating gist {}: HTTP {status}",
                self.config.id
            )));
        }

        tracing::info!("Updated gist {}", self.config.id);
        Ok(())
    }
}
