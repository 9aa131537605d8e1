//! Chat webhook notifier.
//!
//! Posts a multipart message: a `payload_json` part with the embed and the
//! unified diff attached as `API_<key>.diff`.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use apiwatch::ChangeRecord;

use crate::config::WebhookConfig;
use crate::fetch::HttpClient;
use crate::types::{WatchError, WatchResult};

pub const EMBED_TITLE: &str = "Changes Detected";

/// Sends change notifications to one webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: HttpClient,
    config: WebhookConfig,
    gist_link: Option<String>,
}

impl WebhookNotifier {
    pub fn new(http: HttpClient, config: WebhookConfig) -> Self {
        Self {
            http,
            config,
            gist_link: None,
        }
    }

    /// Link the notification to the gist revision history.
    pub fn with_gist_link(mut self, link: impl Into<String>) -> Self {
        self.gist_link = Some(link.into());
        self
    }

    fn payload(&self, change: &ChangeRecord) -> Value {
        let mut embed = json!({
            "title": EMBED_TITLE,
            "description": change.key,
        });
        if let Some(link) = &self.gist_link {
            embed["fields"] = json!([{ "name": "Gist", "value": format!("[Revisions]({link})") }]);
        }

        let mut payload = json!({
            "username": self.config.username,
            "embeds": [embed],
        });
        if let Some(mention) = &self.config.mention {
            payload["content"] = json!(mention);
        }
        payload
    }

    /// Announce `change` with its diff attached.
    pub async fn notify(&self, change: &ChangeRecord) -> WatchResult<()> {
        let attachment = Part::bytes(change.diff.clone().into_bytes())
            .file_name(change.diff_file_name())
            .mime_str("text/plain")
            .map_err(|e| WatchError::Notify(format!("building attachment: {e}")))?;

        let form = Form::new()
            .text("payload_json", self.payload(change).to_string())
            .part("files[0]", attachment);

        let resp = self
            .http
            .inner()
            .post(&self.config.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WatchError::Notify(format!("posting webhook: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::Notify(format!("webhook returned HTTP {status}")));
        }

        tracing::info!("Sent change notification for {}", change.key);
        Ok(())
    }
}
