//! HTTP client wrapping reqwest.
//!
//! One client is built per process and shared by the page fetch, the gist
//! store and the webhook notifier. Every request is bounded by the
//! configured timeout; failures are not retried.

use std::time::Duration;

use crate::config::MarkupSource;
use crate::types::{WatchError, WatchResult};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("API diff checker (apiwatch/", env!("CARGO_PKG_VERSION"), ")");

/// HTTP client for the watcher.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> WatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WatchError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// The underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET `url` and return the body. Non-success statuses are errors.
    pub async fn get_text(&self, url: &str) -> WatchResult<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WatchError::Fetch(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::Fetch(format!("GET {url}: HTTP {status}")));
        }

        resp.text()
            .await
            .map_err(|e| WatchError::Fetch(format!("GET {url}: reading body: {e}")))
    }

    /// Load documentation markup from the configured source.
    pub async fn load_markup(&self, source: &MarkupSource) -> WatchResult<String> {
        match source {
            MarkupSource::Url(url) => {
                tracing::info!("Fetching {url}");
                self.get_text(url).await
            }
            MarkupSource::File(path) => {
                tracing::info!("Reading markup from {}", path.display());
                std::fs::read_to_string(path)
                    .map_err(|e| WatchError::Fetch(format!("{}: {e}", path.display())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_user_agent_is_descriptive() {
        assert!(USER_AGENT.starts_with("API diff checker (apiwatch/"));
    }

    #[tokio::test]
    async fn test_get_text_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dev/api"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let body = client
            .get_text(&format!("{}/dev/api", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let err = client.get_text(&server.uri()).await.unwrap_err();
        assert!(matches!(err, WatchError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_millis(200)).unwrap();
        let err = client.get_text(&server.uri()).await.unwrap_err();
        assert!(matches!(err, WatchError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_load_markup_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<div class=\"endpoint\"></div>").unwrap();

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let markup = client
            .load_markup(&MarkupSource::File(file))
            .await
            .unwrap();
        assert!(markup.contains("endpoint"));
    }
}
