//! One check-compare-persist run, and the loop that repeats it.

use std::time::Duration;

use chrono::NaiveDateTime;

use apiwatch::{
    archive_key, detect_change, extract_endpoints, parse_snapshot, read_snapshot, write_latest,
    ChangeArchive, ChangeRecord, EndpointRegistry,
};

use crate::config::RunConfig;
use crate::fetch::HttpClient;
use crate::remote::{GistStore, WebhookNotifier};
use crate::report;
use crate::types::{WatchError, WatchResult};

/// Result of one run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The registry changed; the change was archived.
    Changed(ChangeRecord),
    Unchanged,
    /// The run aborted before completing.
    Failed(WatchError),
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }
}

/// Owns the collaborators for repeated runs.
pub struct Runner {
    config: RunConfig,
    http: HttpClient,
    archive: ChangeArchive,
    gist: Option<GistStore>,
    notifier: Option<WebhookNotifier>,
}

impl Runner {
    /// Build the gist store and notifier configured in `config`, sharing `http`.
    pub fn new(config: RunConfig, http: HttpClient) -> Self {
        let gist = config
            .gist
            .clone()
            .map(|gist| GistStore::new(http.clone(), gist));

        let notifier = config.webhook.clone().map(|webhook| {
            let notifier = WebhookNotifier::new(http.clone(), webhook);
            match &gist {
                Some(gist) => notifier.with_gist_link(gist.revisions_url()),
                None => notifier,
            }
        });

        Self {
            archive: ChangeArchive::new(&config.changes_dir),
            config,
            http,
            gist,
            notifier,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The stored registry to compare against.
    ///
    /// Tries the existing file, then the gist, then the latest-output
    /// file, and falls back to an empty registry.
    pub async fn load_existing(&self) -> WatchResult<EndpointRegistry> {
        if let Some(existing) = self.config.existing.as_deref() {
            if existing.exists() {
                tracing::debug!("Existing snapshot: {}", existing.display());
                return Ok(read_snapshot(existing)?);
            }
            tracing::warn!("Existing snapshot {} not found", existing.display());
        }

        if let Some(gist) = &self.gist {
            if let Some(text) = gist.read_snapshot().await? {
                tracing::debug!("Existing snapshot: gist");
                return Ok(parse_snapshot(&text)?);
            }
        }

        if self.config.output.exists() {
            tracing::debug!("Existing snapshot: {}", self.config.output.display());
            return Ok(read_snapshot(&self.config.output)?);
        }

        tracing::info!("No existing snapshot, comparing against an empty registry");
        Ok(EndpointRegistry::new())
    }

    /// Fetch, extract, compare and persist, keying any change by `now`.
    ///
    /// Once a change is archived it is reported even if the gist update
    /// fails; the stale gist makes the next run detect it again.
    pub async fn check_at(&self, now: NaiveDateTime) -> WatchResult<Option<ChangeRecord>> {
        let markup = self.http.load_markup(&self.config.source).await?;
        let current = extract_endpoints(&markup)?;
        tracing::info!("Extracted {} endpoints", current.len());

        let change = if self.config.check {
            let existing = self.load_existing().await?;
            let previous = self.archive.latest_revision()?;
            let change = detect_change(&existing, &current, previous.as_deref(), &archive_key(&now))?;
            if let Some(change) = &change {
                self.archive.record(change)?;
                if let Err(e) = self.publish(change).await {
                    tracing::error!("Gist update failed: {e}");
                }
            }
            change
        } else {
            None
        };

        write_latest(&self.config.output, &current)?;

        if self.config.print_report {
            if let Some(reference) = &self.config.reference {
                report::print_report(&current, reference)?;
            }
        }

        Ok(change)
    }

    async fn publish(&self, change: &ChangeRecord) -> WatchResult<()> {
        let Some(gist) = &self.gist else {
            return Ok(());
        };
        if !gist.can_update() {
            tracing::warn!("No GitHub token configured, skipping gist update");
            return Ok(());
        }
        gist.update(&change.new_text, &change.diff).await
    }

    /// Run once and classify the result. Notifies only on change.
    pub async fn run_once(&self) -> RunOutcome {
        self.run_once_at(chrono::Local::now().naive_local()).await
    }

    pub async fn run_once_at(&self, now: NaiveDateTime) -> RunOutcome {
        match self.check_at(now).await {
            Ok(Some(change)) => {
                tracing::info!("Changes detected ({})", change.key);
                if let Some(notifier) = &self.notifier {
                    if let Err(e) = notifier.notify(&change).await {
                        tracing::error!("{e}");
                    }
                }
                RunOutcome::Changed(change)
            }
            Ok(None) => {
                tracing::info!("No changes");
                RunOutcome::Unchanged
            }
            Err(e) => {
                tracing::error!("Run failed: {e}");
                RunOutcome::Failed(e)
            }
        }
    }

    /// Run forever, sleeping `interval` after each run.
    pub async fn watch(&self, interval: Duration) {
        tracing::info!("Checking every {}s", interval.as_secs());
        loop {
            self.run_once().await;
            tokio::time::sleep(interval).await;
        }
    }
}
