//! Configuration loading and resolution.
//!
//! Every setting resolves as: command-line flag, then `APIWATCH_*`
//! environment variable, then built-in default.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::types::{WatchError, WatchResult};

pub const DEFAULT_SOURCE_URL: &str = "https://www.reddit.com/dev/api";
pub const DEFAULT_OUTPUT: &str = "endpoints.json";
pub const DEFAULT_CHANGES_DIR: &str = "changes";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INTERVAL_SECS: u64 = 43230;
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_WEBHOOK_USERNAME: &str = "API Changes";

pub const ENV_URL: &str = "APIWATCH_URL";
pub const ENV_GIST_ID: &str = "APIWATCH_GIST_ID";
pub const ENV_GITHUB_TOKEN: &str = "APIWATCH_GITHUB_TOKEN";
pub const ENV_GITHUB_API: &str = "APIWATCH_GITHUB_API";
pub const ENV_WEBHOOK_URL: &str = "APIWATCH_WEBHOOK_URL";
pub const ENV_MENTION: &str = "APIWATCH_MENTION";

/// Where the documentation markup comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupSource {
    Url(String),
    File(PathBuf),
}

/// Flags selecting the markup source.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Documentation page to scrape. Also reads APIWATCH_URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Read markup from a local HTML file instead of fetching it.
    #[arg(long, conflicts_with = "url")]
    pub html: Option<PathBuf>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl SourceArgs {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> MarkupSource {
        self.resolve_with(&process_env)
    }

    pub fn resolve_with(&self, env: &impl Fn(&str) -> Option<String>) -> MarkupSource {
        match &self.html {
            Some(path) => MarkupSource::File(path.clone()),
            None => MarkupSource::Url(
                self.url
                    .clone()
                    .or_else(|| env(ENV_URL))
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Flags shared by `check` and `watch`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// File to write the current endpoints to.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// File holding the previously stored endpoints. Falls back to the gist, then the output file.
    #[arg(short, long)]
    pub existing: Option<PathBuf>,

    /// Skip change detection; only rewrite the output file.
    #[arg(long)]
    pub no_check: bool,

    /// Print endpoints missing from the reference path set.
    #[arg(short, long, requires = "reference")]
    pub print: bool,

    /// JSON file with the reference path set (object of name → path, or array).
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Directory to archive changes in.
    #[arg(short = 'd', long, default_value = DEFAULT_CHANGES_DIR)]
    pub changes_dir: PathBuf,

    /// Gist mirroring the endpoints and latest diff. Also reads APIWATCH_GIST_ID.
    #[arg(long)]
    pub gist: Option<String>,

    /// Webhook notified when a change is detected. Also reads APIWATCH_WEBHOOK_URL.
    #[arg(long)]
    pub webhook: Option<String>,

    /// Text prepended to the notification, e.g. a user mention. Also reads APIWATCH_MENTION.
    #[arg(long)]
    pub mention: Option<String>,
}

/// Gist store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistConfig {
    pub id: String,
    /// Required for updates; public gists can be read without it.
    pub token: Option<String>,
    pub api_base: String,
}

/// Webhook notifier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
    pub mention: Option<String>,
    pub username: String,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: MarkupSource,
    pub timeout: Duration,
    pub output: PathBuf,
    /// Explicit stored snapshot; when absent the gist and then `output` are used.
    pub existing: Option<PathBuf>,
    pub check: bool,
    pub reference: Option<PathBuf>,
    pub print_report: bool,
    pub changes_dir: PathBuf,
    pub gist: Option<GistConfig>,
    pub webhook: Option<WebhookConfig>,
}

impl RunArgs {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> WatchResult<RunConfig> {
        self.resolve_with(&process_env)
    }

    /// Resolve against an explicit environment lookup.
    pub fn resolve_with(&self, env: &impl Fn(&str) -> Option<String>) -> WatchResult<RunConfig> {
        if self.print && self.reference.is_none() {
            return Err(WatchError::Config(
                "--print requires --reference".to_string(),
            ));
        }

        let gist = self
            .gist
            .clone()
            .or_else(|| env(ENV_GIST_ID))
            .map(|id| GistConfig {
                id,
                token: env(ENV_GITHUB_TOKEN),
                api_base: env(ENV_GITHUB_API).unwrap_or_else(|| DEFAULT_GITHUB_API.to_string()),
            });

        let webhook = self
            .webhook
            .clone()
            .or_else(|| env(ENV_WEBHOOK_URL))
            .map(|url| WebhookConfig {
                url,
                mention: self.mention.clone().or_else(|| env(ENV_MENTION)),
                username: DEFAULT_WEBHOOK_USERNAME.to_string(),
            });

        Ok(RunConfig {
            source: self.source.resolve_with(env),
            timeout: self.source.timeout(),
            output: self.output.clone(),
            existing: self.existing.clone(),
            check: !self.no_check,
            reference: self.reference.clone(),
            print_report: self.print,
            changes_dir: self.changes_dir.clone(),
            gist,
            webhook,
        })
    }
}
