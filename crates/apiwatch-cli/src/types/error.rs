//! Error taxonomy for one watch run.

/// All errors that can abort a run.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// The documentation page (or a remote API) could not be retrieved.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The markup or a stored snapshot did not have the expected structure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A local file or archive write failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The gist store rejected a read or update.
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<apiwatch::ApiWatchError> for WatchError {
    fn from(e: apiwatch::ApiWatchError) -> Self {
        use apiwatch::ApiWatchError;
        match e {
            ApiWatchError::Parse(msg) | ApiWatchError::Snapshot(msg) => WatchError::Parse(msg),
            ApiWatchError::Json(e) => WatchError::Parse(e.to_string()),
            ApiWatchError::Io(e) => WatchError::Persistence(e.to_string()),
        }
    }
}

impl From<std::io::Error> for WatchError {
    fn from(e: std::io::Error) -> Self {
        WatchError::Persistence(e.to_string())
    }
}

pub type WatchResult<T> = Result<T, WatchError>;
