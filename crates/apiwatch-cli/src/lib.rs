//! apiwatch CLI: fetch the documentation page, detect endpoint changes,
//! archive them and notify collaborators.

pub mod config;
pub mod fetch;
pub mod remote;
pub mod report;
pub mod runner;
pub mod types;

pub use config::{RunArgs, RunConfig};
pub use fetch::HttpClient;
pub use runner::{RunOutcome, Runner};
pub use types::{WatchError, WatchResult};
