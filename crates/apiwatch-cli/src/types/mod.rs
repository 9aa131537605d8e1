//! Shared types for the apiwatch command-line watcher.

pub mod error;

pub use error::{WatchError, WatchResult};
