//! Remote collaborators: the gist snapshot store and the webhook notifier.

pub mod gist;
pub mod webhook;

pub use gist::GistStore;
pub use webhook::WebhookNotifier;
