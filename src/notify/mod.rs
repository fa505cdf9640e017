//! Notification of broken link reports
//!
//! Reports are rendered through a named template of the [`Templates`]
//! registry and delivered by the [`Sender`] of the notifier.

mod sender;
mod templates;

pub use sender::{locate_sender, LogSender, Sender, WebhookSender, DEFAULT_CONTENT_TYPE};
pub use templates::Templates;
