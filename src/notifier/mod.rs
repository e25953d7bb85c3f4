//! Outgoing notifications.
//!
//! The engine treats every send as fire-and-forget: failures are logged and
//! never undo the state change that triggered them.

mod mailer;
pub mod templates;

pub use mailer::HttpMailer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), Error>;
}

/// Notifier used when no mail provider is configured.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: Email) -> Result<(), Error> {
        tracing::info!(to = %email.to, subject = %email.subject, "email not sent, no mailer configured");
        Ok(())
    }
}
