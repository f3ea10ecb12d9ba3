//! Mailbox boundary — message shape and the fetch/send trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MailboxError;

/// One fetched message. Read-only for the dialogue engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Backend identifier (IMAP sequence number, provider id, ...).
    pub id: String,
    /// Display sender, e.g. `"Alice <alice@example.com>"`.
    pub from: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// Plain-text body, quotes stripped.
    pub body: String,
    /// Short preview, used when the body is empty.
    #[serde(default)]
    pub snippet: String,
}

impl MailMessage {
    /// Body text to read aloud: the body, else the snippet.
    pub fn readable_body(&self) -> &str {
        if self.body.trim().is_empty() {
            self.snippet.trim()
        } else {
            self.body.trim()
        }
    }
}

/// Result of a send attempt. `message` is spoken back verbatim on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub message: String,
}

impl SendOutcome {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: "Email sent".into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A mail backend bound to user identities.
///
/// Implementations never retry; the dialogue engine reports failures as-is.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Fetch up to `limit` most-recent messages, newest first.
    async fn fetch_messages(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<MailMessage>, MailboxError>;

    /// Send one plain-text message.
    async fn send_message(&self, identity: &str, to: &str, subject: &str, body: &str)
    -> SendOutcome;
}

/// Backend used when no mail credentials are configured.
#[derive(Debug, Default, Clone)]
pub struct OfflineMailbox;

#[async_trait]
impl Mailbox for OfflineMailbox {
    async fn fetch_messages(
        &self,
        identity: &str,
        _limit: usize,
    ) -> Result<Vec<MailMessage>, MailboxError> {
        Err(MailboxError::NotConfigured {
            identity: identity.to_string(),
        })
    }

    async fn send_message(
        &self,
        identity: &str,
        _to: &str,
        _subject: &str,
        _body: &str,
    ) -> SendOutcome {
        SendOutcome::failed(
            MailboxError::NotConfigured {
                identity: identity.to_string(),
            }
            .to_string(),
        )
    }
}
