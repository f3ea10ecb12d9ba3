//! Inbox navigator — a small per-user page of recent messages read aloud in
//! fixed-size chunks.

use tracing::{debug, info, warn};

use super::session::{DialogueSession, ReadCursor};
use crate::config::VoiceConfig;
use crate::mail::{MailMessage, Mailbox};
use crate::nlu::tables::ORDINALS;
use crate::speech::sanitize_for_speech;

/// Paginated reading over `DialogueSession::cached_messages`.
#[derive(Debug, Clone)]
pub struct InboxNavigator {
    page_size: usize,
    chunk_chars: usize,
}

/// How a navigation request resolved against the cache.
enum CacheState {
    /// Cache was already present.
    Warm,
    /// Cache was filled by this call.
    Fetched,
}

impl InboxNavigator {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            chunk_chars: config.chunk_chars.max(1),
        }
    }

    /// Refetch and list every cached message, one line each.
    pub async fn list(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        if let Err(reply) = self.refresh(identity, session, mailbox).await {
            return reply;
        }
        let messages = cached(session);

        let lines: Vec<String> = messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                format!(
                    "{}: from {}, subject {}.",
                    i + 1,
                    display_sender(m),
                    display_subject(m)
                )
            })
            .collect();
        let noun = if messages.len() == 1 { "email" } else { "emails" };
        format!(
            "You have {} recent {noun}. {} Say read email to hear the first one, or read email two to pick one.",
            messages.len(),
            lines.join(" ")
        )
    }

    /// Read the newest message from the start, fetching if nothing is cached.
    pub async fn read_first(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        if let Err(reply) = self.ensure_cached(identity, session, mailbox).await {
            return reply;
        }
        session.read_cursor = ReadCursor::default();
        self.render(session)
    }

    /// Move to the pending positional target, else to the following message.
    pub async fn next(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        let state = match self.ensure_cached(identity, session, mailbox).await {
            Ok(state) => state,
            Err(reply) => return reply,
        };
        let count = cached(session).len();

        let target = match session.pending_target.take() {
            Some(target) => target,
            None if matches!(state, CacheState::Fetched) => 0,
            None => session.read_cursor.index + 1,
        };

        if target >= count {
            debug!(identity = %identity, target, count, "Navigation past end of inbox");
            return format!(
                "That's the end of your recent emails. You have {count} {}. \
                 Say previous email or list emails.",
                if count == 1 { "email" } else { "emails" }
            );
        }

        session.read_cursor = ReadCursor {
            index: target,
            offset: 0,
        };
        self.render(session)
    }

    /// Move back one message.
    pub async fn previous(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        if let Err(reply) = self.ensure_cached(identity, session, mailbox).await {
            return reply;
        }
        let Some(index) = session.read_cursor.index.checked_sub(1) else {
            return "You are already at the first email. Say next email to move forward."
                .to_string();
        };
        session.read_cursor = ReadCursor { index, offset: 0 };
        self.render(session)
    }

    /// Continue the current message with its next chunk.
    pub async fn read_more(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        if let Err(reply) = self.ensure_cached(identity, session, mailbox).await {
            return reply;
        }
        let Some(message) = cached(session).get(session.read_cursor.index) else {
            return "There is no email open. Say read email to start.".to_string();
        };
        let body_len = sanitize_for_speech(message.readable_body()).chars().count();

        let offset = session.read_cursor.offset + self.chunk_chars;
        if offset >= body_len {
            return "That's the end of this email. Say next email to hear the next one."
                .to_string();
        }
        session.read_cursor.offset = offset;
        self.render(session)
    }

    // ── Cache ───────────────────────────────────────────────────────

    async fn ensure_cached(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> Result<CacheState, String> {
        if session.cached_messages.is_some() {
            return Ok(CacheState::Warm);
        }
        self.refresh(identity, session, mailbox).await?;
        Ok(CacheState::Fetched)
    }

    /// Fetch a fresh page. On failure or an empty inbox the existing cache and
    /// cursor stay untouched and the reply to speak is returned as `Err`.
    async fn refresh(
        &self,
        identity: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> Result<(), String> {
        let mut messages = match mailbox.fetch_messages(identity, self.page_size).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(identity = %identity, error = %e, "Inbox fetch failed");
                return Err(format!("I could not retrieve your emails. {e}."));
            }
        };
        if messages.is_empty() {
            info!(identity = %identity, "Inbox is empty");
            return Err("Your inbox is empty.".to_string());
        }
        messages.truncate(self.page_size);

        info!(identity = %identity, count = messages.len(), "Inbox page cached");
        session.cached_messages = Some(messages);
        session.read_cursor = ReadCursor::default();
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Speak the chunk under the cursor with position context and a hint.
    fn render(&self, session: &DialogueSession) -> String {
        let messages = cached(session);
        let ReadCursor { index, offset } = session.read_cursor;
        let Some(message) = messages.get(index) else {
            return "There is no email open. Say read email to start.".to_string();
        };

        let body = sanitize_for_speech(message.readable_body());
        let body = if body.is_empty() { "No content".to_string() } else { body };
        let chunk: String = body.chars().skip(offset).take(self.chunk_chars).collect();
        let remaining = body.chars().count() > offset + self.chunk_chars;

        let mut reply = if offset == 0 {
            format!(
                "Reading your {} email. From: {}. Subject: {}. Message: {}",
                ordinal_word(index),
                display_sender(message),
                display_subject(message),
                chunk
            )
        } else {
            format!("Continuing email {}. {}", index + 1, chunk)
        };

        let hint = if remaining {
            " ... Say read more to continue, or next email to skip."
        } else if index + 1 < messages.len() {
            " Say next email for the next one."
        } else {
            " That was your last recent email."
        };
        reply.push_str(hint);
        reply
    }
}

fn cached(session: &DialogueSession) -> &[MailMessage] {
    session.cached_messages.as_deref().unwrap_or_default()
}

fn ordinal_word(index: usize) -> String {
    ORDINALS
        .iter()
        .filter(|(w, _)| w.chars().all(char::is_alphabetic))
        .find(|(_, n)| *n == index + 1)
        .map(|(w, _)| w.to_string())
        .unwrap_or_else(|| format!("number {}", index + 1))
}

/// Sender without the angle-bracketed address, or the bare address when
/// there is no display name.
fn display_sender(message: &MailMessage) -> String {
    let name = sanitize_for_speech(&message.from);
    if !name.is_empty() {
        return name;
    }
    let bare = message.from.trim().trim_matches(['<', '>']).trim();
    if bare.is_empty() {
        "an unknown sender".to_string()
    } else {
        bare.to_string()
    }
}

fn display_subject(message: &MailMessage) -> String {
    let subject = sanitize_for_speech(&message.subject);
    if subject.is_empty() {
        "no subject".to_string()
    } else {
        subject
    }
}
