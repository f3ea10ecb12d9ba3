//! End-to-end dialogue tests through the public orchestrator API.
//!
//! A scripted mailbox stands in for IMAP/SMTP; every turn goes through the
//! session store the way the CLI drives it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use voice_mail::config::VoiceConfig;
use voice_mail::dialogue::{ComposeStep, Orchestrator, SessionStore, TurnResult};
use voice_mail::error::MailboxError;
use voice_mail::mail::{MailMessage, Mailbox, SendOutcome};
use voice_mail::speech::{NoTranscriber, SilentSynthesizer};

// ── Harness ─────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedMailbox {
    inbox: Vec<MailMessage>,
    sent: Mutex<Vec<(String, String, String, String)>>,
}

#[async_trait]
impl Mailbox for ScriptedMailbox {
    async fn fetch_messages(
        &self,
        _identity: &str,
        limit: usize,
    ) -> Result<Vec<MailMessage>, MailboxError> {
        Ok(self.inbox.iter().take(limit).cloned().collect())
    }

    async fn send_message(&self, identity: &str, to: &str, subject: &str, body: &str) -> SendOutcome {
        self.sent.lock().unwrap().push((
            identity.to_string(),
            to.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        SendOutcome::sent()
    }
}

fn message(id: &str, from: &str, subject: &str, body: &str) -> MailMessage {
    MailMessage {
        id: id.into(),
        from: from.into(),
        subject: subject.into(),
        date: None,
        body: body.into(),
        snippet: String::new(),
    }
}

struct Harness {
    orchestrator: Orchestrator,
    sessions: Arc<SessionStore>,
    mailbox: Arc<ScriptedMailbox>,
}

impl Harness {
    fn new(inbox: Vec<MailMessage>) -> Self {
        let mailbox = Arc::new(ScriptedMailbox {
            inbox,
            ..ScriptedMailbox::default()
        });
        let orchestrator = Orchestrator::new(
            &VoiceConfig::default(),
            mailbox.clone(),
            Arc::new(NoTranscriber),
            Arc::new(SilentSynthesizer),
        );
        Self {
            orchestrator,
            sessions: SessionStore::new(),
            mailbox,
        }
    }

    async fn say(&self, identity: &str, text: &str) -> TurnResult {
        let mut session = self.sessions.load(identity).await;
        let result = self
            .orchestrator
            .handle_text(identity, text, &mut session)
            .await;
        self.sessions.save(identity, session).await;
        result
    }

    async fn typed(&self, identity: &str, field: &str, value: &str) -> TurnResult {
        let mut session = self.sessions.load(identity).await;
        let result = self
            .orchestrator
            .handle_typed(identity, field, value, &mut session)
            .await;
        self.sessions.save(identity, session).await;
        result
    }
}

fn two_messages() -> Vec<MailMessage> {
    vec![
        message("2", "Alice <alice@example.com>", "Budget", "Numbers are in."),
        message("1", "bob@example.com", "Lunch", "Noon works for me."),
    ]
}

// ── Compose tests ───────────────────────────────────────────────────

#[tokio::test]
async fn spoken_compose_sends_once() {
    let h = Harness::new(Vec::new());

    let r = h.say("alice", "send email").await;
    assert_eq!(r.intent, "send_email");
    assert_eq!(r.dialogue_step, Some(ComposeStep::To));

    let r = h.say("alice", "bob at gmail dot com").await;
    assert_eq!(r.response_text, "Got it, sending to bob at gmail dot com. What is the subject?");
    assert_eq!(r.dialogue_step, Some(ComposeStep::Subject));

    let r = h.say("alice", "Quarterly report").await;
    assert_eq!(r.dialogue_step, Some(ComposeStep::Body));

    let r = h.say("alice", "Numbers attached for review").await;
    assert_eq!(r.dialogue_step, Some(ComposeStep::Confirm));
    assert!(r.response_text.starts_with("Ready to send."));

    let r = h.say("alice", "yes").await;
    assert_eq!(r.response_text, "Email sent successfully to bob at gmail dot com!");
    assert_eq!(r.dialogue_step, None);

    let sent = h.mailbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice");
    assert_eq!(sent[0].1, "bob@gmail.com");
    assert_eq!(sent[0].2, "Quarterly report");
    assert_eq!(sent[0].3, "Numbers attached for review");
}

#[tokio::test]
async fn repeated_bad_recipients_suggest_typing() {
    let h = Harness::new(Vec::new());
    h.say("alice", "send email").await;

    let r = h.say("alice", "bob").await;
    assert!(r.response_text.contains("Please say it again clearly"));
    assert_eq!(r.dialogue_step, Some(ComposeStep::To));

    let r = h.say("alice", "not an email").await;
    assert!(r.response_text.contains("Please type the address"));
    let session = h.sessions.load("alice").await;
    assert_eq!(session.compose.as_ref().map(|c| c.to_retry_count), Some(2));

    let r = h.say("alice", "bob at yahoo dot com").await;
    assert_eq!(r.dialogue_step, Some(ComposeStep::Subject));
    let session = h.sessions.load("alice").await;
    assert_eq!(session.compose.as_ref().map(|c| c.to.as_str()), Some("bob@yahoo.com"));
}

#[tokio::test]
async fn declining_at_confirm_cancels_without_sending() {
    let h = Harness::new(Vec::new());
    h.say("alice", "send email").await;
    h.say("alice", "bob at gmail dot com").await;
    h.say("alice", "Quarterly report").await;
    h.say("alice", "Numbers attached for review").await;

    let r = h.say("alice", "no thanks").await;
    assert_eq!(r.intent, "cancel_email");
    assert!(r.response_text.starts_with("Email cancelled."));
    assert_eq!(r.dialogue_step, None);
    assert!(h.mailbox.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn typed_fields_complete_a_message() {
    let h = Harness::new(Vec::new());

    let r = h.typed("carol", "to", "dan@example.com").await;
    assert_eq!(r.dialogue_step, Some(ComposeStep::Subject));
    h.typed("carol", "subject", "Hi").await;
    let r = h.typed("carol", "body", "Hello there").await;
    assert_eq!(r.dialogue_step, Some(ComposeStep::Confirm));

    let r = h.typed("carol", "confirm", "yes").await;
    assert_eq!(r.transcription, "[typed] yes");
    assert_eq!(r.dialogue_step, None);
    assert_eq!(h.mailbox.sent.lock().unwrap()[0].1, "dan@example.com");
}

// ── Inbox tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn navigating_past_the_end_keeps_the_cursor() {
    let h = Harness::new(two_messages());

    let r = h.say("alice", "read my email").await;
    assert!(r.response_text.starts_with("Reading your first email. From: Alice."));

    let r = h.say("alice", "next email").await;
    assert!(r.response_text.starts_with("Reading your second email. From: bob@example.com."));

    let r = h.say("alice", "next email").await;
    assert!(r.response_text.starts_with("That's the end of your recent emails. You have 2 emails."));
    assert_eq!(h.sessions.load("alice").await.read_cursor.index, 1);

    let r = h.say("alice", "previous email").await;
    assert!(r.response_text.starts_with("Reading your first email."));
}

#[tokio::test]
async fn positional_reference_jumps_to_message() {
    let h = Harness::new(two_messages());

    let r = h.say("alice", "read the second email").await;
    assert_eq!(r.intent, "next_email");
    assert!(r.response_text.contains("Subject: Lunch."));
    assert_eq!(h.sessions.load("alice").await.read_cursor.index, 1);
}

// ── Session tests ───────────────────────────────────────────────────

#[tokio::test]
async fn sessions_are_isolated_per_identity() {
    let h = Harness::new(two_messages());

    h.say("alice", "send email").await;
    let r = h.say("bob", "read email").await;
    assert_eq!(r.intent, "read_email");
    assert_eq!(r.dialogue_step, None);

    assert_eq!(h.sessions.len().await, 2);
    assert_eq!(
        h.sessions.load("alice").await.compose_step(),
        Some(ComposeStep::To)
    );
    assert!(h.sessions.load("bob").await.compose.is_none());
}

#[tokio::test]
async fn logout_then_read_refetches() {
    let h = Harness::new(two_messages());

    h.say("alice", "read email").await;
    let r = h.say("alice", "logout").await;
    assert_eq!(r.intent, "logout");
    assert!(h.sessions.load("alice").await.cached_messages.is_none());

    let r = h.say("alice", "read email").await;
    assert!(r.response_text.starts_with("Reading your first email."));
}
