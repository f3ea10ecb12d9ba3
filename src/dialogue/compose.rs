//! Compose flow — to → subject → body → confirm, one utterance per step.

use tracing::{info, warn};

use super::session::{ComposeState, ComposeStep, DialogueSession};
use crate::config::VoiceConfig;
use crate::mail::Mailbox;
use crate::nlu::tables::CONFIRM_WORDS;
use crate::nlu::{
    FuzzyMatcher, apply_correction, is_correction_command, is_valid_email, normalize_email,
    speakable_address,
};

const START_PROMPT: &str = "Sure! Let's compose an email. Who would you like to send it to? \
Please say the recipient's email address.";

/// Drives one user's compose state from spoken or typed turns.
#[derive(Debug, Clone)]
pub struct ComposeFlow {
    matcher: FuzzyMatcher,
    keyword_cutoff: f64,
    to_retry_limit: u32,
}

impl ComposeFlow {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            matcher: FuzzyMatcher::new(config),
            keyword_cutoff: config.keyword_cutoff,
            to_retry_limit: config.to_retry_limit,
        }
    }

    /// Handle a spoken turn classified as `send_email`.
    pub async fn handle_voice(
        &self,
        identity: &str,
        text: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        let Some(mut compose) = session.compose.take() else {
            session.compose = Some(ComposeState::new());
            info!(identity = %identity, "Compose started");
            return START_PROMPT.to_string();
        };

        let raw = text.trim();
        match compose.step {
            ComposeStep::To => {
                let reply = self.recipient(identity, raw, &mut compose);
                session.compose = Some(compose);
                reply
            }
            ComposeStep::Subject => {
                compose.subject = raw.to_string();
                compose.advance();
                let reply = format!("Subject: {}. What is your message?", compose.subject);
                session.compose = Some(compose);
                reply
            }
            ComposeStep::Body => {
                compose.body = raw.to_string();
                compose.advance();
                let reply = format!(
                    "Ready to send. To: {}. Subject: {}. Message: {}. \
                     Say yes or confirm to send, or cancel to abort.",
                    speakable_address(&compose.to),
                    compose.subject,
                    compose.body
                );
                session.compose = Some(compose);
                reply
            }
            ComposeStep::Confirm => {
                if self.is_confirmation(raw) {
                    send(identity, compose, mailbox).await
                } else {
                    info!(identity = %identity, "Compose cancelled at confirm");
                    "Email cancelled.".to_string()
                }
            }
        }
    }

    /// Handle a typed value for one compose field.
    ///
    /// Fields must arrive in step order; a field for another step is refused
    /// without changing state.
    pub async fn handle_typed(
        &self,
        identity: &str,
        field: &str,
        value: &str,
        session: &mut DialogueSession,
        mailbox: &dyn Mailbox,
    ) -> String {
        let Some(target) = parse_field(field) else {
            return "Unknown field.".to_string();
        };

        let mut compose = session.compose.take().unwrap_or_else(|| {
            info!(identity = %identity, "Compose started from typed input");
            ComposeState::new()
        });
        let value = value.trim();

        if compose.step != target {
            let reply = format!(
                "I need the {} next, not the {}.",
                compose.step, target
            );
            session.compose = Some(compose);
            return reply;
        }

        match target {
            ComposeStep::To => {
                let reply = if is_valid_email(value) {
                    compose.to = value.to_string();
                    compose.to_retry_count = 0;
                    compose.advance();
                    format!(
                        "Got it, sending to {}. Now say the subject.",
                        speakable_address(value)
                    )
                } else {
                    compose.to_retry_count += 1;
                    warn!(
                        identity = %identity,
                        value = %value,
                        attempts = compose.to_retry_count,
                        "Typed recipient rejected"
                    );
                    format!(
                        "'{value}' doesn't look like a valid email address. Please check and try again."
                    )
                };
                session.compose = Some(compose);
                reply
            }
            ComposeStep::Subject => {
                compose.subject = value.to_string();
                compose.advance();
                session.compose = Some(compose);
                format!("Subject: {value}. Now say your message.")
            }
            ComposeStep::Body => {
                compose.body = value.to_string();
                compose.advance();
                let reply = format!(
                    "Ready to send. To: {}. Subject: {}. Message: {}. \
                     Say yes to confirm or cancel to abort.",
                    speakable_address(&compose.to),
                    compose.subject,
                    value
                );
                session.compose = Some(compose);
                reply
            }
            ComposeStep::Confirm => {
                if self.is_confirmation(value) {
                    send(identity, compose, mailbox).await
                } else {
                    info!(identity = %identity, "Typed compose cancelled at confirm");
                    "Email cancelled.".to_string()
                }
            }
        }
    }

    /// Recipient step: correction commands edit the last candidate, anything
    /// else is a fresh dictation.
    fn recipient(&self, identity: &str, raw: &str, compose: &mut ComposeState) -> String {
        let (candidate, correction_note) =
            if !compose.to.is_empty() && is_correction_command(raw) {
                let outcome = apply_correction(&compose.to, raw);
                if !outcome.changed {
                    return format!(
                        "{} The address is still {}.",
                        outcome.message,
                        speakable_address(&compose.to)
                    );
                }
                (outcome.result, Some(outcome.message))
            } else {
                (normalize_email(raw), None)
            };

        info!(identity = %identity, raw = %raw, candidate = %candidate, "Compose recipient heard");

        if is_valid_email(&candidate) {
            compose.to = candidate;
            compose.to_retry_count = 0;
            compose.advance();
            let confirm = format!(
                "Got it, sending to {}. What is the subject?",
                speakable_address(&compose.to)
            );
            return match correction_note {
                Some(note) => format!("{note} {confirm}"),
                None => confirm,
            };
        }

        compose.to = candidate;
        compose.to_retry_count += 1;
        warn!(
            identity = %identity,
            candidate = %compose.to,
            retries = compose.to_retry_count,
            "Recipient is not a valid address"
        );

        let heard = match correction_note {
            Some(note) => format!("{note} The address is now {}.", speakable_address(&compose.to)),
            None => format!("I heard: '{raw}'."),
        };
        if compose.to_retry_count >= self.to_retry_limit {
            format!(
                "{heard} That doesn't look like a valid email address. \
                 Please type the address instead, or say a correction such as replace X with Y."
            )
        } else {
            format!(
                "{heard} That doesn't look like a valid email address. \
                 Please say it again clearly. For example: r u t i k at gmail dot com."
            )
        }
    }

    fn is_confirmation(&self, text: &str) -> bool {
        self.matcher
            .any_token_matches(text, &CONFIRM_WORDS, self.keyword_cutoff)
    }
}

/// Drop the compose state from any step.
pub fn cancel(identity: &str, session: &mut DialogueSession) -> String {
    if session.compose.take().is_some() {
        info!(identity = %identity, "Compose cancelled");
    }
    "Email cancelled. What else can I help you with?".to_string()
}

/// Send a confirmed draft. The state is already out of the session, so a
/// failure leaves nothing half-sent behind.
async fn send(identity: &str, compose: ComposeState, mailbox: &dyn Mailbox) -> String {
    info!(identity = %identity, to = %compose.to, "Sending composed email");
    let outcome = mailbox
        .send_message(identity, &compose.to, &compose.subject, &compose.body)
        .await;
    if outcome.success {
        format!(
            "Email sent successfully to {}!",
            speakable_address(&compose.to)
        )
    } else {
        warn!(identity = %identity, error = %outcome.message, "Send failed");
        format!("Failed to send email. {}. Please try again.", outcome.message)
    }
}

fn parse_field(field: &str) -> Option<ComposeStep> {
    match field.trim().to_lowercase().as_str() {
        "to" => Some(ComposeStep::To),
        "subject" => Some(ComposeStep::Subject),
        "body" => Some(ComposeStep::Body),
        "confirm" => Some(ComposeStep::Confirm),
        _ => None,
    }
}
