//! Dialogue orchestrator — one turn in, one `TurnResult` out.
//!
//! Classifies the utterance against the caller's session, dispatches to the
//! compose flow or the inbox navigator, and synthesizes the reply. Every
//! failure below this point has already been turned into response text.

use std::sync::Arc;

use tracing::{info, warn};

use super::compose::{self, ComposeFlow};
use super::inbox::InboxNavigator;
use super::session::DialogueSession;
use super::types::TurnResult;
use crate::config::VoiceConfig;
use crate::mail::Mailbox;
use crate::nlu::{Intent, IntentClassifier};
use crate::speech::{Synthesizer, Transcriber, sanitize_for_speech};

/// Spoken when the recognizer has no model loaded.
pub const RECOGNIZER_UNAVAILABLE: &str = "Speech recognition is not available. \
Please install a speech model and set its path in the configuration.";

const HELP_TEXT: &str = "You can say: read email, list emails, next email, previous email, \
read more, stop, send email, cancel, logout, or help.";

/// Stateless turn handler; all per-user state lives in `DialogueSession`.
pub struct Orchestrator {
    classifier: IntentClassifier,
    compose: ComposeFlow,
    inbox: InboxNavigator,
    mailbox: Arc<dyn Mailbox>,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Orchestrator {
    pub fn new(
        config: &VoiceConfig,
        mailbox: Arc<dyn Mailbox>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(config),
            compose: ComposeFlow::new(config),
            inbox: InboxNavigator::new(config),
            mailbox,
            transcriber,
            synthesizer,
        }
    }

    /// Handle an already-transcribed utterance.
    pub async fn handle_text(
        &self,
        identity: &str,
        text: &str,
        session: &mut DialogueSession,
    ) -> TurnResult {
        let classification = self.classifier.classify_turn(text, session);
        let intent = classification.intent;
        if classification.target.is_some() {
            session.pending_target = classification.target;
        }

        info!(
            identity = %identity,
            intent = intent.label(),
            step = ?session.compose_step(),
            "Dispatching turn"
        );

        let mailbox = self.mailbox.as_ref();
        let response = match intent {
            Intent::SendEmail => {
                self.compose
                    .handle_voice(identity, text, session, mailbox)
                    .await
            }
            Intent::CancelEmail => compose::cancel(identity, session),
            Intent::ReadEmail => self.inbox.read_first(identity, session, mailbox).await,
            Intent::ListEmails => self.inbox.list(identity, session, mailbox).await,
            Intent::NextEmail => self.inbox.next(identity, session, mailbox).await,
            Intent::PrevEmail => self.inbox.previous(identity, session, mailbox).await,
            Intent::ReadMore => self.inbox.read_more(identity, session, mailbox).await,
            Intent::StopReading => String::new(),
            Intent::Logout => {
                session.clear();
                info!(identity = %identity, "Session cleared on logout");
                "You have been logged out. Goodbye!".to_string()
            }
            Intent::Help => HELP_TEXT.to_string(),
            Intent::Unknown => unknown_reply(text),
        };

        self.finish(text.trim().to_string(), intent.label(), response, session)
            .await
    }

    /// Transcribe `audio`, then handle it as text.
    pub async fn handle_voice(
        &self,
        identity: &str,
        audio: &[u8],
        session: &mut DialogueSession,
    ) -> TurnResult {
        if !self.transcriber.is_available() {
            warn!(identity = %identity, "Recognizer unavailable");
            return self
                .finish(
                    String::new(),
                    "error",
                    RECOGNIZER_UNAVAILABLE.to_string(),
                    session,
                )
                .await;
        }

        let transcription = self.transcriber.transcribe(audio).await;
        info!(identity = %identity, transcription = %transcription, "Transcribed");
        self.handle_text(identity, &transcription, session).await
    }

    /// Handle a typed value for one compose field.
    pub async fn handle_typed(
        &self,
        identity: &str,
        field: &str,
        value: &str,
        session: &mut DialogueSession,
    ) -> TurnResult {
        info!(identity = %identity, field = %field, "Typed compose input");
        let response = self
            .compose
            .handle_typed(identity, field, value, session, self.mailbox.as_ref())
            .await;
        self.finish(
            format!("[typed] {value}"),
            Intent::SendEmail.label(),
            response,
            session,
        )
        .await
    }

    async fn finish(
        &self,
        transcription: String,
        intent: &str,
        response_text: String,
        session: &DialogueSession,
    ) -> TurnResult {
        let audio = if response_text.is_empty() {
            None
        } else {
            self.synthesizer
                .synthesize(&sanitize_for_speech(&response_text))
                .await
        };

        TurnResult {
            transcription,
            intent: intent.to_string(),
            response_text,
            audio,
            dialogue_step: session.compose_step(),
        }
    }
}

fn unknown_reply(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    format!("I heard: {text}. I am not sure what you want. Try saying read email or send email.")
}
