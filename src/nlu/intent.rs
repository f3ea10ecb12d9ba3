//! Intent classification for one transcribed utterance.
//!
//! Deterministic and side-effect free. The dialogue state decides which
//! vocabularies are consulted: while composing, everything except a cancel
//! feeds the compose flow.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fuzzy::FuzzyMatcher;
use super::phonetic::number_value;
use super::tables::{CANCEL_WORDS, CONFIRM_WORDS, ORDINALS, STOP_WORDS};
use crate::config::VoiceConfig;
use crate::dialogue::session::{ComposeStep, DialogueSession};

/// What the user wants this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SendEmail,
    ReadEmail,
    ListEmails,
    NextEmail,
    PrevEmail,
    ReadMore,
    StopReading,
    CancelEmail,
    Logout,
    Help,
    Unknown,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SendEmail => "send_email",
            Self::ReadEmail => "read_email",
            Self::ListEmails => "list_emails",
            Self::NextEmail => "next_email",
            Self::PrevEmail => "prev_email",
            Self::ReadMore => "read_more",
            Self::StopReading => "stop_reading",
            Self::CancelEmail => "cancel_email",
            Self::Logout => "logout",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Keyword lists, in match priority order. Navigation comes first so that
/// "next email" is not swallowed by the generic "email" of `ReadEmail`, and
/// `SendEmail` precedes `ReadEmail` for the same reason.
static INTENT_KEYWORDS: LazyLock<Vec<(Intent, HashSet<&'static str>)>> = LazyLock::new(|| {
    vec![
        (
            Intent::ListEmails,
            HashSet::from([
                "list", "list emails", "list my emails", "all emails", "show all", "summary",
                "summarize",
            ]),
        ),
        (
            Intent::NextEmail,
            HashSet::from(["next", "next email", "next one", "skip", "forward"]),
        ),
        (
            Intent::PrevEmail,
            HashSet::from([
                "previous", "prev", "go back", "back", "last email", "earlier",
            ]),
        ),
        (
            Intent::ReadMore,
            HashSet::from([
                "read more", "more", "continue", "keep reading", "go on", "carry on",
            ]),
        ),
        (
            Intent::SendEmail,
            HashSet::from([
                "send", "cent", "sent", "sand", "ends", "compose", "composed", "write", "right",
                "wrote", "new email", "new mail",
            ]),
        ),
        (
            Intent::ReadEmail,
            HashSet::from([
                "read", "reed", "red", "raid", "rid", "check", "czech", "checked", "inbox",
                "in box", "emails", "email", "e-mail", "e mail", "mails", "mail", "show", "open",
                "get", "fetch",
            ]),
        ),
        (
            Intent::Logout,
            HashSet::from([
                "logout", "log out", "log-out", "sign out", "sign-out", "bye", "by", "buy", "bi",
                "exit", "exist", "quite", "quit", "goodbye", "good bye",
            ]),
        ),
        (
            Intent::Help,
            HashSet::from(["help", "held", "heap", "hell", "what can", "commands", "command"]),
        ),
    ]
});

/// "email two", "read email number 3", "message 4".
static NUMBERED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:email|mail|message)\s+(?:number\s+)?([a-z0-9]+)\b").unwrap()
});

/// "the second email", "3rd message".
static ORDINAL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    let ordinals: Vec<&str> = ORDINALS.iter().map(|(w, _)| *w).collect();
    Regex::new(&format!(
        r"\b({})\s+(?:email|mail|message)\b",
        ordinals.join("|")
    ))
    .unwrap()
});

/// Intent plus the positional target it carries, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// 0-based message index for positional navigation.
    pub target: Option<usize>,
}

impl Classification {
    fn plain(intent: Intent) -> Self {
        Self {
            intent,
            target: None,
        }
    }
}

/// Maps free text plus dialogue state to exactly one intent.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    matcher: FuzzyMatcher,
    keyword_cutoff: f64,
    fallback_cutoff: f64,
}

impl IntentClassifier {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            matcher: FuzzyMatcher::new(config),
            keyword_cutoff: config.keyword_cutoff,
            fallback_cutoff: config.fallback_cutoff,
        }
    }

    /// Classify one utterance.
    pub fn classify(&self, text: &str, session: &DialogueSession) -> Intent {
        self.classify_turn(text, session).intent
    }

    /// Classify one utterance, also returning a positional target.
    pub fn classify_turn(&self, text: &str, session: &DialogueSession) -> Classification {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Classification::plain(Intent::Unknown);
        }

        if let Some(step) = session.compose_step() {
            let intent = self.classify_compose(&normalized, step);
            debug!(text = %normalized, step = %step, intent = intent.label(), "Compose turn classified");
            return Classification::plain(intent);
        }

        // A token that is literally another command's keyword is that command,
        // not a misheard "stop" ("show" vs "shop").
        if self.matcher.any_token_matches_except(
            &normalized,
            &STOP_WORDS,
            self.keyword_cutoff,
            is_command_keyword,
        ) {
            debug!(text = %normalized, "Stop vocabulary matched");
            return Classification::plain(Intent::StopReading);
        }

        if let Some(target) = positional_target(&normalized) {
            debug!(text = %normalized, target, "Positional reference");
            return Classification {
                intent: Intent::NextEmail,
                target: Some(target),
            };
        }

        let padded = format!(" {normalized} ");
        for (intent, keywords) in INTENT_KEYWORDS.iter() {
            if keywords.iter().any(|kw| padded.contains(&format!(" {kw} "))) {
                debug!(text = %normalized, intent = intent.label(), "Keyword matched");
                return Classification::plain(*intent);
            }
        }

        for (intent, keywords) in INTENT_KEYWORDS.iter() {
            if self
                .matcher
                .any_token_matches(&normalized, keywords, self.fallback_cutoff)
            {
                debug!(text = %normalized, intent = intent.label(), "Fuzzy keyword matched");
                return Classification::plain(*intent);
            }
        }

        debug!(text = %normalized, "No intent matched");
        Classification::plain(Intent::Unknown)
    }

    fn classify_compose(&self, text: &str, step: ComposeStep) -> Intent {
        if self
            .matcher
            .any_token_matches(text, &CANCEL_WORDS, self.keyword_cutoff)
        {
            return Intent::CancelEmail;
        }
        if step == ComposeStep::Confirm
            && !self
                .matcher
                .any_token_matches(text, &CONFIRM_WORDS, self.keyword_cutoff)
        {
            return Intent::CancelEmail;
        }
        Intent::SendEmail
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(&VoiceConfig::default())
    }
}

/// Lower-case, turn punctuation into spaces and collapse whitespace.
/// Apostrophes and hyphens survive ("don't", "log-out").
fn normalize(text: &str) -> String {
    let lower: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    lower.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_command_keyword(token: &str) -> bool {
    INTENT_KEYWORDS
        .iter()
        .any(|(_, keywords)| keywords.contains(token))
}

fn positional_target(text: &str) -> Option<usize> {
    if let Some(caps) = ORDINAL_REFERENCE.captures(text) {
        let position = ORDINALS
            .iter()
            .find(|(w, _)| *w == &caps[1])
            .map(|(_, n)| *n)?;
        return Some(position - 1);
    }

    let caps = NUMBERED_REFERENCE.captures(text)?;
    let word = &caps[1];
    let position = word
        .parse::<usize>()
        .ok()
        .or_else(|| number_value(word).map(|n| n as usize))?;
    position.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::session::ComposeState;

    fn idle() -> DialogueSession {
        DialogueSession::new()
    }

    fn composing(step: ComposeStep) -> DialogueSession {
        let mut session = DialogueSession::new();
        session.compose = Some(ComposeState {
            step,
            ..ComposeState::default()
        });
        session
    }

    fn classify(text: &str, session: &DialogueSession) -> Intent {
        IntentClassifier::default().classify(text, session)
    }

    // ── Idle tests ──────────────────────────────────────────────────

    #[test]
    fn blank_is_unknown() {
        assert_eq!(classify("   ", &idle()), Intent::Unknown);
        assert_eq!(classify("?!", &idle()), Intent::Unknown);
    }

    #[test]
    fn core_commands() {
        assert_eq!(classify("send an email", &idle()), Intent::SendEmail);
        assert_eq!(classify("read my email", &idle()), Intent::ReadEmail);
        assert_eq!(classify("check inbox", &idle()), Intent::ReadEmail);
        assert_eq!(classify("log out", &idle()), Intent::Logout);
        assert_eq!(classify("help", &idle()), Intent::Help);
    }

    #[test]
    fn navigation_beats_generic_email() {
        assert_eq!(classify("next email", &idle()), Intent::NextEmail);
        assert_eq!(classify("go back", &idle()), Intent::PrevEmail);
        assert_eq!(classify("read more", &idle()), Intent::ReadMore);
        assert_eq!(classify("list emails", &idle()), Intent::ListEmails);
    }

    #[test]
    fn mishearings_of_send() {
        assert_eq!(classify("cent email", &idle()), Intent::SendEmail);
        assert_eq!(classify("write a new mail", &idle()), Intent::SendEmail);
    }

    #[test]
    fn keywords_are_token_aligned() {
        // "more" must not fire inside "tomorrow"
        assert_eq!(
            classify("tomorrow afternoon works", &idle()),
            Intent::Unknown
        );
    }

    #[test]
    fn stop_vocabulary_first() {
        assert_eq!(classify("stop", &idle()), Intent::StopReading);
        assert_eq!(classify("shut up", &idle()), Intent::StopReading);
        assert_eq!(classify("top", &idle()), Intent::StopReading);
    }

    #[test]
    fn command_keywords_are_not_misheard_stops() {
        assert_eq!(classify("show me my emails", &idle()), Intent::ReadEmail);
        assert_eq!(classify("please show me the inbox", &idle()), Intent::ReadEmail);
        assert_ne!(classify("show my new email", &idle()), Intent::StopReading);
        assert_eq!(classify("please quit this app", &idle()), Intent::Logout);
        assert_eq!(classify("please stop reading that", &idle()), Intent::StopReading);
        assert_eq!(classify("ok shop reading now", &idle()), Intent::StopReading);
    }

    #[test]
    fn short_words_do_not_collide_with_stop() {
        assert_eq!(classify("send", &idle()), Intent::SendEmail);
        assert_eq!(classify("read", &idle()), Intent::ReadEmail);
    }

    #[test]
    fn fuzzy_fallback_catches_near_misses() {
        // "compse" is one deletion from "compose"
        assert_eq!(classify("please compse a message for me", &idle()), Intent::SendEmail);
    }

    #[test]
    fn unknown_when_nothing_matches() {
        assert_eq!(classify("banana pancakes", &idle()), Intent::Unknown);
    }

    // ── Positional tests ────────────────────────────────────────────

    #[test]
    fn positional_references_carry_a_target() {
        let classifier = IntentClassifier::default();
        let c = classifier.classify_turn("read email two", &idle());
        assert_eq!(c.intent, Intent::NextEmail);
        assert_eq!(c.target, Some(1));

        let c = classifier.classify_turn("email number 3", &idle());
        assert_eq!(c.target, Some(2));

        let c = classifier.classify_turn("the second email", &idle());
        assert_eq!(c.intent, Intent::NextEmail);
        assert_eq!(c.target, Some(1));
    }

    #[test]
    fn non_numeric_follower_is_not_positional() {
        let classifier = IntentClassifier::default();
        let c = classifier.classify_turn("read email please", &idle());
        assert_eq!(c.intent, Intent::ReadEmail);
        assert_eq!(c.target, None);
    }

    #[test]
    fn email_zero_is_not_a_position() {
        assert_eq!(positional_target("email zero"), None);
    }

    // ── Compose tests ───────────────────────────────────────────────

    #[test]
    fn compose_feeds_everything_to_send() {
        let session = composing(ComposeStep::Subject);
        assert_eq!(classify("lunch plans", &session), Intent::SendEmail);
        assert_eq!(classify("read my email", &session), Intent::SendEmail);
    }

    #[test]
    fn cancel_wins_at_any_step() {
        for step in [ComposeStep::To, ComposeStep::Body, ComposeStep::Confirm] {
            assert_eq!(classify("cancel", &composing(step)), Intent::CancelEmail);
            assert_eq!(classify("never mind", &composing(step)), Intent::CancelEmail);
        }
    }

    #[test]
    fn not_an_email_is_still_a_recipient_attempt() {
        assert_eq!(
            classify("not an email", &composing(ComposeStep::To)),
            Intent::SendEmail
        );
    }

    #[test]
    fn confirm_step() {
        let session = composing(ComposeStep::Confirm);
        assert_eq!(classify("yes", &session), Intent::SendEmail);
        assert_eq!(classify("yes please", &session), Intent::SendEmail);
        assert_eq!(classify("go ahead", &session), Intent::SendEmail);
        assert_eq!(classify("no thanks", &session), Intent::CancelEmail);
        assert_eq!(classify("maybe later", &session), Intent::CancelEmail);
    }

    #[test]
    fn intent_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Intent::StopReading).unwrap(),
            "\"stop_reading\""
        );
        assert_eq!(Intent::PrevEmail.to_string(), "prev_email");
    }
}
