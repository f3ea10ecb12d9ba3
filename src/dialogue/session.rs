//! Per-user dialogue state and the in-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::mail::MailMessage;

/// Steps of the compose flow.
///
/// Progresses linearly: To → Subject → Body → Confirm. Leaving Confirm means
/// the compose state is dropped (sent or cancelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposeStep {
    #[default]
    To,
    Subject,
    Body,
    Confirm,
}

impl ComposeStep {
    /// Next step in the linear progression, if any.
    pub fn next(&self) -> Option<ComposeStep> {
        use ComposeStep::*;
        match self {
            To => Some(Subject),
            Subject => Some(Body),
            Body => Some(Confirm),
            Confirm => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::To => "to",
            Self::Subject => "subject",
            Self::Body => "body",
            Self::Confirm => "confirm",
        }
    }
}

impl std::fmt::Display for ComposeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An email being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeState {
    pub step: ComposeStep,
    /// Recipient. While at `To`, the last heard candidate (valid or not).
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Consecutive invalid recipient attempts.
    pub to_retry_count: u32,
}

impl ComposeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next step. `Confirm` is terminal and stays put.
    pub fn advance(&mut self) -> ComposeStep {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        self.step
    }
}

/// Position inside the cached message list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCursor {
    /// Index into the cached messages, 0 = newest.
    pub index: usize,
    /// Character offset of the next body chunk.
    pub offset: usize,
}

/// Everything the engine remembers about one user between turns.
#[derive(Debug, Clone, Default)]
pub struct DialogueSession {
    pub compose: Option<ComposeState>,
    pub read_cursor: ReadCursor,
    /// Most-recent-first, capped at the page size. `None` until fetched.
    pub cached_messages: Option<Vec<MailMessage>>,
    /// Message index requested by a positional reference ("the second email").
    pub pending_target: Option<usize>,
}

impl DialogueSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current compose step, if composing.
    pub fn compose_step(&self) -> Option<ComposeStep> {
        self.compose.as_ref().map(|c| c.step)
    }

    /// Forget everything (logout).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Concurrent identity → session map. Last writer wins per identity.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, DialogueSession>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Snapshot of a user's session, fresh if none exists yet.
    pub async fn load(&self, identity: &str) -> DialogueSession {
        let sessions = self.sessions.read().await;
        sessions.get(identity).cloned().unwrap_or_default()
    }

    /// Store the session after a turn.
    pub async fn save(&self, identity: &str, session: DialogueSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(identity.to_string(), session);
        debug!(identity = %identity, "Session saved");
    }

    /// Drop a user's session entirely.
    pub async fn remove(&self, identity: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(identity).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ComposeStep tests ───────────────────────────────────────────

    #[test]
    fn steps_are_linear() {
        use ComposeStep::*;
        assert_eq!(To.next(), Some(Subject));
        assert_eq!(Subject.next(), Some(Body));
        assert_eq!(Body.next(), Some(Confirm));
        assert_eq!(Confirm.next(), None);
    }

    #[test]
    fn display_matches_serde() {
        use ComposeStep::*;
        for step in [To, Subject, Body, Confirm] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{step}\""));
        }
    }

    #[test]
    fn advance_walks_to_confirm_then_stops() {
        let mut state = ComposeState::new();
        assert_eq!(state.advance(), ComposeStep::Subject);
        assert_eq!(state.advance(), ComposeStep::Body);
        assert_eq!(state.advance(), ComposeStep::Confirm);
        assert_eq!(state.advance(), ComposeStep::Confirm);
        assert_eq!(state.step, ComposeStep::Confirm);
    }

    // ── DialogueSession tests ───────────────────────────────────────

    #[test]
    fn clear_resets_everything() {
        let mut session = DialogueSession::new();
        session.compose = Some(ComposeState::new());
        session.read_cursor = ReadCursor { index: 2, offset: 400 };
        session.pending_target = Some(1);
        session.cached_messages = Some(vec![]);

        session.clear();
        assert!(session.compose.is_none());
        assert_eq!(session.read_cursor, ReadCursor::default());
        assert!(session.pending_target.is_none());
        assert!(session.cached_messages.is_none());
    }

    // ── SessionStore tests ──────────────────────────────────────────

    #[tokio::test]
    async fn store_round_trips_per_identity() {
        let store = SessionStore::new();
        let mut session = store.load("alice").await;
        assert!(session.compose.is_none());

        session.compose = Some(ComposeState::new());
        store.save("alice", session).await;

        assert_eq!(store.load("alice").await.compose_step(), Some(ComposeStep::To));
        assert!(store.load("bob").await.compose.is_none());
        assert_eq!(store.len().await, 1);

        assert!(store.remove("alice").await);
        assert!(store.is_empty().await);
    }
}
