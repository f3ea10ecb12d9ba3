//! Speech boundary — recognizer and synthesizer traits plus the text cleanup
//! applied before anything is spoken.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to synthesized audio owned by the synthesizer (file, cache key, URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioHandle {
    pub id: Uuid,
    pub location: String,
}

impl AudioHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            location: location.into(),
        }
    }
}

/// Speech-to-text engine.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Whether the model is loaded. When false, every voice turn gets the
    /// fixed diagnostic instead of a transcription.
    fn is_available(&self) -> bool;

    /// Transcribe raw audio. Returns an empty string on failure.
    async fn transcribe(&self, audio: &[u8]) -> String;
}

/// Text-to-speech engine.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text`, or `None` if synthesis failed.
    async fn synthesize(&self, text: &str) -> Option<AudioHandle>;
}

/// Recognizer stand-in for text-only front ends.
#[derive(Debug, Default, Clone)]
pub struct NoTranscriber;

#[async_trait]
impl Transcriber for NoTranscriber {
    fn is_available(&self) -> bool {
        false
    }

    async fn transcribe(&self, _audio: &[u8]) -> String {
        String::new()
    }
}

/// Synthesizer stand-in that produces no audio.
#[derive(Debug, Default, Clone)]
pub struct SilentSynthesizer;

#[async_trait]
impl Synthesizer for SilentSynthesizer {
    async fn synthesize(&self, _text: &str) -> Option<AudioHandle> {
        None
    }
}

static ANGLE_MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());
static MARKDOWN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`#~|\[\]{}]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Make text safe to hand to a synthesizer: drop angle-bracket markup
/// (which synthesizers read as control tags), replace URLs with "a link",
/// remove markdown punctuation and collapse whitespace.
pub fn sanitize_for_speech(text: &str) -> String {
    let t = URL.replace_all(text, "a link");
    let t = ANGLE_MARKUP.replace_all(&t, " ");
    let t = t.replace(['<', '>'], " ");
    let t = MARKDOWN.replace_all(&t, " ");
    WHITESPACE.replace_all(&t, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_angle_brackets_from_senders() {
        assert_eq!(
            sanitize_for_speech("Alice Smith <alice@example.com>"),
            "Alice Smith"
        );
        assert_eq!(sanitize_for_speech("left < right"), "left right");
    }

    #[test]
    fn replaces_urls() {
        assert_eq!(
            sanitize_for_speech("See https://example.com/x?y=1 for details"),
            "See a link for details"
        );
        assert_eq!(sanitize_for_speech("visit www.example.com"), "visit a link");
    }

    #[test]
    fn removes_markdown_punctuation() {
        assert_eq!(sanitize_for_speech("**Big** _news_ # today"), "Big news today");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(
            sanitize_for_speech("Subject: lunch. Message: see you at noon."),
            "Subject: lunch. Message: see you at noon."
        );
    }

    #[test]
    fn audio_handles_are_unique() {
        assert_ne!(AudioHandle::new("a").id, AudioHandle::new("a").id);
    }
}
