//! Configuration types.

/// Lowest cutoff allowed for short utterances. Below this, common short words
/// ("send", "read") start colliding with the stop and cancel vocabularies.
pub const SHORT_UTTERANCE_FLOOR: f64 = 0.78;

/// Tuning for the dialogue engine.
///
/// The cutoffs and chunk size were tuned against one offline recognizer's
/// error distribution; a different recognizer may need different values.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Similarity cutoff for stop/cancel/confirm vocabularies.
    pub keyword_cutoff: f64,
    /// Looser cutoff for the last-resort per-token intent fallback.
    pub fallback_cutoff: f64,
    /// Cutoff used when the utterance has at most `short_utterance_words` words.
    pub short_utterance_cutoff: f64,
    /// Word count at or below which an utterance counts as short.
    pub short_utterance_words: usize,
    /// Characters of message body read per turn.
    pub chunk_chars: usize,
    /// Number of most-recent messages cached per user.
    pub page_size: usize,
    /// Failed recipient attempts before suggesting typed input.
    pub to_retry_limit: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            keyword_cutoff: 0.72,
            fallback_cutoff: 0.70,
            short_utterance_cutoff: SHORT_UTTERANCE_FLOOR,
            short_utterance_words: 3,
            chunk_chars: 400,
            page_size: 5,
            to_retry_limit: 2,
        }
    }
}

impl VoiceConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let keyword_cutoff = env_parse("VOICE_MAIL_KEYWORD_CUTOFF").unwrap_or(defaults.keyword_cutoff);
        let fallback_cutoff =
            env_parse("VOICE_MAIL_FALLBACK_CUTOFF").unwrap_or(defaults.fallback_cutoff);
        let short_utterance_cutoff =
            env_parse("VOICE_MAIL_SHORT_CUTOFF").unwrap_or(defaults.short_utterance_cutoff);
        let chunk_chars = env_parse("VOICE_MAIL_CHUNK_CHARS").unwrap_or(defaults.chunk_chars);
        let page_size = env_parse("VOICE_MAIL_PAGE_SIZE").unwrap_or(defaults.page_size);
        let to_retry_limit =
            env_parse("VOICE_MAIL_TO_RETRY_LIMIT").unwrap_or(defaults.to_retry_limit);

        Self {
            keyword_cutoff,
            fallback_cutoff,
            short_utterance_cutoff,
            chunk_chars,
            page_size,
            to_retry_limit,
            ..defaults
        }
        .clamped()
    }

    /// Force every value into its usable range.
    pub fn clamped(mut self) -> Self {
        self.keyword_cutoff = self.keyword_cutoff.clamp(0.0, 1.0);
        self.fallback_cutoff = self.fallback_cutoff.clamp(0.0, 1.0);
        self.short_utterance_cutoff = self.short_utterance_cutoff.clamp(SHORT_UTTERANCE_FLOOR, 1.0);
        self.chunk_chars = self.chunk_chars.max(1);
        self.page_size = self.page_size.max(1);
        self.to_retry_limit = self.to_retry_limit.max(1);
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let config = VoiceConfig::default();
        assert_eq!(config.keyword_cutoff, 0.72);
        assert_eq!(config.fallback_cutoff, 0.70);
        assert_eq!(config.short_utterance_cutoff, 0.78);
        assert_eq!(config.chunk_chars, 400);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.to_retry_limit, 2);
    }

    #[test]
    fn clamped_enforces_short_floor() {
        let config = VoiceConfig {
            short_utterance_cutoff: 0.5,
            keyword_cutoff: 1.7,
            chunk_chars: 0,
            page_size: 0,
            ..VoiceConfig::default()
        }
        .clamped();
        assert_eq!(config.short_utterance_cutoff, SHORT_UTTERANCE_FLOOR);
        assert_eq!(config.keyword_cutoff, 1.0);
        assert_eq!(config.chunk_chars, 1);
        assert_eq!(config.page_size, 1);
    }
}
