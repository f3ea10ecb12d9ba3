//! Approximate keyword matching for noisy transcriptions.

use std::collections::HashSet;

use crate::config::VoiceConfig;

/// Similarity ratio in `[0, 1]` between two strings (normalized Levenshtein).
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Whether `word` equals, or is close enough to, any member of `targets`.
pub fn fuzzy_matches(word: &str, targets: &HashSet<&str>, cutoff: f64) -> bool {
    let word = word.trim();
    if word.is_empty() {
        return false;
    }
    if targets.contains(word) {
        return true;
    }
    targets.iter().any(|t| similarity(word, t) >= cutoff)
}

/// Fuzzy matcher with length-aware cutoffs.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    short_utterance_cutoff: f64,
    short_utterance_words: usize,
}

impl FuzzyMatcher {
    pub fn new(config: &VoiceConfig) -> Self {
        Self {
            short_utterance_cutoff: config.short_utterance_cutoff,
            short_utterance_words: config.short_utterance_words,
        }
    }

    /// Check the whole phrase, then every whitespace token, against `targets`.
    ///
    /// Short utterances use the short-utterance cutoff, which never drops
    /// below 0.78.
    pub fn any_token_matches(&self, text: &str, targets: &HashSet<&str>, cutoff: f64) -> bool {
        self.any_token_matches_except(text, targets, cutoff, |_| false)
    }

    /// Like `any_token_matches`, but tokens for which `skip` holds are not
    /// fuzzily compared (exact members of `targets` still match). The cutoff
    /// is still chosen from the full word count.
    pub fn any_token_matches_except(
        &self,
        text: &str,
        targets: &HashSet<&str>,
        cutoff: f64,
        skip: impl Fn(&str) -> bool,
    ) -> bool {
        let lower = text.trim().to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();
        if words.is_empty() {
            return false;
        }

        let cutoff = if words.len() <= self.short_utterance_words {
            self.short_utterance_cutoff
        } else {
            cutoff
        };

        if fuzzy_matches(&lower, targets, cutoff) {
            return true;
        }
        words.iter().any(|w| {
            if skip(w) {
                targets.contains(w)
            } else {
                fuzzy_matches(w, targets, cutoff)
            }
        })
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(&VoiceConfig::default())
    }
}
