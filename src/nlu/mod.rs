//! Language understanding for noisy transcriptions: vocabularies, fuzzy
//! matching, phonetic normalization, intent classification and address
//! corrections.

pub mod correction;
pub mod fuzzy;
pub mod intent;
pub mod phonetic;
pub mod tables;

pub use correction::{CorrectionOutcome, apply_correction, is_correction_command};
pub use fuzzy::{FuzzyMatcher, fuzzy_matches};
pub use intent::{Classification, Intent, IntentClassifier};
pub use phonetic::{
    clean_spoken_token, is_valid_email, normalize_app_password, normalize_email, speakable_address,
};
