//! Phonetic normalization — spoken letters, digits and symbols to literal text.
//!
//! Pure string processing, no I/O. The email pipeline is order-sensitive:
//! number words before domain fixes, domain fixes before "@" folding, "@"
//! folding before dot folding, filler stripping only after all symbols are
//! literal.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::tables::{NUMBER_WORDS, ONES, PHONETIC, TENS, TWO_WORD_PHONETICS};

/// Stand-in for a dash the user actually said, so the spelling-hyphen cleanup
/// cannot remove it. Private-use code point, never produced by a recognizer.
const DASH_PLACEHOLDER: char = '\u{E000}';

static COMPOUND_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b({})\s+({})\b",
        TENS.join("|"),
        ONES.join("|")
    ))
    .unwrap()
});

static SINGLE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    let words: Vec<&str> = NUMBER_WORDS.iter().map(|(w, _)| *w).collect();
    Regex::new(&format!(r"\b({})\b", words.join("|"))).unwrap()
});

/// Recognizer mishearings of provider names and TLDs.
static DOMAIN_FIXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"\bg\s*mail\b").unwrap(), "gmail"),
        (Regex::new(r"\bgemail\b").unwrap(), "gmail"),
        (Regex::new(r"\bg-mail\b").unwrap(), "gmail"),
        (Regex::new(r"\bhot\s*mail\b").unwrap(), "hotmail"),
        (Regex::new(r"\bout\s*look\b").unwrap(), "outlook"),
        (Regex::new(r"\byah+oo\b").unwrap(), "yahoo"),
        // TLD fixes only apply right after a spoken or literal dot
        (
            Regex::new(r"(\.|\bdot\s+)(?:calm|come|comma|khan|con|gom|cam)\b").unwrap(),
            "${1}com",
        ),
        (Regex::new(r"(\.|\bdot\s+)(?:naet|neat|met)\b").unwrap(), "${1}net"),
        (Regex::new(r"(\.|\bdot\s+)(?:aura|alba)\b").unwrap(), "${1}org"),
        (Regex::new(r"(\.|\bdot\s+)(?:eddo|ado)\b").unwrap(), "${1}edu"),
        (Regex::new(r"(\.|\bdot\s+)(?:inn|an|and)$").unwrap(), "${1}in"),
    ]
});

/// Explicit spoken forms of "@".
static AT_EXPLICIT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\bat\s+the\s+rate\s+(?:of\s+)?").unwrap(),
        Regex::new(r"\bat\s+(?:sign|symbol|mark)\b").unwrap(),
        Regex::new(r"\bcommercial\s+at\b").unwrap(),
        Regex::new(r"\s+at\b").unwrap(),
        Regex::new(r"^at\s+").unwrap(),
    ]
});

/// Words the recognizer produces instead of "at". Only consulted when no
/// explicit "@" was heard, so a local part like "cat" survives.
static AT_MISHEARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s+)(?:add|hat|that|had|rat|bat|cat|fat|sat)(?:\s+|$)").unwrap()
});

static DOT_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s(?:dot|period|full\s+stop|point)\b").unwrap()
});

static UNDERSCORE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?\bunderscore\b").unwrap());

static DASH_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?\b(?:dash|hyphen|minus)\b").unwrap());

static PLUS_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s?\bplus\b").unwrap());

static LEADING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:my|the)\s+)?(?:email\s+(?:address\s+)?is\s+|address\s+is\s+|email\s+|send\s+(?:it\s+)?to\s+|to\s+)",
    )
    .unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static REPEATED_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());
static REPEATED_ATS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@{2,}").unwrap());

/// Letter-by-letter spelling that the recognizer joined with hyphens ("r-u-t-i-k").
static SPELLING_HYPHENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z0-9](?:-[a-z0-9]){2,}\b").unwrap());

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static TWO_WORD: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    TWO_WORD_PHONETICS
        .iter()
        .map(|(phrase, letter)| {
            let pattern = phrase.split(' ').collect::<Vec<_>>().join(r"\s+");
            (Regex::new(&format!(r"\b{pattern}\b")).unwrap(), *letter)
        })
        .collect()
});

/// Cue words in front of a correction operand.
static OPERAND_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:the\s+)?(?:(letter|character|char|digit|number|symbol)s?\s+)?").unwrap()
});

/// Replace spoken number words with digits, e.g. "twenty nine" → "29".
pub fn replace_number_words(text: &str) -> String {
    let compound = COMPOUND_NUMBER.replace_all(text, |caps: &Captures| {
        let tens = number_value(&caps[1]).unwrap_or(0);
        let ones = number_value(&caps[2]).unwrap_or(0);
        (tens + ones).to_string()
    });
    SINGLE_NUMBER
        .replace_all(&compound, |caps: &Captures| {
            number_value(&caps[1]).map_or_else(|| caps[1].to_string(), |n| n.to_string())
        })
        .into_owned()
}

/// Numeric value of a single number word.
pub fn number_value(word: &str) -> Option<u32> {
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// Convert a spoken email address into its literal form.
///
/// `"r u t i k at gmail dot com"` → `"rutik@gmail.com"`. Input without
/// whitespace is already literal (typed, or a previous result) and only gets
/// symbol cleanup, so the output is a fixed point.
pub fn normalize_email(raw: &str) -> String {
    let mut t = raw.trim().to_lowercase();

    if !t.chars().any(char::is_whitespace) {
        return collapse_symbols(&t);
    }

    t = replace_number_words(&t);

    for (pattern, replacement) in DOMAIN_FIXES.iter() {
        t = pattern.replace_all(&t, *replacement).into_owned();
    }

    for pattern in AT_EXPLICIT.iter() {
        t = pattern.replace_all(&t, "@").into_owned();
    }
    if !t.contains('@') {
        t = AT_MISHEARD.replace(&t, "@").into_owned();
    }

    t = DOT_WORDS.replace_all(&t, ".").into_owned();

    t = UNDERSCORE_WORD.replace_all(&t, "_").into_owned();
    t = DASH_WORDS
        .replace_all(&t, DASH_PLACEHOLDER.to_string().as_str())
        .into_owned();
    t = PLUS_WORD.replace_all(&t, "+").into_owned();

    t = LEADING_FILLER.replace(&t, "").into_owned();

    t = WHITESPACE.replace_all(&t, "").into_owned();

    let result = strip_spelling_hyphens(&collapse_symbols(&t)).replace(DASH_PLACEHOLDER, "-");
    debug!(raw = %raw, normalized = %result, "Normalized spoken email");
    result
}

/// Collapse doubled `.`/`@` and trim separators off both ends.
fn collapse_symbols(text: &str) -> String {
    let t = REPEATED_DOTS.replace_all(text, ".");
    let t = REPEATED_ATS.replace_all(&t, "@");
    t.trim_matches(|c: char| matches!(c, '.' | '@' | '_' | '-') || c == DASH_PLACEHOLDER)
        .to_string()
}

/// Remove recognizer-inserted spelling hyphens from the local part only.
fn strip_spelling_hyphens(address: &str) -> String {
    let (local, rest) = match address.find('@') {
        Some(pos) => (&address[..pos], &address[pos..]),
        None => (address, ""),
    };
    let local = SPELLING_HYPHENS.replace_all(local, |caps: &Captures| caps[0].replace('-', ""));
    format!("{local}{rest}")
}

/// Basic shape check: `local@domain.tld`, one `@`, no whitespace.
pub fn is_valid_email(addr: &str) -> bool {
    EMAIL_SHAPE.is_match(addr)
}

/// Convert a dictated App Password into its literal characters.
///
/// `"bee aitch jay kay"` → `"bhjk"`. Tokens that are already literal pass
/// through unchanged.
pub fn normalize_app_password(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut t: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    for (pattern, letter) in TWO_WORD.iter() {
        t = pattern.replace_all(&t, *letter).into_owned();
    }

    t.split_whitespace()
        .map(|token| PHONETIC.get(token).copied().unwrap_or(token))
        .collect()
}

/// Normalize the operand of a spoken correction ("the letter bee" → "b",
/// "jay oh" → "jo", "dot" → ".").
pub fn clean_spoken_token(text: &str) -> String {
    let lower = text
        .trim()
        .to_lowercase()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | ',' | '?' | '!'))
        .trim()
        .to_string();

    let (cued, rest) = match OPERAND_CUE.captures(&lower) {
        Some(caps) => (
            caps.get(1).is_some(),
            lower[caps.get(0).map_or(0, |m| m.end())..].to_string(),
        ),
        None => (false, lower.clone()),
    };
    let rest = if rest.trim().is_empty() { lower } else { rest };

    let mut t = replace_number_words(&rest);
    for (pattern, letter) in TWO_WORD.iter() {
        t = pattern.replace_all(&t, *letter).into_owned();
    }

    let tokens: Vec<String> = t
        .split_whitespace()
        .map(|token| match token {
            "dot" | "period" | "point" => ".".to_string(),
            "at" => "@".to_string(),
            "underscore" => "_".to_string(),
            "dash" | "hyphen" | "minus" => "-".to_string(),
            "plus" => "+".to_string(),
            other => other.to_string(),
        })
        .collect();

    let all_spellable = tokens.iter().all(|tok| {
        tok.chars().count() == 1 || PHONETIC.contains_key(tok.as_str()) || number_value(tok).is_some()
    });

    let spell = |tok: &String| -> String {
        PHONETIC
            .get(tok.as_str())
            .map(|s| s.to_string())
            .or_else(|| number_value(tok).map(|n| n.to_string()))
            .unwrap_or_else(|| tok.clone())
    };

    if tokens.len() > 1 && all_spellable {
        return tokens.iter().map(spell).collect();
    }
    if tokens.len() == 1 && cued {
        return spell(&tokens[0]);
    }

    tokens.concat()
}

/// Render an address the way it should be spoken back: `@` → " at ",
/// `.` → " dot ".
pub fn speakable_address(addr: &str) -> String {
    addr.replace('@', " at ").replace('.', " dot ")
}
