//! Spoken edit commands applied to a literal email address.
//!
//! Rules are evaluated in order; the first rule whose pattern matches the
//! command handles it, even if the edit then fails. Nothing here panics on a
//! missing substring: every failed edit comes back as `changed = false` with a
//! reason the speaker can act on.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phonetic::{
    clean_spoken_token, is_valid_email, normalize_email, number_value, replace_number_words,
};
use super::tables::{ORDINALS, PROVIDER_DOMAINS};

/// Domain assumed when the address being corrected has no `@`.
pub const DEFAULT_DOMAIN: &str = "gmail.com";

const HINT: &str = "I did not understand that correction. You can say: replace X with Y, \
remove X, add X after Y, add X at position 3, add X at the end, \
remove the last letter, or the domain is yahoo.";

/// Outcome of one correction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// The corrected address, or the input unchanged.
    pub result: String,
    /// What happened, suitable for reading aloud.
    pub message: String,
    pub changed: bool,
}

/// Address split at the first `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AddressParts {
    local: String,
    domain: String,
}

impl AddressParts {
    fn split(email: &str) -> Self {
        match email.split_once('@') {
            Some((local, domain)) => Self {
                local: local.to_string(),
                domain: domain.to_string(),
            },
            None => Self {
                local: email.to_string(),
                domain: DEFAULT_DOMAIN.to_string(),
            },
        }
    }

    fn join(&self) -> String {
        format!("{}@{}", self.local, self.domain)
    }
}

/// Edit result: `Ok(description)` when the address changed, `Err(reason)`
/// when it could not be applied.
type EditResult = Result<String, String>;

type Handler = fn(&Captures, &mut AddressParts) -> EditResult;

/// A single correction phrasing with a compiled regex.
struct CorrectionRule {
    name: &'static str,
    regex: Regex,
    handler: Handler,
}

impl CorrectionRule {
    fn new(name: &'static str, pattern: &str, handler: Handler) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
            handler,
        }
    }
}

static RULES: LazyLock<Vec<CorrectionRule>> = LazyLock::new(|| {
    vec![
        // Whole-address rewrite
        CorrectionRule::new(
            "rewrite",
            r"^(?:(?:the|my)\s+)?(?:email\s+address|email|address)\s+(?:is|should\s+be)\s+(.+)$",
            rewrite_address,
        ),
        CorrectionRule::new(
            "rewrite",
            r"^(?:redo|rewrite|retype)\s+(?:it\s+)?(?:as\s+)?(.+)$",
            rewrite_address,
        ),
        // Domain rewrite
        CorrectionRule::new(
            "domain",
            r"^(?:the\s+)?domain\s+(?:is|should\s+be)\s+(.+)$",
            rewrite_domain,
        ),
        CorrectionRule::new(
            "domain",
            r"^(?:change|set|make|switch)\s+(?:the\s+)?domain\s+(?:to|as)\s+(.+)$",
            rewrite_domain,
        ),
        // Generic replace
        CorrectionRule::new(
            "replace",
            r"^(?:replace|change|fix|correct|swap)\s+(.+?)\s+(?:with|to|as|by|into)\s+(.+)$",
            replace_part,
        ),
        // Insert relative to a reference
        CorrectionRule::new(
            "insert_relative",
            r"^(?:add|insert|put)\s+(.+?)\s+(before|after)\s+(.+)$",
            insert_relative,
        ),
        // Insert at a 1-based position
        CorrectionRule::new(
            "insert_at",
            r"^(?:add|insert|put)\s+(.+?)\s+(?:at|in)\s+position\s+(?:number\s+)?(\w+(?:\s+\w+)?)$",
            insert_at_position,
        ),
        // Append / prepend
        CorrectionRule::new(
            "append",
            r"^(?:add|insert|put|append)\s+(.+?)\s+(?:at|to)\s+the\s+end(?:\s+of\s+.*)?$",
            append,
        ),
        CorrectionRule::new("append", r"^append\s+(.+)$", append),
        CorrectionRule::new(
            "prepend",
            r"^(?:add|insert|put|prepend)\s+(.+?)\s+(?:at|to)\s+the\s+(?:start|beginning|front)(?:\s+of\s+.*)?$",
            prepend,
        ),
        CorrectionRule::new("prepend", r"^prepend\s+(.+)$", prepend),
        // Remove
        CorrectionRule::new(
            "remove_edge",
            r"^(?:remove|delete|drop|erase)\s+(?:the\s+)?(first|last)\s+(?:letter|character|char|digit)$",
            remove_edge,
        ),
        CorrectionRule::new(
            "remove",
            r"^(?:remove|delete|drop|erase)\s+(.+)$",
            remove_part,
        ),
        // Move
        CorrectionRule::new(
            "move",
            r"^move\s+(.+?)\s+to\s+the\s+(end|start|beginning|front)(?:\s+of\s+.*)?$",
            move_part,
        ),
        // Bare "fix X"
        CorrectionRule::new("fix", r"^fix\s+(.+)$", remove_part),
    ]
});

static COMMAND_FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:please\s+|can\s+you\s+|could\s+you\s+)+").unwrap());

fn prepare(command: &str) -> String {
    let lower = command.trim().to_lowercase();
    let trimmed = lower.trim_end_matches(['.', '!', '?', ',']).trim();
    let trimmed = trimmed.strip_suffix(" please").unwrap_or(trimmed);
    COMMAND_FILLER.replace(trimmed, "").trim().to_string()
}

/// Whether `command` is phrased as an address correction.
pub fn is_correction_command(command: &str) -> bool {
    let prepared = prepare(command);
    !prepared.is_empty() && RULES.iter().any(|r| r.regex.is_match(&prepared))
}

/// Apply a spoken correction to `email`.
pub fn apply_correction(email: &str, command: &str) -> CorrectionOutcome {
    let prepared = prepare(command);

    for rule in RULES.iter() {
        let Some(caps) = rule.regex.captures(&prepared) else {
            continue;
        };
        let mut parts = AddressParts::split(email.trim());
        let outcome = match (rule.handler)(&caps, &mut parts) {
            Ok(message) => {
                let result = parts.join();
                let changed = result != email.trim();
                CorrectionOutcome {
                    result: if changed { result } else { email.trim().to_string() },
                    message,
                    changed,
                }
            }
            Err(reason) => CorrectionOutcome {
                result: email.trim().to_string(),
                message: reason,
                changed: false,
            },
        };
        debug!(
            rule = rule.name,
            command = %prepared,
            result = %outcome.result,
            changed = outcome.changed,
            "Correction rule matched"
        );
        return outcome;
    }

    debug!(command = %prepared, "No correction rule matched");
    CorrectionOutcome {
        result: email.trim().to_string(),
        message: HINT.to_string(),
        changed: false,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

fn rewrite_address(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let spoken = &caps[1];
    let address = normalize_email(spoken);
    if !is_valid_email(&address) {
        return Err(format!("I could not make an email address out of {spoken}."));
    }
    *parts = AddressParts::split(&address);
    Ok(format!("Changed the address to {address}."))
}

fn rewrite_domain(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let spoken = caps[1].trim().trim_start_matches('@').trim();
    let spoken = spoken
        .strip_prefix("at ")
        .unwrap_or(spoken)
        .trim();

    let domain = match PROVIDER_DOMAINS.iter().find(|(name, _)| *name == spoken) {
        Some((_, domain)) => domain.to_string(),
        None => normalize_email(spoken).trim_matches('@').to_string(),
    };

    if domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(format!("I could not make a domain out of {spoken}."));
    }
    parts.domain = domain;
    Ok(format!("Changed the domain to {}.", parts.domain))
}

fn replace_part(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let from = clean_spoken_token(&caps[1]);
    let to = clean_spoken_token(&caps[2]);
    if from.is_empty() {
        return Err("I did not catch what to replace.".to_string());
    }
    if let Some(updated) = replace_first(&parts.local, &from, &to) {
        parts.local = updated;
    } else if let Some(updated) = replace_first(&parts.domain, &from, &to) {
        parts.domain = updated;
    } else {
        return Err(not_found(&from));
    }
    Ok(format!("Replaced {from} with {to}."))
}

fn insert_relative(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let text = clean_spoken_token(&caps[1]);
    let after = &caps[2] == "after";
    let reference = clean_spoken_token(&caps[3]);
    if text.is_empty() || reference.is_empty() {
        return Err("I did not catch what to insert.".to_string());
    }

    let insert = |target: &str| -> Option<String> {
        let pos = target.find(&reference)?;
        let at = if after { pos + reference.len() } else { pos };
        let mut out = target.to_string();
        out.insert_str(at, &text);
        Some(out)
    };

    if let Some(updated) = insert(&parts.local) {
        parts.local = updated;
    } else if let Some(updated) = insert(&parts.domain) {
        parts.domain = updated;
    } else {
        return Err(not_found(&reference));
    }
    let side = if after { "after" } else { "before" };
    Ok(format!("Added {text} {side} {reference}."))
}

fn insert_at_position(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let text = clean_spoken_token(&caps[1]);
    if text.is_empty() {
        return Err("I did not catch what to insert.".to_string());
    }
    let Some(position) = parse_position(&caps[2]) else {
        return Err(format!("I did not understand position {}.", &caps[2]));
    };

    let chars: Vec<char> = parts.local.chars().collect();
    let index = position.saturating_sub(1).min(chars.len());
    let mut local: String = chars[..index].iter().collect();
    local.push_str(&text);
    local.extend(&chars[index..]);
    parts.local = local;
    Ok(format!("Added {text} at position {}.", index + 1))
}

fn append(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let text = clean_spoken_token(&caps[1]);
    if text.is_empty() {
        return Err("I did not catch what to add.".to_string());
    }
    parts.local.push_str(&text);
    Ok(format!("Added {text} at the end."))
}

fn prepend(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let text = clean_spoken_token(&caps[1]);
    if text.is_empty() {
        return Err("I did not catch what to add.".to_string());
    }
    parts.local.insert_str(0, &text);
    Ok(format!("Added {text} at the start."))
}

fn remove_edge(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    if parts.local.is_empty() {
        return Err("There is nothing before the at sign to remove.".to_string());
    }
    let which = &caps[1];
    let removed = if which == "first" {
        parts.local.remove(0)
    } else {
        parts.local.pop().unwrap_or_default()
    };
    Ok(format!("Removed the {which} letter, {removed}."))
}

fn remove_part(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let text = clean_spoken_token(&caps[1]);
    if text.is_empty() {
        return Err("I did not catch what to remove.".to_string());
    }
    if let Some(updated) = replace_first(&parts.local, &text, "") {
        parts.local = updated;
    } else if let Some(updated) = replace_first(&parts.domain, &text, "") {
        parts.domain = updated;
    } else {
        return Err(not_found(&text));
    }
    Ok(format!("Removed {text}."))
}

fn move_part(caps: &Captures, parts: &mut AddressParts) -> EditResult {
    let text = clean_spoken_token(&caps[1]);
    if text.is_empty() {
        return Err("I did not catch what to move.".to_string());
    }
    let Some(mut local) = replace_first(&parts.local, &text, "") else {
        return Err(not_found(&text));
    };
    let to_end = &caps[2] == "end";
    if to_end {
        local.push_str(&text);
    } else {
        local.insert_str(0, &text);
    }
    parts.local = local;
    let place = if to_end { "end" } else { "start" };
    Ok(format!("Moved {text} to the {place}."))
}

// ── Helpers ─────────────────────────────────────────────────────────

fn replace_first(haystack: &str, needle: &str, replacement: &str) -> Option<String> {
    if needle.is_empty() || !haystack.contains(needle) {
        return None;
    }
    Some(haystack.replacen(needle, replacement, 1))
}

fn parse_position(spoken: &str) -> Option<usize> {
    let word = replace_number_words(spoken.trim());
    let word = word.as_str();
    word.parse::<usize>()
        .ok()
        .or_else(|| number_value(word).map(|n| n as usize))
        .or_else(|| ORDINALS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n))
}

fn not_found(text: &str) -> String {
    format!("I could not find {text} in the address.")
}
