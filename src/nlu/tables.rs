//! Read-only vocabulary tables.
//!
//! Each set lists the canonical word plus the mis-transcriptions a small
//! offline recognizer produces for it. Built once on first use, never mutated.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Words that stop the current read-out.
pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "stop", "top", "stock", "shop", "cop", "drop", "prop", "stuff", "step", "stoop",
        "store", "stopped", "stopping", "stab", "stub", "spot", "stomp", "pause", "paws",
        "halt", "quiet", "silence", "silent", "enough", "that's enough", "that is enough",
        "shut up", "be quiet", "stop it", "stop reading", "pause reading", "stop the email",
        "no more",
    ])
});

/// Words that abort an in-progress compose.
///
/// "not" is deliberately absent: it shows up in dictated recipients and
/// bodies far more often than as a mishearing of "no".
pub static CANCEL_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "cancel", "council", "console", "consul", "camel", "counsel", "cancelled",
        "cancelling", "abort", "a board", "aboard", "never mind", "nevermind", "never mine",
        "forget it", "forget", "forget that", "don't send", "do not send", "don't do it",
        "no", "nope", "nah", "stop sending", "cancel email", "cancel sending", "cancel it",
    ])
});

/// Words that confirm sending at the final compose step.
pub static CONFIRM_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "yes", "yet", "yep", "yeah", "ya", "yah", "yea", "jest", "confirm", "confirmed",
        "conform", "conformed", "ok", "okay", "o.k.", "oak", "send it", "do it", "go ahead",
        "go", "proceed", "yes please", "please send", "absolutely", "sure", "correct",
    ])
});

/// Number words for 0-19 and the round tens.
pub const NUMBER_WORDS: &[(&str, u32)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Tens that combine with a following unit word ("twenty nine").
pub const TENS: &[&str] = &[
    "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Unit words that may follow a ten.
pub const ONES: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Spoken ordinals for positional references, 1-based.
pub const ORDINALS: &[(&str, usize)] = &[
    ("first", 1),
    ("1st", 1),
    ("second", 2),
    ("2nd", 2),
    ("third", 3),
    ("3rd", 3),
    ("fourth", 4),
    ("4th", 4),
    ("fifth", 5),
    ("5th", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
];

/// Letter names, NATO words and digit words → the literal character.
///
/// Bare single letters are not listed; they pass through unchanged.
pub static PHONETIC: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let letters: &[(&str, &[&str])] = &[
        ("a", &["ay", "eh", "alpha", "alfa"]),
        ("b", &["bee", "be", "bea", "bravo"]),
        ("c", &["see", "sea", "cee", "charlie"]),
        ("d", &["dee", "di", "delta"]),
        ("e", &["ee", "echo"]),
        ("f", &["ef", "eff", "foxtrot"]),
        ("g", &["gee", "ji", "golf"]),
        ("h", &["aitch", "aych", "haitch", "hotel"]),
        ("i", &["eye", "aye", "india"]),
        ("j", &["jay", "jey", "juliet", "juliett"]),
        ("k", &["kay", "kaye", "kilo"]),
        ("l", &["el", "ell", "lima"]),
        ("m", &["em", "mike"]),
        ("n", &["en", "november"]),
        ("o", &["oh", "owe", "oscar"]),
        ("p", &["pee", "pea", "papa"]),
        ("q", &["queue", "cue", "kyu", "quebec"]),
        ("r", &["are", "ar", "romeo"]),
        ("s", &["es", "ess", "sierra"]),
        ("t", &["tee", "tea", "tango"]),
        ("u", &["you", "yu", "ewe", "uniform"]),
        ("v", &["vee", "victor"]),
        ("w", &["doubleyou", "whiskey", "whisky"]),
        ("x", &["ex", "xray", "x-ray"]),
        ("y", &["why", "wye", "yankee"]),
        ("z", &["zee", "zed", "zulu"]),
    ];

    let mut map = HashMap::new();
    for (letter, names) in letters {
        for name in *names {
            map.insert(*name, *letter);
        }
    }
    for (word, digit) in [
        ("zero", "0"),
        ("one", "1"),
        ("two", "2"),
        ("three", "3"),
        ("four", "4"),
        ("five", "5"),
        ("six", "6"),
        ("seven", "7"),
        ("eight", "8"),
        ("nine", "9"),
        ("niner", "9"),
    ] {
        map.insert(word, digit);
    }
    map
});

/// Two-word phonetics, expanded before tokenizing.
pub const TWO_WORD_PHONETICS: &[(&str, &str)] = &[
    ("double you", "w"),
    ("double u", "w"),
    ("x ray", "x"),
    ("ex ray", "x"),
];

/// Spoken provider names → full mail domain.
pub const PROVIDER_DOMAINS: &[(&str, &str)] = &[
    ("gmail", "gmail.com"),
    ("g mail", "gmail.com"),
    ("google mail", "gmail.com"),
    ("yahoo", "yahoo.com"),
    ("outlook", "outlook.com"),
    ("out look", "outlook.com"),
    ("hotmail", "hotmail.com"),
    ("hot mail", "hotmail.com"),
    ("icloud", "icloud.com"),
    ("i cloud", "icloud.com"),
    ("proton", "proton.me"),
    ("protonmail", "protonmail.com"),
    ("proton mail", "protonmail.com"),
    ("live", "live.com"),
    ("aol", "aol.com"),
];
