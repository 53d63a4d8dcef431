//! Lexical similarity between rule patterns.
//!
//! Patterns are compared as plain text and never compiled, so every function
//! here is total over arbitrary input, including malformed regex syntax.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Score multiplier when one normalized pattern contains the other.
const SUBSTRING_WEIGHT: f64 = 0.9;

/// Bonus per construct shared by both patterns.
const CONSTRUCT_BONUS: f64 = 0.1;

/// Upper bound on the accumulated construct bonus.
const MAX_CONSTRUCT_BONUS: f64 = 0.3;

/// Tokens that indicate two patterns target the same kind of data.
pub const CONSTRUCT_TOKENS: &[&str] = &[
    "api", "key", "password", "token", "secret", r"\d", r"\w", r"\s", "[a-z]", "[A-Z]", "[0-9]",
];

/// Placeholder that common character classes collapse to.
pub const WILDCARD_TOKEN: &str = "<any>";

/// Approximate overlap between two patterns, in `[0, 1]`.
///
/// Identical strings score 1.0. Otherwise the trimmed, lowercased forms are
/// compared: containment scores the length ratio scaled by 0.9, anything else
/// scores the bigram Jaccard index plus up to 0.3 for shared constructs.
pub fn pattern_overlap(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a_raw = a.trim();
    let b_raw = b.trim();
    let a_norm = a_raw.to_lowercase();
    let b_norm = b_raw.to_lowercase();

    if a_norm.is_empty() || b_norm.is_empty() {
        return 0.0;
    }

    if a_norm.contains(&b_norm) || b_norm.contains(&a_norm) {
        let a_len = a_norm.chars().count();
        let b_len = b_norm.chars().count();
        return (a_len.min(b_len) as f64 / a_len.max(b_len) as f64) * SUBSTRING_WEIGHT;
    }

    let jaccard = bigram_jaccard(&a_norm, &b_norm);
    let bonus = shared_construct_bonus(a_raw, &a_norm, b_raw, &b_norm);
    (jaccard + bonus).min(1.0)
}

/// Jaccard index over 2-character shingles.
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let a_grams = bigrams(a);
    let b_grams = bigrams(b);

    let union = a_grams.union(&b_grams).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a_grams.intersection(&b_grams).count();
    intersection as f64 / union as f64
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn shared_construct_bonus(a_raw: &str, a_norm: &str, b_raw: &str, b_norm: &str) -> f64 {
    let shared = CONSTRUCT_TOKENS
        .iter()
        .filter(|token| has_construct(a_raw, a_norm, token) && has_construct(b_raw, b_norm, token))
        .count();
    (shared as f64 * CONSTRUCT_BONUS).min(MAX_CONSTRUCT_BONUS)
}

fn has_construct(raw: &str, lowered: &str, token: &str) -> bool {
    // Keywords match case-insensitively; regex classes are case-sensitive.
    if token.chars().all(|c| c.is_ascii_alphabetic()) {
        lowered.contains(token)
    } else {
        raw.contains(token)
    }
}

fn inline_flags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\?[a-zA-Z]+\)").expect("inline flag regex is valid"))
}

fn character_classes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\\[dwsDWS]|\[(?:a-zA-Z0-9|A-Za-z0-9|a-zA-Z|A-Za-z|a-z0-9|a-z|A-Z|0-9)\]",
        )
        .expect("character class regex is valid")
    })
}

/// Canonical form of a pattern used to group equivalent rules.
///
/// Strips inline flag groups such as `(?i)` and collapses common character
/// classes (`\d`, `\w`, `\s`, `[a-z]`, `[0-9]`, ...) to [`WILDCARD_TOKEN`].
pub fn normalize_pattern(pattern: &str) -> String {
    let without_flags = inline_flags().replace_all(pattern, "");
    character_classes()
        .replace_all(&without_flags, WILDCARD_TOKEN)
        .trim()
        .to_string()
}
