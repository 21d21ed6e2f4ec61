// src/enrich/keywords.rs

use serde::{Deserialize, Serialize};

/// Fixer-upper signal phrases, lowercase, in scan order.
///
/// A description matches a phrase if the phrase occurs anywhere in the
/// lowercased, whitespace-collapsed text. Matches are reported in this order.
pub const VOCABULARY: &[&str] = &[
    // direct
    "fixer upper",
    "fixer-upper",
    "handyman special",
    "handyman's dream",
    "needs tlc",
    "tlc",
    "rehab",
    "bring your tools",
    "diamond in the rough",
    // sales type
    "cash only",
    "cash buyers only",
    "investor special",
    "investors welcome",
    "estate sale",
    "auction",
    "no financing",
    // condition
    "needs work",
    "needs updating",
    "needs repair",
    "needs a new roof",
    "as-is",
    "sold as is",
    "deferred maintenance",
    "water damage",
    "foundation issues",
    "cosmetic",
    // marketing
    "great bones",
    "sweat equity",
    "bring your vision",
    "priced to sell",
    "motivated seller",
    "make an offer",
    // distress
    "foreclosure",
    "bank owned",
    "short sale",
    "distressed",
    "probate",
    "vacant",
];

/// Ordered, deduplicated phrase hits for one description.
/// `is_fixer` is true exactly when `matched_phrases` is non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordMatch {
    is_fixer: bool,
    matched_phrases: Vec<String>,
}

impl KeywordMatch {
    pub fn is_fixer(&self) -> bool {
        self.is_fixer
    }

    pub fn matched_phrases(&self) -> &[String] {
        &self.matched_phrases
    }

    /// "cash only, investor special"
    pub fn joined(&self) -> String {
        self.matched_phrases.join(", ")
    }
}

pub fn detect(text: &str) -> KeywordMatch {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if normalized.is_empty() {
        return KeywordMatch::default();
    }

    let matched_phrases: Vec<String> = VOCABULARY
        .iter()
        .filter(|phrase| normalized.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect();

    KeywordMatch {
        is_fixer: !matched_phrases.is_empty(),
        matched_phrases,
    }
}
