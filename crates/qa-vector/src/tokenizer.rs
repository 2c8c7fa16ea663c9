//! Query/document tokenizer shared by the BM25 index and keyword extraction.
//!
//! The corpus is Korean-dominant but must tolerate Latin text and digits, so
//! splitting is Unicode-aware rather than ASCII whitespace only.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Domain keywords that receive a duplication boost at indexing time.
/// Mirrors `SearchConfig::keyword_adjustments`'s key set (C4) so that a
/// token which shifts the dynamic threshold also carries extra BM25 weight.
///
/// "R&D" is deliberately absent: the punctuation-splitting rule above
/// breaks it into "r" and "d" before this list is consulted, so it cannot
/// be boosted as a single token. `classify::extract_keywords` matches it
/// separately, against the raw query text.
const BOOSTED_KEYWORDS: &[&str] = &["지원금", "창업"];

fn stopwords() -> &'static HashSet<&'static str> {
    static STOPWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOPWORDS.get_or_init(|| {
        [
            "은", "는", "이", "가", "을", "를", "의", "에", "에서", "으로", "로", "와", "과",
            "도", "만", "the", "a", "an", "of", "to", "in", "for", "and", "or",
        ]
        .into_iter()
        .collect()
    })
}

/// Split `text` into normalized tokens: lowercased, split on non-alphanumeric
/// boundaries (Unicode-aware), length >= 2, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stop = stopwords();

    lowered
        .split(|c: char| !(c.is_alphanumeric()))
        .filter(|tok| tok.chars().count() >= 2)
        .filter(|tok| !stop.contains(tok))
        .map(|tok| tok.to_string())
        .collect()
}

/// Tokenize for indexing: like [`tokenize`] but domain keywords are counted
/// twice, reflecting their importance in the sparse index (§4.2).
pub fn tokenize_for_index(text: &str) -> Vec<String> {
    let mut tokens = tokenize(text);
    let boosted: Vec<String> = tokens
        .iter()
        .filter(|tok| BOOSTED_KEYWORDS.contains(&tok.as_str()))
        .cloned()
        .collect();
    tokens.extend(boosted);
    tokens
}
