//! Rule-based query classification (C7's `classify_query_type`) and keyword
//! extraction (feeds C4's dynamic threshold). No external calls.

use std::sync::LazyLock;

use qa_core::config::SearchConfig;
use qa_core::types::QueryType;
use regex::Regex;

/// Web-only lexicon: a query containing any of these tokens never needs
/// the policy corpus (§9 Open Question resolution). Deliberately narrower
/// than `HOMEPAGE_LEXICON` below: homepage/URL wording ("홈페이지", "사이트")
/// is ambiguous enough (e.g. a policy's own application site) that it
/// routes through `POLICY_QA` first and only escalates to a web search via
/// `check_sufficiency`'s broader detector, rather than short-circuiting here.
static WEB_ONLY_LEXICON: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\blink\b",
        r"(?i)\burl\b",
        r"링크",
        r"신청\s*방법",
        r"신청하는\s*방법",
        r"어떻게\s*신청",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid web-only lexicon regex"))
    .collect()
});

/// Broader homepage/URL detector used only by `check_sufficiency` (§4.7's
/// node (c)): catches queries the narrower `WEB_ONLY_LEXICON` lets through
/// to `POLICY_QA`, forcing a web-search supplement (hybrid answer) instead
/// of a web-only short-circuit.
static HOMEPAGE_LEXICON: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"홈페이지", r"사이트", r"주소", r"(?i)\burl\b"]
        .iter()
        .map(|p| Regex::new(p).expect("invalid homepage lexicon regex"))
        .collect()
});

fn matches_web_only_lexicon(query: &str) -> bool {
    WEB_ONLY_LEXICON.iter().any(|re| re.is_match(query))
}

/// Rule-based route: `WEB_ONLY` if the query matches the web-only lexicon,
/// else `POLICY_QA`.
pub fn classify_query_type(query: &str) -> QueryType {
    if matches_web_only_lexicon(query) {
        QueryType::WebOnly
    } else {
        QueryType::PolicyQa
    }
}

/// True if `query` reads as a homepage/URL request. Used only by
/// `check_sufficiency` — a distinct, broader signal from
/// `classify_query_type`'s web-only lexicon, so it can still catch
/// homepage queries that were routed to `POLICY_QA`.
pub fn is_homepage_or_url_query(query: &str) -> bool {
    HOMEPAGE_LEXICON.iter().any(|re| re.is_match(query))
}

/// Keywords recognized by `SearchConfig::keyword_adjustments`, found in
/// `query`. Shared with C8's search workflow via `SearchConfig::extract_keywords`.
pub fn extract_keywords(query: &str, config: &SearchConfig) -> Vec<String> {
    config.extract_keywords(query)
}
